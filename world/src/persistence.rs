use std::collections::BTreeSet;

use medusa_tower_core::{
    AvatarRecord, CushionRecord, Event, SaveSnapshot, StatueRecord, StatueState, SAVE_VERSION,
};
use thiserror::Error;

use crate::{change_state::ChangeStateRegistry, statues::RedirectTable, World};

/// Returned when a snapshot is requested in the middle of a multi-step mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("saving is suspended until the current sequence completes")]
pub struct SaveSuspended;

impl World {
    /// Runs `sequence` with saving suspended, restoring the previous flag afterwards.
    pub(crate) fn with_saving_suspended<T>(&mut self, sequence: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.saving_suspended, true);
        let result = sequence(self);
        self.saving_suspended = previous;
        result
    }

    /// Captures the persistable state. A death in progress is never saved: the
    /// avatar still stands where it died until the respawn runs.
    pub(crate) fn capture(&self) -> Result<SaveSnapshot, SaveSuspended> {
        if self.saving_suspended || self.dialogs.is_dying() {
            return Err(SaveSuspended);
        }

        let statues = self
            .statues
            .iter()
            .map(|statue| StatueRecord {
                name: statue.name,
                initial_floor: statue.initial.floor(),
                position: statue.position,
                state: statue.state,
            })
            .collect();

        Ok(SaveSnapshot {
            version: SAVE_VERSION,
            change_state: self.change_state.to_record(),
            puzzles: self.puzzles.to_record(),
            statues,
            cushion: CushionRecord {
                remaining: self.avatar.cushion,
                redirects: self.redirects.records(),
            },
            avatar: Some(AvatarRecord {
                position: self.avatar.position,
            }),
            arrivals: self.arrivals.values().copied().collect(),
            unlocked_magic: self.unlocked_magic.iter().copied().collect(),
            killed_snakes: self.snakes.killed(),
        })
    }

    /// Replaces the mutable state with `snapshot`, tolerating missing or unknown parts.
    pub(crate) fn restore(&mut self, snapshot: &SaveSnapshot, out_events: &mut Vec<Event>) {
        if snapshot.version > SAVE_VERSION {
            log::warn!(
                "snapshot version {} is newer than {SAVE_VERSION}; loading known fields only",
                snapshot.version
            );
        }

        self.with_saving_suspended(|world| {
            world.change_state = ChangeStateRegistry::from_record(&snapshot.change_state);
            world.puzzles.restore(&snapshot.puzzles);

            for statue in world.statues.iter_mut() {
                statue.position = statue.initial;
                statue.state = StatueState::default();
            }
            for record in &snapshot.statues {
                let restored = world
                    .statues
                    .find_by_key(record.name, record.initial_floor)
                    .filter(|_| world.grid.contains(record.position));
                let Some(id) = restored else {
                    log::warn!(
                        "saved {} from floor {} does not match this tower",
                        record.name,
                        record.initial_floor
                    );
                    continue;
                };
                if let Some(statue) = world.statues.iter_mut().find(|statue| statue.id == id) {
                    statue.position = record.position;
                    statue.state = record.state;
                }
            }

            world.redirects = RedirectTable::with_entries(&world.rules.default_redirects);
            for record in &snapshot.cushion.redirects {
                world.redirects.insert(record.from, record.to);
            }
            world.avatar.cushion = snapshot.cushion.remaining;

            world.arrivals.clear();
            let _ = world
                .arrivals
                .insert(world.start.floor(), world.start);
            for arrival in &snapshot.arrivals {
                if world.grid.contains(*arrival) {
                    let _ = world.arrivals.insert(arrival.floor(), *arrival);
                }
            }

            world.unlocked_magic = snapshot.unlocked_magic.iter().copied().collect::<BTreeSet<_>>();

            world.snakes.revive_all();
            world.snakes.reset_to_initial();
            for snake in &snapshot.killed_snakes {
                if !world.snakes.kill(*snake) {
                    log::warn!("saved snake {snake:?} is unknown");
                }
            }

            world.dialogs.clear();
            for floor in world.grid.floors().collect::<Vec<_>>() {
                let _ = world.grid.reset_floor(floor);
                world.rebuild_floor(floor);
            }

            let position = snapshot
                .avatar
                .map(|avatar| avatar.position)
                .filter(|position| {
                    world.grid.contains(*position)
                        && world.grid.tile(*position).is_some_and(|tile| tile.is_walkable())
                })
                .unwrap_or(world.start);
            world.avatar.place(position, world.clock, std::time::Duration::ZERO);
        });

        log::info!("snapshot restored");
        out_events.push(Event::SnapshotRestored);
    }
}
