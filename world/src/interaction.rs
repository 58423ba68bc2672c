//! Blocking dialogs and the death path.
//!
//! At most one interaction is pending at a time. Dialog requests that arrive
//! while one is open are queued and shown, in order, as earlier ones are
//! acknowledged. A single [`Command::Acknowledge`](medusa_tower_core::Command)
//! entry point drives every follow-up.

use std::{collections::VecDeque, time::Duration};

use medusa_tower_core::{
    ActionError, Event, FallReason, FloorId, InfoKind, Message, Position, Tile,
};

use crate::{avatar::RESPAWN_SUPPRESSION, World};

/// Interaction the world waits on before accepting movement again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingInteraction {
    /// The avatar entered a hole; the death message opens on the next tick.
    FallDeferred {
        /// Cause of the fall.
        reason: FallReason,
    },
    /// A dialog is open until acknowledged.
    AwaitingAcknowledgment {
        /// Message being shown.
        message: Message,
        /// Effect run on acknowledgment.
        then: FollowUp,
    },
    /// The statue selection dialog opened by the move spell.
    AwaitingMoveTarget,
}

/// Effect run once a dialog is acknowledged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowUp {
    /// Nothing happens.
    Nothing,
    /// The avatar respawns at the floor's arrival point.
    Respawn {
        /// Cause of the death being resolved.
        reason: FallReason,
    },
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Dialogs {
    pending: Option<PendingInteraction>,
    queued: VecDeque<(Message, FollowUp)>,
}

impl Dialogs {
    pub(crate) fn pending(&self) -> Option<&PendingInteraction> {
        self.pending.as_ref()
    }

    pub(crate) fn set_pending(&mut self, interaction: PendingInteraction) {
        self.pending = Some(interaction);
    }

    pub(crate) fn clear(&mut self) {
        self.pending = None;
        self.queued.clear();
    }

    /// Reports whether a fall is deferred, shown or queued with a respawn attached.
    pub(crate) fn is_dying(&self) -> bool {
        let pending = matches!(
            self.pending,
            Some(PendingInteraction::FallDeferred { .. })
                | Some(PendingInteraction::AwaitingAcknowledgment {
                    then: FollowUp::Respawn { .. },
                    ..
                })
        );
        pending
            || self
                .queued
                .iter()
                .any(|(_, then)| matches!(then, FollowUp::Respawn { .. }))
    }
}

impl World {
    pub(crate) fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.clock = self.clock.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        if let Some(PendingInteraction::FallDeferred { reason }) = self.dialogs.pending {
            self.dialogs.pending = None;
            self.open_dialog(Message::Fell(reason), FollowUp::Respawn { reason }, out_events);
        }
    }

    /// Starts the death path unless the avatar is already dying.
    pub(crate) fn trigger_fall(&mut self, reason: FallReason, out_events: &mut Vec<Event>) {
        if self.dialogs.is_dying() {
            log::debug!("ignoring {reason:?}, the avatar is already dying");
            return;
        }
        log::info!("avatar died: {reason:?}");
        if self.dialogs.pending == Some(PendingInteraction::AwaitingMoveTarget) {
            self.dialogs.pending = None;
        }
        self.open_dialog(Message::Fell(reason), FollowUp::Respawn { reason }, out_events);
    }

    pub(crate) fn show_message(&mut self, message: Message, out_events: &mut Vec<Event>) {
        self.open_dialog(message, FollowUp::Nothing, out_events);
    }

    fn open_dialog(&mut self, message: Message, then: FollowUp, out_events: &mut Vec<Event>) {
        if self.dialogs.pending.is_some() {
            out_events.push(Event::MessageQueued {
                message: message.clone(),
            });
            self.dialogs.queued.push_back((message, then));
            return;
        }
        out_events.push(Event::MessageShown {
            message: message.clone(),
        });
        self.dialogs.pending = Some(PendingInteraction::AwaitingAcknowledgment { message, then });
    }

    /// Records a refused action and surfaces it when the player should see it.
    pub(crate) fn reject(&mut self, error: ActionError, out_events: &mut Vec<Event>) {
        log::debug!("action rejected: {error}");
        out_events.push(Event::ActionRejected { error });
        if error.is_user_visible() {
            self.show_message(Message::Rejected(error), out_events);
        }
    }

    pub(crate) fn acknowledge(&mut self, out_events: &mut Vec<Event>) {
        match self.dialogs.pending.take() {
            Some(PendingInteraction::AwaitingAcknowledgment { then, .. }) => {
                out_events.push(Event::MessageClosed);
                if let FollowUp::Respawn { reason } = then {
                    self.respawn(reason, out_events);
                }
                if let Some((message, then)) = self.dialogs.queued.pop_front() {
                    self.open_dialog(message, then, out_events);
                }
            }
            Some(PendingInteraction::AwaitingMoveTarget) => {
                out_events.push(Event::MessageClosed);
            }
            deferred @ Some(PendingInteraction::FallDeferred { .. }) => {
                self.dialogs.pending = deferred;
            }
            None => {}
        }
    }

    pub(crate) fn open_move_dialog(&mut self, out_events: &mut Vec<Event>) {
        if self.dialogs.pending.is_some() {
            log::debug!("move dialog refused while another interaction is pending");
            return;
        }
        self.dialogs.pending = Some(PendingInteraction::AwaitingMoveTarget);
        out_events.push(Event::MoveDialogOpened);
    }

    /// Ends the move dialog before its push is resolved. Returns `false` when
    /// another blocking interaction is open.
    pub(crate) fn close_move_dialog(&mut self) -> bool {
        match self.dialogs.pending {
            Some(PendingInteraction::AwaitingMoveTarget) => {
                self.dialogs.pending = None;
                true
            }
            Some(_) => false,
            None => true,
        }
    }

    /// Reacts to the action button with the tile in front of, then under, the avatar.
    pub(crate) fn interact(&mut self, out_events: &mut Vec<Event>) {
        if !self.accepts_input() {
            return;
        }
        let here = self.avatar.position;
        let (column_delta, row_delta) = self.avatar.facing.delta();
        let front = here
            .cell()
            .offset(column_delta, row_delta)
            .map(|cell| Position::at(cell, here.floor()));

        let target = front
            .into_iter()
            .chain([here])
            .filter_map(|position| Some((position, self.grid.tile(position)?)))
            .find(|(_, tile)| is_interactive(*tile));

        match target {
            Some((_, Tile::InfoMarker(kind))) => self.show_message(Message::Info(kind), out_events),
            Some((_, Tile::PuzzlePiece(piece))) => {
                out_events.push(Event::PuzzlePrompted { piece });
            }
            Some((_, Tile::PuzzleSetMarker(set))) => {
                out_events.push(Event::PuzzleSetViewed { set });
            }
            Some((position, Tile::BoxMagic(spell))) => {
                let _ = self.unlocked_magic.insert(spell);
                if self.grid.set_tile(position, Tile::Floor) {
                    out_events.push(Event::TileChanged {
                        position,
                        tile: Tile::Floor,
                    });
                }
                log::info!("{spell} magic unlocked");
                out_events.push(Event::MagicUnlocked { spell });
                self.show_message(Message::MagicUnlocked(spell), out_events);
            }
            Some((_, Tile::Medusa)) => {
                self.show_message(Message::Info(InfoKind::Warning), out_events);
            }
            _ => self.reject(ActionError::NothingToInteract, out_events),
        }
    }

    /// Sends the avatar back to the floor's arrival point and restarts the floor.
    fn respawn(&mut self, reason: FallReason, out_events: &mut Vec<Event>) {
        let floor = self.avatar.position.floor();
        let arrival = self
            .arrivals
            .get(&floor)
            .copied()
            .unwrap_or_else(|| self.layout_arrival(floor));

        self.restart_floor(floor, out_events);
        self.snakes.reset_to_initial();
        self.avatar.cushion = 0;
        self.avatar.place(arrival, self.clock, RESPAWN_SUPPRESSION);
        log::info!("avatar respawned at {arrival} after {reason:?}");
        out_events.push(Event::AvatarRespawned { position: arrival });
    }

    pub(crate) fn layout_arrival(&self, floor: FloorId) -> Position {
        self.layout_arrivals
            .get(&floor)
            .copied()
            .unwrap_or(self.start)
    }

    /// Restores a floor's original layout, returns its standing statues to
    /// their initial cells and reapplies progress made elsewhere.
    pub(crate) fn restart_floor(&mut self, floor: FloorId, out_events: &mut Vec<Event>) {
        if !self.grid.reset_floor(floor) {
            return;
        }
        self.statues.reset_floor(floor);
        self.rebuild_floor(floor);
        out_events.push(Event::FloorReset { floor });
    }

    /// Projects statue placement, solved pieces and opened boxes onto the live grid.
    pub(crate) fn rebuild_floor(&mut self, floor: FloorId) {
        for position in self.grid.find(floor, |tile| tile.is_statue()) {
            let _ = self.grid.set_tile(position, Tile::Floor);
        }
        let placements: Vec<(Position, Tile)> = self
            .statues
            .iter()
            .filter(|statue| statue.position.floor() == floor)
            .filter_map(|statue| Some((statue.position, statue.tile()?)))
            .collect();
        for (position, tile) in placements {
            let _ = self.grid.set_tile(position, tile);
        }

        let cleared: Vec<Position> = self.grid.find(floor, |tile| match tile {
            Tile::PuzzlePiece(piece) => self.puzzles.is_piece_unlocked(piece),
            Tile::BoxMagic(spell) => self.unlocked_magic.contains(&spell),
            _ => false,
        });
        for position in cleared {
            let _ = self.grid.set_tile(position, Tile::Floor);
        }
    }
}

fn is_interactive(tile: Tile) -> bool {
    matches!(
        tile,
        Tile::InfoMarker(_)
            | Tile::PuzzlePiece(_)
            | Tile::PuzzleSetMarker(_)
            | Tile::BoxMagic(_)
            | Tile::Medusa
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{apply, query};
    use medusa_tower_core::{Command, SnakeId, SpellKind, StatueId};

    fn ready_world(destination: Position) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::Teleport { destination }, &mut events);
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );
        world
    }

    #[test]
    fn second_dialog_is_queued_until_the_first_closes() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ShowMessage {
                message: Message::Info(InfoKind::Hint),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::ShowMessage {
                message: Message::Info(InfoKind::Warning),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![
                Event::MessageShown {
                    message: Message::Info(InfoKind::Hint)
                },
                Event::MessageQueued {
                    message: Message::Info(InfoKind::Warning)
                },
            ]
        );

        events.clear();
        apply(&mut world, Command::Acknowledge, &mut events);
        assert_eq!(
            events,
            vec![
                Event::MessageClosed,
                Event::MessageShown {
                    message: Message::Info(InfoKind::Warning)
                },
            ]
        );
        events.clear();
        apply(&mut world, Command::Acknowledge, &mut events);
        assert_eq!(events, vec![Event::MessageClosed]);
        assert_eq!(query::pending(&world), None);
    }

    #[test]
    fn duplicate_death_is_ignored() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::TriggerFall {
                reason: FallReason::SnakeSight(SnakeId::new(0)),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::TriggerFall {
                reason: FallReason::StatueCrush(StatueId::new(2)),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::MessageShown {
                message: Message::Fell(FallReason::SnakeSight(SnakeId::new(0)))
            }]
        );
    }

    #[test]
    fn reading_a_marker_opens_a_dialog() {
        let floor = FloorId::new(1);
        let mut world = ready_world(Position::new(6, 6, floor));
        let mut events = Vec::new();
        apply(&mut world, Command::Interact, &mut events);
        assert_eq!(
            events,
            vec![Event::MessageShown {
                message: Message::Info(InfoKind::Hint)
            }],
            "the marker at (6,7) lies in front of the avatar"
        );

        events.clear();
        apply(&mut world, Command::MoveAvatar { dx: 1, dy: 0 }, &mut events);
        assert!(events.is_empty(), "an open dialog blocks movement");
    }

    #[test]
    fn opening_a_box_unlocks_its_magic_once() {
        let floor = FloorId::new(1);
        let mut world = ready_world(Position::new(9, 3, floor));
        let mut events = Vec::new();
        apply(&mut world, Command::MoveAvatar { dx: 0, dy: -1 }, &mut events);
        assert_eq!(query::avatar(&world).position, Position::new(9, 2, floor));

        events.clear();
        apply(&mut world, Command::Interact, &mut events);
        assert!(query::magic_unlocked(&world, SpellKind::Cushion));
        assert!(events.contains(&Event::MagicUnlocked {
            spell: SpellKind::Cushion
        }));
        assert_eq!(query::tile(&world, Position::new(9, 1, floor)), Some(Tile::Floor));

        apply(&mut world, Command::Acknowledge, &mut events);
        events.clear();
        apply(&mut world, Command::Interact, &mut events);
        assert_eq!(
            events,
            vec![Event::ActionRejected {
                error: ActionError::NothingToInteract
            }]
        );
    }

    #[test]
    fn move_dialog_is_cancelled_by_acknowledge() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::OpenMoveDialog, &mut events);
        assert_eq!(
            query::pending(&world),
            Some(&PendingInteraction::AwaitingMoveTarget)
        );
        apply(&mut world, Command::Acknowledge, &mut events);
        assert_eq!(events, vec![Event::MoveDialogOpened, Event::MessageClosed]);
        assert_eq!(query::pending(&world), None);
    }
}
