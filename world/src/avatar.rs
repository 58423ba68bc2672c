use std::time::Duration;

use medusa_tower_core::{
    ActionError, AvatarSnapshot, Event, Facing, FallReason, Position, Tile,
};

use crate::{interaction::PendingInteraction, World};

/// Input suppression armed by a teleport.
pub(crate) const TELEPORT_SUPPRESSION: Duration = Duration::from_millis(300);

/// Input suppression armed by a death respawn.
pub(crate) const RESPAWN_SUPPRESSION: Duration = Duration::from_millis(500);

const ANIMATION_FRAMES: u8 = 4;

#[derive(Clone, Debug)]
pub(crate) struct Avatar {
    pub(crate) position: Position,
    pub(crate) facing: Facing,
    frame: u8,
    pub(crate) cushion: u32,
    suppressed_until: Duration,
}

impl Avatar {
    pub(crate) fn new(position: Position) -> Self {
        Self {
            position,
            facing: Facing::Down,
            frame: 0,
            cushion: 0,
            suppressed_until: Duration::ZERO,
        }
    }

    pub(crate) fn is_suppressed(&self, now: Duration) -> bool {
        now < self.suppressed_until
    }

    /// Relocates the avatar in the canonical standing pose and suppresses input.
    pub(crate) fn place(&mut self, position: Position, now: Duration, suppression: Duration) {
        self.position = position;
        self.facing = Facing::Down;
        self.frame = 0;
        self.suppressed_until = now.saturating_add(suppression);
    }

    fn step_to(&mut self, position: Position) {
        self.position = position;
        self.frame = (self.frame + 1) % ANIMATION_FRAMES;
    }

    /// Spends one protected step. Returns whether the step was protected.
    fn consume_cushion(&mut self) -> bool {
        if self.cushion > 0 {
            self.cushion -= 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn snapshot(&self, now: Duration) -> AvatarSnapshot {
        AvatarSnapshot {
            position: self.position,
            facing: self.facing,
            frame: self.frame,
            cushion: self.cushion,
            suppressed: self.is_suppressed(now),
        }
    }
}

impl World {
    pub(crate) fn accepts_input(&self) -> bool {
        self.dialogs.pending().is_none() && !self.avatar.is_suppressed(self.clock)
    }

    pub(crate) fn move_avatar(&mut self, dx: i8, dy: i8, out_events: &mut Vec<Event>) {
        if !self.accepts_input() {
            log::trace!("movement ignored while input is suppressed");
            return;
        }
        let Some(facing) = Facing::from_intent(dx, dy) else {
            return;
        };
        self.avatar.facing = facing;

        let from = self.avatar.position;
        let (column_delta, row_delta) = facing.delta();
        let Some(cell) = from.cell().offset(column_delta, row_delta) else {
            self.avatar.frame = 0;
            out_events.push(Event::MoveRejected {
                facing,
                reason: ActionError::OutOfBounds,
            });
            return;
        };
        let to = Position::at(cell, from.floor());
        let Some(tile) = self.grid.tile(to) else {
            self.avatar.frame = 0;
            out_events.push(Event::MoveRejected {
                facing,
                reason: ActionError::OutOfBounds,
            });
            return;
        };
        if !tile.is_walkable() {
            out_events.push(Event::MoveRejected {
                facing,
                reason: ActionError::Blocked,
            });
            return;
        }

        let protected = self.avatar.consume_cushion();
        self.avatar.step_to(to);
        out_events.push(Event::AvatarMoved { from, to, facing });

        if tile == Tile::Hole {
            if protected {
                log::debug!(
                    "cushion caught the avatar at {to}, {} steps left",
                    self.avatar.cushion
                );
            } else {
                log::info!("avatar fell into the hole at {to}");
                self.dialogs.set_pending(PendingInteraction::FallDeferred {
                    reason: FallReason::Hole,
                });
            }
        }
    }

    pub(crate) fn teleport(&mut self, destination: Position, out_events: &mut Vec<Event>) {
        if !self.grid.contains(destination) {
            self.reject(ActionError::OutOfBounds, out_events);
            return;
        }
        let from = self.avatar.position.floor();
        let _ = self.arrivals.insert(destination.floor(), destination);
        self.avatar
            .place(destination, self.clock, TELEPORT_SUPPRESSION);
        log::debug!("avatar teleported to {destination}");
        out_events.push(Event::FloorChanged {
            from,
            to: destination.floor(),
        });
    }
}
