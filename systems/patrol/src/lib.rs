#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Snake patrol scheduling and the one-time compile pass that turns static
//! layout markers into snake definitions.
//!
//! The [`Patrol`] system keeps the tick ordering fixed: it only ever reacts to
//! an avatar move that the world already applied, so snakes always step after
//! the avatar and before any sight evaluation that listens for
//! [`Event::SnakesAdvanced`].

use medusa_tower_core::{Command, Event};

mod compile;

pub use compile::{compile_floor, SnakeDefinition};

/// Pure system that schedules one snake step per avatar move.
#[derive(Debug, Default)]
pub struct Patrol {
    steps_issued: u64,
}

impl Patrol {
    /// Creates a new patrol system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of step commands emitted since creation.
    #[must_use]
    pub fn steps_issued(&self) -> u64 {
        self.steps_issued
    }

    /// Consumes world events and emits snake step commands.
    ///
    /// Only snakes on the avatar's floor are stepped; hidden floors stay frozen
    /// until the avatar arrives.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            if let Event::AvatarMoved { to, .. } = event {
                log::trace!("avatar reached {to}, stepping snakes");
                self.steps_issued = self.steps_issued.saturating_add(1);
                out.push(Command::StepSnakes {
                    only_current_floor: true,
                });
            }
        }
    }
}
