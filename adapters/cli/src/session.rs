//! Line-driven play session that pumps the world and its systems.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use medusa_tower_core::{
    ChangeEffect, ChangeRequest, Command, Direction, Event, Message, PieceId, SaveSnapshot,
    SpellKind, StatueName, TargetOption,
};
use medusa_tower_persistence::SaveCodec;
use medusa_tower_system_patrol::Patrol;
use medusa_tower_system_sight::Sight;
use medusa_tower_system_spellcasting::{CastIntent, CasterView, Spellcasting};
use medusa_tower_world::{self as world, query, PendingInteraction, World};

/// A single parsed input line.
#[derive(Debug, PartialEq)]
pub(crate) enum Input {
    /// Forwarded to the world as is.
    Command(Command),
    /// Resolved by the spellcasting system first.
    Cast(CastIntent),
    /// Lets time pass.
    Wait,
    /// Ends the session.
    Quit,
}

impl Input {
    /// Parses a line such as `w`, `cast elevator ascend` or `push b north`.
    pub(crate) fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Self::Wait);
        };
        let rest: Vec<&str> = words.collect();

        let input = match head.to_ascii_lowercase().as_str() {
            "w" | "up" => step(0, -1),
            "s" | "down" => step(0, 1),
            "a" | "left" => step(-1, 0),
            "d" | "right" => step(1, 0),
            "e" | "interact" => Self::Command(Command::Interact),
            "ok" | "ack" => Self::Command(Command::Acknowledge),
            "wait" => Self::Wait,
            "quit" | "exit" => Self::Quit,
            "cast" => Self::Cast(parse_cast(&rest)?),
            "push" => {
                let [statue, direction] = rest.as_slice() else {
                    bail!("usage: push <statue> <direction>");
                };
                Self::Command(Command::PushStatue {
                    name: statue.parse::<StatueName>()?,
                    direction: direction.parse::<Direction>()?,
                })
            }
            "answer" => {
                let Some((piece, answer)) = rest.split_first() else {
                    bail!("usage: answer <piece> <text>");
                };
                let piece = piece
                    .parse::<u16>()
                    .with_context(|| format!("puzzle piece '{piece}' is not a number"))?;
                Self::Command(Command::AnswerPuzzle {
                    piece: PieceId::new(piece),
                    answer: answer.join(" "),
                })
            }
            other => bail!("unknown input '{other}'"),
        };
        Ok(input)
    }
}

fn step(dx: i8, dy: i8) -> Input {
    Input::Command(Command::MoveAvatar { dx, dy })
}

fn parse_spell(word: &str) -> Result<SpellKind> {
    match word.to_ascii_lowercase().as_str() {
        "elevator" => Ok(SpellKind::Elevator),
        "move" => Ok(SpellKind::Move),
        "cushion" => Ok(SpellKind::Cushion),
        "change" => Ok(SpellKind::Change),
        other => Err(anyhow!("unknown spell '{other}'")),
    }
}

fn parse_effect(word: &str) -> Result<ChangeEffect> {
    match word.to_ascii_lowercase().as_str() {
        "invert" => Ok(ChangeEffect::Invert),
        "same" => Ok(ChangeEffect::Restrict(TargetOption::Same)),
        "different" => Ok(ChangeEffect::Restrict(TargetOption::Different)),
        other => other
            .strip_prefix('+')
            .and_then(|amount| amount.parse::<u8>().ok())
            .map(ChangeEffect::Increase)
            .ok_or_else(|| anyhow!("unknown change effect '{other}'")),
    }
}

fn parse_cast(words: &[&str]) -> Result<CastIntent> {
    let Some((spell, rest)) = words.split_first() else {
        bail!("usage: cast <spell> [<target> <effect>] <incantation>");
    };
    let spell = parse_spell(spell)?;
    if spell != SpellKind::Change {
        return Ok(CastIntent::new(spell, rest.join(" ")));
    }

    let [target, effect, incantation @ ..] = rest else {
        bail!("usage: cast change <target> <effect> <incantation>");
    };
    let request = ChangeRequest::new(parse_spell(target)?, parse_effect(effect)?);
    Ok(CastIntent::new(spell, incantation.join(" ")).with_change(request))
}

/// World plus the systems that react to its events.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    patrol: Patrol,
    sight: Sight,
    spells: Spellcasting,
    tick: Duration,
}

impl Session {
    /// Creates a session over a fresh tower.
    pub(crate) fn new(tick: Duration) -> Self {
        Self {
            world: World::new(),
            patrol: Patrol::new(),
            sight: Sight::new(),
            spells: Spellcasting::new(),
            tick,
        }
    }

    /// World driven by the session.
    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Replaces the live state with a decoded save.
    pub(crate) fn restore(&mut self, snapshot: SaveSnapshot) -> Vec<Event> {
        let mut log = Vec::new();
        self.submit(
            Command::RestoreSnapshot {
                snapshot: Box::new(snapshot),
            },
            &mut log,
        );
        log
    }

    /// Runs one input line followed by one tick, returning every event raised.
    ///
    /// Statue pushes are only accepted as the answer to the move spell's dialog.
    pub(crate) fn handle(&mut self, input: Input) -> Vec<Event> {
        let mut log = Vec::new();
        match input {
            Input::Command(Command::PushStatue { name, .. }) if !self.choosing_statue() => {
                log::warn!("cannot push {name}: cast the move spell first");
            }
            Input::Command(command) => self.submit(command, &mut log),
            Input::Cast(intent) => self.cast(&intent, &mut log),
            Input::Wait | Input::Quit => {}
        }
        self.submit(Command::Tick { dt: self.tick }, &mut log);
        log
    }

    /// Encodes the current state, or `None` while saving is suspended.
    pub(crate) fn save_line(&self) -> Result<Option<String>> {
        match query::save_snapshot(&self.world) {
            Ok(snapshot) => Ok(Some(SaveCodec::encode(&snapshot)?)),
            Err(suspended) => {
                log::debug!("skipping save: {suspended}");
                Ok(None)
            }
        }
    }

    fn choosing_statue(&self) -> bool {
        query::pending(&self.world) == Some(&PendingInteraction::AwaitingMoveTarget)
    }

    fn cast(&mut self, intent: &CastIntent, log: &mut Vec<Event>) {
        match self.spells.cast(intent, &CasterView::capture(&self.world)) {
            Ok(commands) => {
                for command in commands {
                    self.submit(command, log);
                }
            }
            Err(error) if error.is_user_visible() => self.submit(
                Command::ShowMessage {
                    message: Message::Rejected(error),
                },
                log,
            ),
            Err(error) => log::debug!("cast of {} ignored: {error}", intent.spell),
        }
    }

    fn submit(&mut self, command: Command, log: &mut Vec<Event>) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        log.extend(events.iter().cloned());

        loop {
            let mut commands = Vec::new();
            self.patrol.handle(&events, &mut commands);
            let avatar = query::avatar(&self.world);
            let floor = avatar.position.floor();
            let snakes = query::snake_view(&self.world, floor);
            if let Some(view) = query::floor_view(&self.world, floor) {
                self.sight
                    .handle(&events, &avatar, &snakes, view, &mut commands);
            }
            if commands.is_empty() {
                break;
            }

            events.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
            log.extend(events.iter().cloned());
        }
    }
}
