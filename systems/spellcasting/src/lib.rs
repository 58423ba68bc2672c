#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spell resolution: turns a typed incantation into world commands.
//!
//! The resolver never mutates the world. It reads a [`CasterView`] captured
//! before the cast and answers with the commands to submit, or with the
//! [`ActionError`] the caller should present. Keywords are compared after
//! [`normalize_words`].

use medusa_tower_core::{
    normalize_words, ActionError, ChangeRequest, Command, ElevatorConfig, FloorId, Modifier,
    ModifierScope, Position, SpellKind, Tile,
};
use medusa_tower_world::{query, World};

mod tables;

pub use tables::{AllowedChange, ElevatorRule, KeywordPairs, RequiredState, Spellbook};

/// Spell the player attempts, with the raw words they typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastIntent {
    /// Spell selected by the player.
    pub spell: SpellKind,
    /// Raw incantation text.
    pub incantation: String,
    /// Requested change; only read by the change spell.
    pub change: Option<ChangeRequest>,
}

impl CastIntent {
    /// Creates an intent without a change request.
    #[must_use]
    pub fn new(spell: SpellKind, incantation: impl Into<String>) -> Self {
        Self {
            spell,
            incantation: incantation.into(),
            change: None,
        }
    }

    /// Attaches the change request of a change spell.
    #[must_use]
    pub fn with_change(mut self, change: ChangeRequest) -> Self {
        self.change = Some(change);
        self
    }
}

/// World state the resolver needs, captured before the cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CasterView {
    /// Avatar position.
    pub position: Position,
    /// Live tile under the avatar.
    pub standing_on: Option<Tile>,
    /// Stored elevator config of the avatar's floor.
    pub elevator: Option<ElevatorConfig>,
    /// Move modifier in force on the avatar's floor.
    pub movement: Option<Modifier>,
    /// Global cushion modifier.
    pub cushion: Option<Modifier>,
    /// Whether a magic box taught the move spell.
    pub move_unlocked: bool,
    /// Whether input is currently ignored.
    pub busy: bool,
}

impl CasterView {
    /// Captures the caster's surroundings from the world.
    #[must_use]
    pub fn capture(world: &World) -> Self {
        let position = query::avatar(world).position;
        let floor = position.floor();
        Self {
            position,
            standing_on: query::tile(world, position),
            elevator: query::elevator_config(world, floor),
            movement: query::effective_modifier(world, SpellKind::Move, floor),
            cushion: query::modifier(world, SpellKind::Cushion, ModifierScope::Global),
            move_unlocked: query::magic_unlocked(world, SpellKind::Move),
            busy: query::is_busy(world),
        }
    }

    fn floor(&self) -> FloorId {
        self.position.floor()
    }

    fn stands_on(&self, tile: Tile) -> bool {
        self.standing_on == Some(tile)
    }
}

/// Resolves spell casts against the rule tables.
#[derive(Clone, Debug, Default)]
pub struct Spellcasting {
    book: Spellbook,
}

impl Spellcasting {
    /// Creates a resolver over the canonical rule tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver over custom rule tables.
    #[must_use]
    pub fn with_book(book: Spellbook) -> Self {
        Self { book }
    }

    /// Rule tables in use.
    #[must_use]
    pub fn book(&self) -> &Spellbook {
        &self.book
    }

    /// Resolves a cast into the commands that carry it out.
    ///
    /// Returns no commands while the caster is busy.
    ///
    /// # Errors
    ///
    /// Returns the [`ActionError`] describing why the cast failed; the caller
    /// decides whether to surface it.
    pub fn cast(&self, intent: &CastIntent, view: &CasterView) -> Result<Vec<Command>, ActionError> {
        if view.busy {
            log::debug!("cast of {} ignored while busy", intent.spell);
            return Ok(Vec::new());
        }
        let keyword = normalize_words(&intent.incantation);
        let result = match intent.spell {
            SpellKind::Elevator => self.elevator(&keyword, view),
            SpellKind::Move => self.movement(&keyword, view),
            SpellKind::Cushion => self.cushion(&keyword, view),
            SpellKind::Change => self.change(&keyword, intent.change, view),
        };
        match &result {
            Ok(commands) => log::info!("{} cast with {keyword:?}: {commands:?}", intent.spell),
            Err(error) => log::debug!("{} cast with {keyword:?} failed: {error}", intent.spell),
        }
        result
    }

    fn elevator(&self, keyword: &str, view: &CasterView) -> Result<Vec<Command>, ActionError> {
        if !self.book.knows_elevator_keyword(keyword) {
            return Err(ActionError::WrongIncantation);
        }
        if !view.stands_on(Tile::Elevator) {
            return Err(ActionError::WrongLocation);
        }
        let rule = self
            .book
            .elevator_rule(view.floor(), keyword)
            .ok_or(ActionError::MisplacedIncantation)?;
        if !rule.required.accepts(view.elevator) {
            return Err(ActionError::StateMismatch);
        }
        Ok(vec![Command::Teleport {
            destination: rule.destination,
        }])
    }

    fn movement(&self, keyword: &str, view: &CasterView) -> Result<Vec<Command>, ActionError> {
        let words = &self.book.movement;
        if !words.knows(keyword) {
            return Err(ActionError::WrongIncantation);
        }
        if !view.stands_on(Tile::Move) {
            return Err(ActionError::WrongLocation);
        }
        if !view.move_unlocked {
            return Err(ActionError::AbilityLocked);
        }
        let inverted = view.movement.is_some_and(|modifier| modifier.inverted);
        if !words.active(inverted).contains(&keyword) {
            return Err(ActionError::StateMismatch);
        }
        Ok(vec![Command::OpenMoveDialog])
    }

    fn cushion(&self, keyword: &str, view: &CasterView) -> Result<Vec<Command>, ActionError> {
        let words = &self.book.cushion;
        if !words.knows(keyword) {
            return Err(ActionError::WrongIncantation);
        }
        if !view.stands_on(Tile::Cushion) {
            return Err(ActionError::WrongLocation);
        }
        let increase = view.cushion.map_or(0, |modifier| modifier.increase);
        let steps = self.book.base_cushion.saturating_add(increase);
        let increased = steps == self.book.increased_cushion;
        if !words.active(increased).contains(&keyword) {
            return Err(ActionError::StateMismatch);
        }
        Ok(vec![Command::GrantCushion { steps }])
    }

    fn change(
        &self,
        keyword: &str,
        request: Option<ChangeRequest>,
        view: &CasterView,
    ) -> Result<Vec<Command>, ActionError> {
        if !self.book.change.contains(&keyword) {
            return Err(ActionError::WrongIncantation);
        }
        if !view.stands_on(Tile::ChangeAltar) {
            return Err(ActionError::WrongLocation);
        }
        let request = request.ok_or(ActionError::InvalidChangeRequest)?;
        let allowed = self
            .book
            .allowed_change(view.floor(), request)
            .ok_or(ActionError::InvalidChangeRequest)?;
        Ok(vec![Command::ApplyChange {
            floor: allowed.floor,
            request: allowed.request,
            scope: allowed.scope,
        }])
    }
}
