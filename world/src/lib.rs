#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Medusa Tower.
//!
//! The world owns every mutable piece of the tower: the live tile grids, the
//! change-state registry, snakes, statues, the redirect table, puzzle progress
//! and the avatar. Adapters and systems mutate it exclusively through
//! [`apply`] and read it through the [`query`] module.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use medusa_tower_core::{
    ActionError, Command, Event, FloorId, Position, SpellKind, WELCOME_BANNER,
};
use medusa_tower_system_patrol::compile_floor;

mod avatar;
mod change_state;
mod grid;
mod interaction;
mod persistence;
mod puzzles;
mod snakes;
mod statues;
mod tower;

pub use interaction::{FollowUp, PendingInteraction};
pub use persistence::SaveSuspended;
pub use tower::{
    FloorLayout, LinkedPair, PieceDefinition, PuzzleSetDefinition, Tower, TowerRules,
};

use avatar::Avatar;
use change_state::ChangeStateRegistry;
use grid::GridStore;
use interaction::Dialogs;
use puzzles::PuzzleBook;
use snakes::SnakeRoster;
use statues::{RedirectTable, StatueRegistry};

/// Represents the authoritative Medusa Tower world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    rules: TowerRules,
    start: Position,
    layout_arrivals: BTreeMap<FloorId, Position>,
    grid: GridStore,
    change_state: ChangeStateRegistry,
    snakes: SnakeRoster,
    statues: StatueRegistry,
    redirects: RedirectTable,
    puzzles: PuzzleBook,
    avatar: Avatar,
    arrivals: BTreeMap<FloorId, Position>,
    unlocked_magic: BTreeSet<SpellKind>,
    dialogs: Dialogs,
    saving_suspended: bool,
    clock: Duration,
}

impl World {
    /// Creates the canonical seven-floor tower ready for play.
    #[must_use]
    pub fn new() -> Self {
        Self::from_tower(Tower::canonical())
    }

    /// Builds a world from a static tower description.
    ///
    /// Snake definitions are compiled from the layouts' markers once, here.
    #[must_use]
    pub fn from_tower(tower: Tower) -> Self {
        let grid = GridStore::from_layouts(&tower.layouts);
        let definitions = grid
            .floors()
            .filter_map(|floor| grid.original_view(floor).map(|view| compile_floor(floor, view)))
            .flatten()
            .collect();
        let statues = StatueRegistry::from_grid(&grid);
        let layout_arrivals = tower
            .layouts
            .iter()
            .map(|layout| (layout.floor, Position::at(layout.arrival, layout.floor)))
            .collect();

        Self {
            banner: WELCOME_BANNER,
            redirects: RedirectTable::with_entries(&tower.rules.default_redirects),
            puzzles: PuzzleBook::from_definitions(&tower.puzzle_sets),
            rules: tower.rules,
            start: tower.start,
            layout_arrivals,
            snakes: SnakeRoster::from_definitions(definitions),
            statues,
            grid,
            change_state: ChangeStateRegistry::default(),
            avatar: Avatar::new(tower.start),
            arrivals: BTreeMap::from([(tower.start.floor(), tower.start)]),
            unlocked_magic: BTreeSet::new(),
            dialogs: Dialogs::default(),
            saving_suspended: false,
            clock: Duration::ZERO,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::MoveAvatar { dx, dy } => world.move_avatar(dx, dy, out_events),
        Command::Interact => world.interact(out_events),
        Command::Acknowledge => world.acknowledge(out_events),
        Command::Teleport { destination } => world.teleport(destination, out_events),
        Command::StepSnakes { only_current_floor } => {
            let floor = only_current_floor.then_some(world.avatar.position.floor());
            let snakes = world.snakes.step_all(floor);
            out_events.push(Event::SnakesAdvanced { snakes });
        }
        Command::TriggerFall { reason } => world.trigger_fall(reason, out_events),
        Command::PushStatue { name, direction } => {
            if !world.close_move_dialog() {
                log::debug!("push of {name} ignored while a dialog is open");
                return;
            }
            if let Err(error) = world.push_statue(name, direction, out_events) {
                world.reject(error, out_events);
            }
        }
        Command::ApplyChange {
            floor,
            request,
            scope,
        } => {
            let allowed = world.rules.increment_allow_list(floor).to_vec();
            match world
                .change_state
                .apply_request(floor, request, scope, &allowed)
            {
                Ok(()) => out_events.push(Event::ChangeStateChanged {
                    spell: request.target,
                    scope,
                }),
                Err(error) => world.reject(error, out_events),
            }
        }
        Command::GrantCushion { steps } => {
            world.avatar.cushion = steps;
            world.redirects.union(&world.rules.default_redirects);
            log::info!("cushion protection granted for {steps} steps");
            out_events.push(Event::CushionGranted { steps });
        }
        Command::OpenMoveDialog => world.open_move_dialog(out_events),
        Command::AnswerPuzzle { piece, answer } => {
            if let Err(error) = world.answer_puzzle(piece, &answer, out_events) {
                world.reject(error, out_events);
            }
        }
        Command::SetTile { position, tile } => {
            if world.grid.set_tile(position, tile) {
                out_events.push(Event::TileChanged { position, tile });
            } else {
                world.reject(ActionError::OutOfBounds, out_events);
            }
        }
        Command::ResetFloor { floor } => world.restart_floor(floor, out_events),
        Command::RegisterRedirect { from, to } => world.redirects.insert(from, to),
        Command::ShowMessage { message } => world.show_message(message, out_events),
        Command::RestoreSnapshot { snapshot } => world.restore(&snapshot, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{PendingInteraction, PuzzleSetDefinition, SaveSuspended, TowerRules, World};
    use medusa_tower_core::{
        AvatarSnapshot, ElevatorConfig, FloorId, FloorView, Modifier, ModifierScope, PieceId,
        Position, SaveSnapshot, SetId, SnakeId, SnakeView, SpellKind, StatueSnapshot, Tile,
        GRID_HEIGHT, GRID_WIDTH,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Width and height shared by every floor grid.
    #[must_use]
    pub const fn grid_dimensions() -> (u32, u32) {
        (GRID_WIDTH, GRID_HEIGHT)
    }

    /// Floors of the tower, bottom to top.
    #[must_use]
    pub fn floors(world: &World) -> Vec<FloorId> {
        world.grid.floors().collect()
    }

    /// Live tile at the position, or `None` outside the tower.
    #[must_use]
    pub fn tile(world: &World, position: Position) -> Option<Tile> {
        world.grid.tile(position)
    }

    /// Original layout tile at the position, or `None` outside the tower.
    #[must_use]
    pub fn original_tile(world: &World, position: Position) -> Option<Tile> {
        world.grid.original_tile(position)
    }

    /// Read-only view of a floor's live tiles.
    #[must_use]
    pub fn floor_view(world: &World, floor: FloorId) -> Option<FloorView<'_>> {
        world.grid.view(floor)
    }

    /// Captures the avatar's current state.
    #[must_use]
    pub fn avatar(world: &World) -> AvatarSnapshot {
        world.avatar.snapshot(world.clock)
    }

    /// Simulation time accumulated from ticks.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.clock
    }

    /// Captures the live snakes patrolling a floor.
    #[must_use]
    pub fn snake_view(world: &World, floor: FloorId) -> SnakeView {
        world.snakes.view(floor)
    }

    /// Live snake whose current cell is the position.
    #[must_use]
    pub fn snake_at(world: &World, position: Position) -> Option<SnakeId> {
        world.snakes.occupied_by(position)
    }

    /// Captures every statue, including broken and removed ones.
    #[must_use]
    pub fn statues(world: &World) -> Vec<StatueSnapshot> {
        world.statues.iter().map(|statue| statue.snapshot()).collect()
    }

    /// Stored elevator config of a floor; `None` means default behaviour.
    #[must_use]
    pub fn elevator_config(world: &World, floor: FloorId) -> Option<ElevatorConfig> {
        world.change_state.elevator_config(floor)
    }

    /// Stored modifier of a spell in one scope.
    #[must_use]
    pub fn modifier(world: &World, spell: SpellKind, scope: ModifierScope) -> Option<Modifier> {
        world.change_state.modifier(spell, scope)
    }

    /// Modifier in force on a floor, preferring the floor record over the global one.
    #[must_use]
    pub fn effective_modifier(world: &World, spell: SpellKind, floor: FloorId) -> Option<Modifier> {
        world.change_state.effective_modifier(spell, floor)
    }

    /// Static rule tables of the tower.
    #[must_use]
    pub fn rules(world: &World) -> &TowerRules {
        &world.rules
    }

    /// Explicit landing cell registered for a hole.
    #[must_use]
    pub fn redirect(world: &World, from: Position) -> Option<Position> {
        world.redirects.get(from)
    }

    /// Where a statue falling through the hole would land, if anywhere.
    #[must_use]
    pub fn fall_destination(world: &World, hole: Position) -> Option<Position> {
        world.resolve_fall(hole)
    }

    /// Respawn point of a floor.
    #[must_use]
    pub fn arrival(world: &World, floor: FloorId) -> Option<Position> {
        world.arrivals.get(&floor).copied()
    }

    /// Interaction the world is currently waiting on.
    #[must_use]
    pub fn pending(world: &World) -> Option<&PendingInteraction> {
        world.dialogs.pending()
    }

    /// Reports whether movement and casting are currently ignored.
    #[must_use]
    pub fn is_busy(world: &World) -> bool {
        !world.accepts_input()
    }

    /// Reports whether a magic box taught the spell.
    #[must_use]
    pub fn magic_unlocked(world: &World, spell: SpellKind) -> bool {
        world.unlocked_magic.contains(&spell)
    }

    /// Reports whether the piece was solved.
    #[must_use]
    pub fn piece_unlocked(world: &World, piece: PieceId) -> bool {
        world.puzzles.is_piece_unlocked(piece)
    }

    /// Accepted answer of a solved piece.
    #[must_use]
    pub fn piece_answer(world: &World, piece: PieceId) -> Option<&str> {
        world.puzzles.solved_answer(piece)
    }

    /// Reports whether the set is unlocked.
    #[must_use]
    pub fn set_unlocked(world: &World, set: SetId) -> bool {
        world.puzzles.is_set_unlocked(set)
    }

    /// Static definition of a puzzle set.
    #[must_use]
    pub fn puzzle_set(world: &World, set: SetId) -> Option<&PuzzleSetDefinition> {
        world.puzzles.set_definition(set)
    }

    /// Captures the persistable state.
    ///
    /// # Errors
    ///
    /// Returns [`SaveSuspended`] while a multi-step mutation is in progress or
    /// while the avatar is dying.
    pub fn save_snapshot(world: &World) -> Result<SaveSnapshot, SaveSuspended> {
        world.capture()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medusa_tower_core::{CellCoord, SnakeMode, Tile};

    #[test]
    fn new_world_places_avatar_at_start() {
        let world = World::new();
        let avatar = query::avatar(&world);
        assert_eq!(avatar.position, Position::new(5, 9, FloorId::new(1)));
        assert!(!avatar.suppressed);
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
        assert_eq!(
            query::arrival(&world, FloorId::new(1)),
            Some(avatar.position)
        );
        assert_eq!(query::floors(&world), FloorId::ALL.to_vec());
    }

    #[test]
    fn snakes_are_compiled_from_markers() {
        let world = World::new();
        let second = query::snake_view(&world, FloorId::new(2)).into_vec();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].mode, SnakeMode::Clock);
        assert_eq!(second[0].position, Position::new(3, 3, FloorId::new(2)));

        let fifth = query::snake_view(&world, FloorId::new(5)).into_vec();
        assert_eq!(fifth.len(), 1);
        assert_eq!(fifth[0].position, Position::new(0, 9, FloorId::new(5)));
    }

    #[test]
    fn step_snakes_only_moves_the_avatar_floor() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StepSnakes {
                only_current_floor: true,
            },
            &mut events,
        );
        let Some(Event::SnakesAdvanced { snakes }) = events.first() else {
            panic!("expected snake steps, got {events:?}");
        };
        assert_eq!(snakes.len(), 1, "only the first floor snake moves");
        assert_eq!(snakes[0].position, Position::new(2, 3, FloorId::new(1)));
        assert_eq!(
            query::snake_view(&world, FloorId::new(5)).into_vec()[0].position,
            Position::new(0, 9, FloorId::new(5))
        );
    }

    #[test]
    fn set_tile_outside_grid_is_rejected_silently() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetTile {
                position: Position::at(CellCoord::new(11, 11), FloorId::new(1)),
                tile: Tile::Wall,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::ActionRejected {
                error: ActionError::OutOfBounds
            }]
        );
        assert_eq!(query::pending(&world), None);
    }

    #[test]
    fn reset_floor_restores_layout_and_statues() {
        let mut world = World::new();
        let mut events = Vec::new();
        let floor = FloorId::new(3);
        apply(
            &mut world,
            Command::SetTile {
                position: Position::new(1, 1, floor),
                tile: Tile::Hole,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::PushStatue {
                name: medusa_tower_core::StatueName::new('b').expect("letter"),
                direction: medusa_tower_core::Direction::North,
            },
            &mut events,
        );
        assert_eq!(query::tile(&world, Position::new(2, 5, floor)), Some(Tile::Floor));

        apply(&mut world, Command::ResetFloor { floor }, &mut events);
        assert_eq!(events.last(), Some(&Event::FloorReset { floor }));
        assert_eq!(query::tile(&world, Position::new(1, 1, floor)), Some(Tile::Floor));
        assert_eq!(
            query::tile(&world, Position::new(2, 5, floor)),
            query::original_tile(&world, Position::new(2, 5, floor))
        );
        assert!(query::statues(&world)
            .iter()
            .all(|statue| !statue.state.moved));
    }
}
