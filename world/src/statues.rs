//! Statue registry, redirect table and push resolution.

use std::collections::BTreeMap;

use medusa_tower_core::{
    ActionError, Direction, Event, FallReason, FloorId, Position, RedirectRecord, SpellKind,
    StatueId, StatueName, StatueSnapshot, StatueState, TargetOption, Tile,
};

use crate::{grid::GridStore, World};

/// Furthest a pushed statue slides.
const SLIDE_LIMIT: i32 = 5;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Statue {
    pub(crate) id: StatueId,
    pub(crate) name: StatueName,
    pub(crate) initial: Position,
    pub(crate) position: Position,
    pub(crate) state: StatueState,
}

impl Statue {
    pub(crate) fn snapshot(&self) -> StatueSnapshot {
        StatueSnapshot {
            id: self.id,
            name: self.name,
            position: self.position,
            state: self.state,
        }
    }

    /// Tile drawn for the statue, or `None` once it left play.
    pub(crate) fn tile(&self) -> Option<Tile> {
        if self.state.removed {
            None
        } else if self.state.broken {
            Some(Tile::FallenStatue(self.name))
        } else {
            Some(Tile::StatueMarker(self.name))
        }
    }

    fn is_pushable(&self) -> bool {
        !self.state.removed && !self.state.broken
    }
}

/// Every statue of the tower, keyed by `(name, initial floor)`.
#[derive(Clone, Debug, Default)]
pub(crate) struct StatueRegistry {
    statues: Vec<Statue>,
}

impl StatueRegistry {
    /// Collects the statue markers of the original layouts in floor then reading order.
    pub(crate) fn from_grid(grid: &GridStore) -> Self {
        let mut statues = Vec::new();
        for floor in grid.floors() {
            let Some(view) = grid.original_view(floor) else {
                continue;
            };
            for (row, tiles) in view.rows().enumerate() {
                for (column, tile) in tiles.iter().enumerate() {
                    let Tile::StatueMarker(name) = tile else {
                        continue;
                    };
                    let (Ok(column), Ok(row), Ok(id)) = (
                        u32::try_from(column),
                        u32::try_from(row),
                        u32::try_from(statues.len()),
                    ) else {
                        continue;
                    };
                    let position = Position::new(column, row, floor);
                    statues.push(Statue {
                        id: StatueId::new(id),
                        name: *name,
                        initial: position,
                        position,
                        state: StatueState::default(),
                    });
                }
            }
        }
        Self { statues }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Statue> {
        self.statues.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Statue> {
        self.statues.iter_mut()
    }

    pub(crate) fn get(&self, id: StatueId) -> Option<&Statue> {
        self.statues.iter().find(|statue| statue.id == id)
    }

    fn get_mut(&mut self, id: StatueId) -> Option<&mut Statue> {
        self.statues.iter_mut().find(|statue| statue.id == id)
    }

    /// Statue still in play whose current cell is `position`.
    fn at(&self, position: Position) -> Option<StatueId> {
        self.statues
            .iter()
            .find(|statue| !statue.state.removed && statue.position == position)
            .map(|statue| statue.id)
    }

    pub(crate) fn find_by_key(&self, name: StatueName, initial_floor: FloorId) -> Option<StatueId> {
        self.statues
            .iter()
            .find(|statue| statue.name == name && statue.initial.floor() == initial_floor)
            .map(|statue| statue.id)
    }

    /// Returns statues that started on `floor` and are still standing to their initial cell.
    pub(crate) fn reset_floor(&mut self, floor: FloorId) {
        for statue in &mut self.statues {
            if statue.initial.floor() == floor && statue.is_pushable() {
                statue.position = statue.initial;
                statue.state.moved = false;
            }
        }
    }
}

/// Explicit fall destinations overriding the straight-down rule.
#[derive(Clone, Debug, Default)]
pub(crate) struct RedirectTable {
    entries: BTreeMap<Position, Position>,
}

impl RedirectTable {
    pub(crate) fn with_entries(entries: &[(Position, Position)]) -> Self {
        let mut table = Self::default();
        table.union(entries);
        table
    }

    /// Adds or replaces a single entry.
    pub(crate) fn insert(&mut self, from: Position, to: Position) {
        let _ = self.entries.insert(from, to);
    }

    /// Adds entries whose keys are not present yet.
    pub(crate) fn union(&mut self, entries: &[(Position, Position)]) {
        for (from, to) in entries {
            let _ = self.entries.entry(*from).or_insert(*to);
        }
    }

    pub(crate) fn get(&self, from: Position) -> Option<Position> {
        self.entries.get(&from).copied()
    }

    pub(crate) fn records(&self) -> Vec<RedirectRecord> {
        self.entries
            .iter()
            .map(|(from, to)| RedirectRecord {
                from: *from,
                to: *to,
            })
            .collect()
    }
}

enum Slide {
    Land(Position),
    Fall(Position),
}

impl World {
    /// Pushes every eligible statue carrying `name`.
    ///
    /// Succeeds when at least one instance moved; otherwise the first
    /// instance's rejection is returned and nothing changed.
    pub(crate) fn push_statue(
        &mut self,
        name: StatueName,
        direction: Direction,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        let candidates: Vec<&Statue> = self
            .statues
            .iter()
            .filter(|statue| statue.name == name && statue.is_pushable())
            .collect();
        if candidates.is_empty() {
            return Err(ActionError::UnknownStatue);
        }

        let avatar_floor = self.avatar.position.floor();
        let option = self
            .change_state
            .effective_modifier(SpellKind::Move, avatar_floor)
            .and_then(|modifier| modifier.option);
        let targets: Vec<&Statue> = candidates
            .into_iter()
            .filter(|statue| match option {
                Some(TargetOption::Same) => statue.position.floor() == avatar_floor,
                Some(TargetOption::Different) => statue.position.floor() != avatar_floor,
                None => true,
            })
            .collect();
        if targets.is_empty() {
            return Err(ActionError::TargetRestricted);
        }

        if self
            .rules
            .restriction(name)
            .is_some_and(|allowed| allowed != direction)
        {
            return Err(ActionError::DirectionRestricted);
        }

        let linked = self.rules.is_linked(name);
        let ids: Vec<StatueId> = targets
            .iter()
            .filter(|statue| linked || !statue.state.moved)
            .map(|statue| statue.id)
            .collect();
        if ids.is_empty() {
            return Err(ActionError::AlreadyMoved);
        }

        let mut first_error = None;
        let mut moved_any = false;
        for id in ids {
            match self.push_one(id, direction, out_events) {
                Ok(()) => moved_any = true,
                Err(error) => {
                    log::debug!("statue {id:?} ({name}) refused to move {direction:?}: {error}");
                    let _ = first_error.get_or_insert(error);
                }
            }
        }

        match (moved_any, first_error) {
            (false, Some(error)) => Err(error),
            _ => Ok(()),
        }
    }

    fn push_one(
        &mut self,
        id: StatueId,
        direction: Direction,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        let statue = *self.statues.get(id).ok_or(ActionError::UnknownStatue)?;
        match self.slide(&statue, direction)? {
            Slide::Land(destination) => {
                self.relocate(id, destination, Tile::StatueMarker(statue.name), out_events);
                if let Some(statue) = self.statues.get_mut(id) {
                    statue.state.moved = true;
                }
                log::info!("{} slid from {} to {destination}", statue.name, statue.position);
                self.announce_statue(id, out_events);
                Ok(())
            }
            Slide::Fall(hole) => {
                let destination = self
                    .resolve_fall(hole)
                    .ok_or(ActionError::UnresolvableFall)?;
                self.land_fallen(statue, destination, out_events);
                Ok(())
            }
        }
    }

    /// Walks up to five cells from the statue without mutating anything.
    fn slide(&self, statue: &Statue, direction: Direction) -> Result<Slide, ActionError> {
        let floor = statue.position.floor();
        let (column_delta, row_delta) = self.rules.push_vector(floor, direction);
        let origin = statue.position.cell();
        let mut last_open = None;

        for step in 1..=SLIDE_LIMIT {
            let next = origin
                .offset(column_delta * step, row_delta * step)
                .map(|cell| Position::at(cell, floor));
            let tile = next.and_then(|position| self.grid.tile(position));
            match (next, tile) {
                (Some(position), Some(Tile::Hole)) => return Ok(Slide::Fall(position)),
                (Some(position), Some(Tile::Floor | Tile::SnakeMarker(..)))
                    if position != self.avatar.position =>
                {
                    last_open = Some(position);
                }
                _ if step == SLIDE_LIMIT => break,
                _ => return Err(ActionError::Blocked),
            }
        }

        last_open.map(Slide::Land).ok_or(ActionError::Blocked)
    }

    /// Resolves where a statue falling through `hole` lands.
    pub(crate) fn resolve_fall(&self, hole: Position) -> Option<Position> {
        if let Some(destination) = self.redirects.get(hole) {
            return Some(destination);
        }
        let source = hole.floor().get();
        if source <= 1 {
            return None;
        }
        let below = Position::at(hole.cell(), FloorId::new(source - 1));
        if let Some(destination) = self.redirects.get(below) {
            return Some(destination);
        }
        match self.grid.tile(below) {
            Some(tile) if tile.is_walkable() && tile != Tile::Hole => Some(below),
            _ => None,
        }
    }

    fn land_fallen(&mut self, statue: Statue, destination: Position, out_events: &mut Vec<Event>) {
        if destination == self.avatar.position {
            self.crush_avatar(statue, out_events);
            return;
        }

        if let Some(occupant) = self.statues.at(destination) {
            if occupant != statue.id {
                self.clear_statue_tile(destination, out_events);
                if let Some(crushed) = self.statues.get_mut(occupant) {
                    crushed.state.removed = true;
                }
                log::info!("statue {occupant:?} was destroyed at {destination}");
                self.announce_statue(occupant, out_events);
            }
        }

        if let Some(snake) = self.snakes.occupied_by(destination) {
            if self.snakes.kill(snake) {
                log::info!("snake {snake:?} was killed by a falling statue at {destination}");
                out_events.push(Event::SnakeKilled {
                    snake,
                    position: destination,
                });
            }
        }

        self.relocate(
            statue.id,
            destination,
            Tile::FallenStatue(statue.name),
            out_events,
        );
        if let Some(fallen) = self.statues.get_mut(statue.id) {
            fallen.state.broken = true;
            fallen.state.moved = true;
        }
        log::info!("{} fell from {} to {destination}", statue.name, statue.position);
        self.announce_statue(statue.id, out_events);
    }

    /// The avatar stands on the landing cell: the statue snaps back and the avatar dies.
    fn crush_avatar(&mut self, statue: Statue, out_events: &mut Vec<Event>) {
        self.with_saving_suspended(|world| {
            world.relocate(
                statue.id,
                statue.initial,
                Tile::StatueMarker(statue.name),
                out_events,
            );
            if let Some(restored) = world.statues.get_mut(statue.id) {
                restored.state.moved = false;
                restored.state.broken = false;
            }
            log::info!(
                "{} crushed the avatar and returned to {}",
                statue.name,
                statue.initial
            );
            world.announce_statue(statue.id, out_events);
            world.trigger_fall(FallReason::StatueCrush(statue.id), out_events);
        });
    }

    /// Moves a statue's tile from its current cell to `destination`.
    fn relocate(
        &mut self,
        id: StatueId,
        destination: Position,
        tile: Tile,
        out_events: &mut Vec<Event>,
    ) {
        let Some(statue) = self.statues.get_mut(id) else {
            return;
        };
        let origin = statue.position;
        statue.position = destination;
        if origin != destination {
            self.clear_statue_tile(origin, out_events);
        }
        if self.grid.set_tile(destination, tile) {
            out_events.push(Event::TileChanged {
                position: destination,
                tile,
            });
        }
    }

    /// Restores the tile under a statue that leaves `position`.
    fn clear_statue_tile(&mut self, position: Position, out_events: &mut Vec<Event>) {
        let tile = match self.grid.original_tile(position) {
            Some(tile) if !tile.is_statue() => tile,
            _ => Tile::Floor,
        };
        if self.grid.set_tile(position, tile) {
            out_events.push(Event::TileChanged { position, tile });
        }
    }

    fn announce_statue(&self, id: StatueId, out_events: &mut Vec<Event>) {
        if let Some(statue) = self.statues.get(id) {
            out_events.push(Event::StatueStateChanged {
                statue: statue.id,
                position: statue.position,
                state: statue.state,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{apply, query, tower::Tower};
    use medusa_tower_core::Command;

    fn name(letter: char) -> StatueName {
        StatueName::new(letter).expect("letter")
    }

    #[test]
    fn statues_are_collected_from_layouts() {
        let world = World::new();
        let names: Vec<(char, u8)> = query::statues(&world)
            .iter()
            .map(|statue| (statue.name.letter(), statue.position.floor().get()))
            .collect();
        assert_eq!(
            names,
            vec![('a', 2), ('b', 3), ('m', 4), ('k', 4), ('m', 5), ('n', 6)]
        );
    }

    #[test]
    fn redirect_union_never_overwrites() {
        let floor = FloorId::new(6);
        let hole = Position::new(5, 2, floor);
        let custom = Position::new(1, 1, FloorId::new(5));
        let mut table = RedirectTable::default();
        table.insert(hole, custom);
        table.union(&Tower::canonical().rules.default_redirects);
        assert_eq!(table.get(hole), Some(custom));
        assert_eq!(table.records().len(), 3);
    }

    #[test]
    fn default_fall_goes_one_floor_down() {
        let world = World::new();
        let hole = Position::new(7, 5, FloorId::new(5));
        assert_eq!(
            world.resolve_fall(hole),
            Some(Position::new(7, 5, FloorId::new(4)))
        );
        assert_eq!(
            world.resolve_fall(Position::new(3, 6, FloorId::new(1))),
            None,
            "the lowest upper floor has no floor below to fall to"
        );
    }

    #[test]
    fn restricted_statue_only_moves_its_way() {
        let mut world = World::new();
        let mut events = Vec::new();
        assert_eq!(
            world.push_statue(name('k'), Direction::North, &mut events),
            Err(ActionError::DirectionRestricted)
        );
        assert!(events.is_empty());
    }

    #[test]
    fn unknown_name_is_rejected() {
        let mut world = World::new();
        let mut events = Vec::new();
        assert_eq!(
            world.push_statue(name('z'), Direction::North, &mut events),
            Err(ActionError::UnknownStatue)
        );
    }

    #[test]
    fn plain_push_lands_and_marks_moved() {
        let mut world = World::new();
        let mut events = Vec::new();
        let floor = FloorId::new(3);
        world
            .push_statue(name('b'), Direction::North, &mut events)
            .expect("b slides north");

        let statue = query::statues(&world)
            .into_iter()
            .find(|statue| statue.name == name('b'))
            .expect("b");
        assert_eq!(statue.position, Position::new(2, 1, floor), "clamped by the wall");
        assert!(statue.state.moved);
        assert_eq!(
            query::tile(&world, Position::new(2, 1, floor)),
            Some(Tile::StatueMarker(name('b')))
        );
        assert_eq!(query::tile(&world, Position::new(2, 5, floor)), Some(Tile::Floor));

        assert_eq!(
            world.push_statue(name('b'), Direction::South, &mut events),
            Err(ActionError::AlreadyMoved)
        );
    }

    #[test]
    fn target_option_filters_instances() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ApplyChange {
                floor: FloorId::new(1),
                request: medusa_tower_core::ChangeRequest::new(
                    SpellKind::Move,
                    medusa_tower_core::ChangeEffect::Restrict(TargetOption::Same),
                ),
                scope: medusa_tower_core::ModifierScope::Floor(FloorId::new(1)),
            },
            &mut events,
        );
        assert_eq!(
            world.push_statue(name('a'), Direction::East, &mut events),
            Err(ActionError::TargetRestricted),
            "the avatar is on floor 1 and statue a stands on floor 2"
        );
    }
}
