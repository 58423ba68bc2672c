#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Line-of-sight evaluation between the avatar and the snakes of its floor.
//!
//! Sight is only evaluated in response to [`Event::SnakesAdvanced`], which the
//! world emits after the snakes stepped for the avatar's move. Evaluating on
//! any earlier event would let a snake see the avatar's previous cell.

use medusa_tower_core::{
    AvatarSnapshot, CellCoord, Command, Event, FallReason, FloorView, Position, SnakeId,
    SnakeView,
};

/// Pure system that turns a snake's line of sight into a fall.
#[derive(Debug, Default)]
pub struct Sight {
    sightings: u64,
}

impl Sight {
    /// Creates a new sight system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sightings reported since creation.
    #[must_use]
    pub fn sightings(&self) -> u64 {
        self.sightings
    }

    /// Consumes world events and emits a fall when a snake sees the avatar.
    ///
    /// `snakes` and `floor` must describe the avatar's current floor. At most
    /// one fall is emitted per batch.
    pub fn handle(
        &mut self,
        events: &[Event],
        avatar: &AvatarSnapshot,
        snakes: &SnakeView,
        floor: FloorView<'_>,
        out: &mut Vec<Command>,
    ) {
        let stepped = events
            .iter()
            .any(|event| matches!(event, Event::SnakesAdvanced { .. }));
        if !stepped {
            return;
        }

        if let Some(snake) = hazard_in_sight(avatar.position, snakes, floor) {
            log::info!("snake {} spotted the avatar at {}", snake.get(), avatar.position);
            self.sightings = self.sightings.saturating_add(1);
            out.push(Command::TriggerFall {
                reason: FallReason::SnakeSight(snake),
            });
        }
    }
}

/// First snake, by identifier, sharing a row or column with the avatar with
/// no sight-blocking tile strictly between them.
#[must_use]
pub fn hazard_in_sight(
    avatar: Position,
    snakes: &SnakeView,
    floor: FloorView<'_>,
) -> Option<SnakeId> {
    if floor.floor() != avatar.floor() {
        return None;
    }
    snakes
        .iter()
        .filter(|snake| snake.position.floor() == avatar.floor())
        .find(|snake| clear_line(avatar.cell(), snake.position.cell(), floor))
        .map(|snake| snake.id)
}

fn clear_line(from: CellCoord, to: CellCoord, floor: FloorView<'_>) -> bool {
    let between: Vec<CellCoord> = if from.row() == to.row() {
        let (low, high) = ordered(from.column(), to.column());
        (low + 1..high)
            .map(|column| CellCoord::new(column, from.row()))
            .collect()
    } else if from.column() == to.column() {
        let (low, high) = ordered(from.row(), to.row());
        (low + 1..high)
            .map(|row| CellCoord::new(from.column(), row))
            .collect()
    } else {
        return false;
    };

    between
        .into_iter()
        .all(|cell| !floor.tile(cell).is_some_and(|tile| tile.blocks_sight()))
}

fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medusa_tower_core::{
        ActionError, Facing, FloorId, SnakeMode, SnakeSnapshot, SnakeStep, StatueName, Tile,
        GRID_HEIGHT, GRID_WIDTH,
    };

    const FLOOR: FloorId = FloorId::new(3);

    fn open_floor() -> Vec<Tile> {
        vec![Tile::Floor; (GRID_WIDTH * GRID_HEIGHT) as usize]
    }

    fn put(tiles: &mut [Tile], column: u32, row: u32, tile: Tile) {
        tiles[(row * GRID_WIDTH + column) as usize] = tile;
    }

    fn snakes(cells: &[(u32, u32)]) -> SnakeView {
        SnakeView::from_snapshots(
            cells
                .iter()
                .enumerate()
                .map(|(id, (column, row))| SnakeSnapshot {
                    id: SnakeId::new(id as u32),
                    position: Position::new(*column, *row, FLOOR),
                    mode: SnakeMode::Bounce,
                })
                .collect(),
        )
    }

    fn avatar_at(column: u32, row: u32) -> AvatarSnapshot {
        AvatarSnapshot {
            position: Position::new(column, row, FLOOR),
            facing: Facing::Down,
            frame: 0,
            cushion: 0,
            suppressed: false,
        }
    }

    #[test]
    fn sees_along_rows_and_columns() {
        let tiles = open_floor();
        let view = FloorView::new(FLOOR, &tiles);
        let avatar = Position::new(5, 5, FLOOR);

        assert_eq!(hazard_in_sight(avatar, &snakes(&[(1, 5)]), view), Some(SnakeId::new(0)));
        assert_eq!(hazard_in_sight(avatar, &snakes(&[(5, 9)]), view), Some(SnakeId::new(0)));
        assert_eq!(hazard_in_sight(avatar, &snakes(&[(4, 4)]), view), None);
        assert_eq!(
            hazard_in_sight(avatar, &snakes(&[(5, 5)]), view),
            Some(SnakeId::new(0)),
            "a snake on the avatar's own cell sees it"
        );
    }

    #[test]
    fn statues_shield_the_avatar() {
        let mut tiles = open_floor();
        let statue = StatueName::new('b').expect("letter");
        put(&mut tiles, 3, 5, Tile::StatueMarker(statue));
        put(&mut tiles, 5, 7, Tile::FallenStatue(statue));
        let view = FloorView::new(FLOOR, &tiles);
        let avatar = Position::new(5, 5, FLOOR);

        assert_eq!(hazard_in_sight(avatar, &snakes(&[(1, 5), (5, 9)]), view), None);
        assert_eq!(
            hazard_in_sight(avatar, &snakes(&[(1, 5), (5, 9), (8, 5)]), view),
            Some(SnakeId::new(2))
        );
    }

    #[test]
    fn walls_block_but_holes_do_not() {
        let mut tiles = open_floor();
        put(&mut tiles, 5, 3, Tile::Wall);
        put(&mut tiles, 7, 5, Tile::Hole);
        let view = FloorView::new(FLOOR, &tiles);
        let avatar = Position::new(5, 5, FLOOR);

        assert_eq!(hazard_in_sight(avatar, &snakes(&[(5, 1)]), view), None);
        assert_eq!(hazard_in_sight(avatar, &snakes(&[(9, 5)]), view), Some(SnakeId::new(0)));
    }

    #[test]
    fn only_evaluates_after_snakes_step() {
        let tiles = open_floor();
        let view = FloorView::new(FLOOR, &tiles);
        let mut sight = Sight::new();
        let mut commands = Vec::new();
        let avatar = avatar_at(5, 5);
        let view_snakes = snakes(&[(1, 5)]);

        sight.handle(
            &[Event::MoveRejected {
                facing: Facing::Up,
                reason: ActionError::Blocked,
            }],
            &avatar,
            &view_snakes,
            view,
            &mut commands,
        );
        assert!(commands.is_empty());

        sight.handle(
            &[Event::SnakesAdvanced {
                snakes: vec![SnakeStep {
                    snake: SnakeId::new(0),
                    position: Position::new(1, 5, FLOOR),
                }],
            }],
            &avatar,
            &view_snakes,
            view,
            &mut commands,
        );
        assert_eq!(
            commands,
            vec![Command::TriggerFall {
                reason: FallReason::SnakeSight(SnakeId::new(0))
            }]
        );
        assert_eq!(sight.sightings(), 1);
    }
}
