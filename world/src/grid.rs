use std::collections::BTreeMap;

use medusa_tower_core::{CellCoord, FloorId, FloorView, Position, Tile, GRID_HEIGHT, GRID_WIDTH};

use crate::tower::FloorLayout;

/// Live and original tiles of every floor.
#[derive(Clone, Debug, Default)]
pub(crate) struct GridStore {
    floors: BTreeMap<FloorId, FloorGrid>,
}

#[derive(Clone, Debug)]
struct FloorGrid {
    original: Vec<Tile>,
    live: Vec<Tile>,
}

impl GridStore {
    pub(crate) fn from_layouts(layouts: &[FloorLayout]) -> Self {
        let floors = layouts
            .iter()
            .map(|layout| {
                let original = layout.tiles();
                let live = original.clone();
                (layout.floor, FloorGrid { original, live })
            })
            .collect();
        Self { floors }
    }

    /// Floors known to the store, bottom to top.
    pub(crate) fn floors(&self) -> impl Iterator<Item = FloorId> + '_ {
        self.floors.keys().copied()
    }

    pub(crate) fn contains(&self, position: Position) -> bool {
        self.floors.contains_key(&position.floor()) && index(position.cell()).is_some()
    }

    /// Returns the live tile, or `None` when the position lies outside the tower.
    pub(crate) fn tile(&self, position: Position) -> Option<Tile> {
        let grid = self.floors.get(&position.floor())?;
        grid.live.get(index(position.cell())?).copied()
    }

    pub(crate) fn original_tile(&self, position: Position) -> Option<Tile> {
        let grid = self.floors.get(&position.floor())?;
        grid.original.get(index(position.cell())?).copied()
    }

    /// Overwrites a live tile. Returns `false` for positions outside the tower.
    pub(crate) fn set_tile(&mut self, position: Position, tile: Tile) -> bool {
        let Some(slot) = index(position.cell()).and_then(|index| {
            self.floors
                .get_mut(&position.floor())
                .and_then(|grid| grid.live.get_mut(index))
        }) else {
            return false;
        };
        *slot = tile;
        true
    }

    /// Restores the floor's live tiles to its original layout.
    pub(crate) fn reset_floor(&mut self, floor: FloorId) -> bool {
        match self.floors.get_mut(&floor) {
            Some(grid) => {
                grid.live.clone_from(&grid.original);
                true
            }
            None => false,
        }
    }

    pub(crate) fn view(&self, floor: FloorId) -> Option<FloorView<'_>> {
        self.floors
            .get(&floor)
            .map(|grid| FloorView::new(floor, &grid.live))
    }

    pub(crate) fn original_view(&self, floor: FloorId) -> Option<FloorView<'_>> {
        self.floors
            .get(&floor)
            .map(|grid| FloorView::new(floor, &grid.original))
    }

    /// Cells of a floor holding a tile that satisfies the predicate, in row-major order.
    pub(crate) fn find(&self, floor: FloorId, predicate: impl Fn(Tile) -> bool) -> Vec<Position> {
        let Some(grid) = self.floors.get(&floor) else {
            return Vec::new();
        };
        grid.live
            .iter()
            .enumerate()
            .filter(|(_, tile)| predicate(**tile))
            .filter_map(|(index, _)| cell_at(index).map(|cell| Position::at(cell, floor)))
            .collect()
    }
}

fn index(cell: CellCoord) -> Option<usize> {
    if cell.in_bounds() {
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(GRID_WIDTH).ok()?;
        Some(row * width + column)
    } else {
        None
    }
}

fn cell_at(index: usize) -> Option<CellCoord> {
    let index = u32::try_from(index).ok()?;
    let cell = CellCoord::new(index % GRID_WIDTH, index / GRID_WIDTH);
    (cell.row() < GRID_HEIGHT).then_some(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tower::Tower;
    use medusa_tower_core::{InfoKind, SpellKind};

    fn store() -> GridStore {
        GridStore::from_layouts(&Tower::canonical().layouts)
    }

    #[test]
    fn set_tile_is_read_back_on_every_floor() {
        let mut grid = store();
        let floors: Vec<FloorId> = grid.floors().collect();
        assert_eq!(floors, FloorId::ALL.to_vec());

        for floor in floors {
            for row in 0..GRID_HEIGHT {
                for column in 0..GRID_WIDTH {
                    let position = Position::new(column, row, floor);
                    let tile = Tile::InfoMarker(InfoKind::Hint);
                    assert!(grid.set_tile(position, tile));
                    assert_eq!(grid.tile(position), Some(tile), "{position}");
                }
            }
        }
    }

    #[test]
    fn reset_restores_exact_original_layout() {
        let mut grid = store();
        let floor = FloorId::new(2);
        let before: Vec<Tile> = grid
            .view(floor)
            .expect("floor")
            .rows()
            .flatten()
            .copied()
            .collect();

        assert!(grid.set_tile(Position::new(7, 9, floor), Tile::Floor));
        assert!(grid.set_tile(Position::new(1, 1, floor), Tile::Hole));
        assert!(grid.set_tile(Position::new(1, 1, floor), Tile::BoxMagic(SpellKind::Change)));
        assert!(grid.reset_floor(floor));
        assert!(grid.reset_floor(floor), "restoring twice is harmless");

        let after: Vec<Tile> = grid
            .view(floor)
            .expect("floor")
            .rows()
            .flatten()
            .copied()
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn out_of_range_positions_are_absent() {
        let mut grid = store();
        let outside = Position::new(11, 0, FloorId::new(1));
        assert_eq!(grid.tile(outside), None);
        assert!(!grid.set_tile(outside, Tile::Wall));
        assert_eq!(grid.tile(Position::new(0, 0, FloorId::new(9))), None);
        assert!(!grid.reset_floor(FloorId::new(9)));
        assert!(!grid.contains(outside));
    }

    #[test]
    fn find_reports_matching_cells_in_reading_order() {
        let grid = store();
        let holes = grid.find(FloorId::new(1), |tile| tile == Tile::Hole);
        assert_eq!(
            holes,
            vec![
                Position::new(3, 6, FloorId::new(1)),
                Position::new(4, 6, FloorId::new(1))
            ]
        );
    }
}
