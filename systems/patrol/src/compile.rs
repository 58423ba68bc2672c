//! Compiles snake markers of a static floor layout into snake definitions.

use std::collections::VecDeque;

use medusa_tower_core::{CellCoord, FloorId, FloorView, SnakeMode, Tile, GRID_HEIGHT, GRID_WIDTH};

/// Snake produced by the compile pass, ready to be installed in the world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnakeDefinition {
    /// Floor the snake patrols.
    pub floor: FloorId,
    /// Motion model of the snake.
    pub mode: SnakeMode,
    /// Ordered patrol path.
    pub path: Vec<CellCoord>,
    /// Index the snake starts at and returns to on respawn.
    pub start_index: usize,
}

/// Flood-fills the snake markers of a floor into one definition per connected component.
///
/// Components are discovered in row-major order. Clock components are ordered
/// by ascending angle around their centroid, which walks them clockwise on a
/// grid whose rows grow downward. Bounce components are ordered top to bottom,
/// then left to right. A start marker inside a component selects its initial
/// index.
#[must_use]
pub fn compile_floor(floor: FloorId, view: FloorView<'_>) -> Vec<SnakeDefinition> {
    let mut visited = vec![false; (GRID_WIDTH * GRID_HEIGHT) as usize];
    let mut definitions = Vec::new();

    for row in 0..GRID_HEIGHT {
        for column in 0..GRID_WIDTH {
            let cell = CellCoord::new(column, row);
            let Some(Tile::SnakeMarker(mode, _)) = view.tile(cell) else {
                continue;
            };
            if visited[index(cell)] {
                continue;
            }

            let (mut path, start) = flood_component(view, cell, mode, &mut visited);
            match mode {
                SnakeMode::Clock => order_clockwise(&mut path),
                SnakeMode::Bounce | SnakeMode::Loop => {
                    path.sort_by_key(|cell| (cell.row(), cell.column()));
                }
            }
            let start_index = start
                .and_then(|start| path.iter().position(|cell| *cell == start))
                .unwrap_or(0);

            log::debug!(
                "compiled {:?} snake on floor {} with {} cells",
                mode,
                floor,
                path.len()
            );
            definitions.push(SnakeDefinition {
                floor,
                mode,
                path,
                start_index,
            });
        }
    }

    definitions
}

fn flood_component(
    view: FloorView<'_>,
    seed: CellCoord,
    mode: SnakeMode,
    visited: &mut [bool],
) -> (Vec<CellCoord>, Option<CellCoord>) {
    let mut frontier = VecDeque::from([seed]);
    visited[index(seed)] = true;
    let mut cells = Vec::new();
    let mut start = None;

    while let Some(cell) = frontier.pop_front() {
        if let Some(Tile::SnakeMarker(_, true)) = view.tile(cell) {
            start = start.or(Some(cell));
        }
        cells.push(cell);

        for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
            let Some(neighbor) = cell.offset(dx, dy) else {
                continue;
            };
            if visited[index(neighbor)] {
                continue;
            }
            if let Some(Tile::SnakeMarker(neighbor_mode, _)) = view.tile(neighbor) {
                if neighbor_mode == mode {
                    visited[index(neighbor)] = true;
                    frontier.push_back(neighbor);
                }
            }
        }
    }

    (cells, start)
}

fn order_clockwise(path: &mut [CellCoord]) {
    if path.is_empty() {
        return;
    }
    let count = path.len() as f64;
    let center_column = path.iter().map(|cell| f64::from(cell.column())).sum::<f64>() / count;
    let center_row = path.iter().map(|cell| f64::from(cell.row())).sum::<f64>() / count;
    let angle = |cell: &CellCoord| {
        (f64::from(cell.row()) - center_row).atan2(f64::from(cell.column()) - center_column)
    };
    path.sort_by(|left, right| {
        angle(left)
            .total_cmp(&angle(right))
            .then_with(|| (left.row(), left.column()).cmp(&(right.row(), right.column())))
    });
}

fn index(cell: CellCoord) -> usize {
    (cell.row() * GRID_WIDTH + cell.column()) as usize
}
