//! Plain-text rendering of the avatar's floor.

use std::fmt::Write as _;

use medusa_tower_core::{Position, Tile};
use medusa_tower_world::{query, PendingInteraction, World};

fn glyph(tile: Tile) -> char {
    match tile {
        Tile::Floor | Tile::SnakeMarker(..) => '.',
        Tile::Wall => '#',
        Tile::Hole => 'O',
        Tile::InfoMarker(_) => 'i',
        Tile::Elevator => 'E',
        Tile::Move => 'M',
        Tile::Cushion => 'C',
        Tile::ChangeAltar => 'A',
        Tile::PuzzlePiece(_) => 'p',
        Tile::PuzzleSetMarker(_) => 'P',
        Tile::StatueMarker(name) => name.letter().to_ascii_uppercase(),
        Tile::FallenStatue(_) => '%',
        Tile::Medusa => '&',
        Tile::BoxMagic(_) => 'B',
    }
}

/// Draws the floor the avatar stands on, its status line and any open dialog.
pub(crate) fn floor(world: &World) -> String {
    let avatar = query::avatar(world);
    let floor = avatar.position.floor();
    let snakes = query::snake_view(world, floor);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "floor {floor}  position {}  cushion {}",
        avatar.position, avatar.cushion
    );
    if let Some(view) = query::floor_view(world, floor) {
        for (row, tiles) in view.rows().enumerate() {
            for (column, tile) in tiles.iter().enumerate() {
                let here = Position::new(column as u32, row as u32, floor);
                let symbol = if here == avatar.position {
                    '@'
                } else if snakes.iter().any(|snake| snake.position == here) {
                    'S'
                } else {
                    glyph(*tile)
                };
                out.push(symbol);
            }
            out.push('\n');
        }
    }

    match query::pending(world) {
        Some(PendingInteraction::AwaitingAcknowledgment { message, .. }) => {
            let _ = writeln!(out, "> {} [ok]", message.text());
        }
        Some(PendingInteraction::AwaitingMoveTarget) => {
            let _ = writeln!(out, "> Choose a statue to push. [push <statue> <direction>]");
        }
        Some(PendingInteraction::FallDeferred { .. }) | None => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tower_draws_the_first_floor() {
        let world = World::new();
        let drawing = floor(&world);
        let mut lines = drawing.lines();
        assert!(lines.next().expect("status").starts_with("floor 1F"));
        let grid: Vec<&str> = lines.collect();
        assert_eq!(grid.len(), 11);
        assert!(grid.iter().all(|row| row.chars().count() == 11));
        assert_eq!(grid[9].chars().nth(5), Some('@'));
        assert_eq!(grid[3].chars().nth(3), Some('S'));
    }
}
