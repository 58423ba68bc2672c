//! Static tower data: floor layouts, puzzle catalogue and physics rule tables.
//!
//! The layout legend below is the only place that knows about characters; the
//! rest of the engine works with [`Tile`] values.

use std::collections::BTreeMap;

use medusa_tower_core::{
    CellCoord, Direction, FloorId, InfoKind, PieceId, Position, SetId, SnakeMode, SpellKind,
    StatueName, Tile, GRID_HEIGHT, GRID_WIDTH,
};

/// Static layout of a single floor.
#[derive(Clone, Debug)]
pub struct FloorLayout {
    /// Floor described by the layout.
    pub floor: FloorId,
    /// Eleven rows of eleven legend characters.
    pub rows: [&'static str; 11],
    /// Cell the avatar respawns at until it legitimately arrives elsewhere.
    pub arrival: CellCoord,
    /// Contents of the floor's magic boxes in reading order.
    pub boxes: &'static [SpellKind],
}

impl FloorLayout {
    /// Decodes the layout into row-major tiles.
    ///
    /// Unknown characters and missing cells decode as [`Tile::Floor`].
    #[must_use]
    pub fn tiles(&self) -> Vec<Tile> {
        let mut tiles = Vec::with_capacity((GRID_WIDTH * GRID_HEIGHT) as usize);
        let mut boxes = self.boxes.iter().copied();
        for row in self.rows {
            let mut chars = row.chars();
            for _ in 0..GRID_WIDTH {
                let tile = match chars.next() {
                    Some(symbol) => decode(symbol, self.floor, &mut boxes),
                    None => Tile::Floor,
                };
                tiles.push(tile);
            }
        }
        tiles
    }
}

fn decode(symbol: char, floor: FloorId, boxes: &mut impl Iterator<Item = SpellKind>) -> Tile {
    match symbol {
        '#' => Tile::Wall,
        'O' => Tile::Hole,
        '?' => Tile::InfoMarker(InfoKind::Hint),
        '!' => Tile::InfoMarker(InfoKind::Warning),
        'E' => Tile::Elevator,
        'M' => Tile::Move,
        'C' => Tile::Cushion,
        'A' => Tile::ChangeAltar,
        'Z' => Tile::Medusa,
        'P' => Tile::PuzzleSetMarker(SetId::new(floor.get())),
        '1'..='9' => {
            let digit = symbol.to_digit(10).unwrap_or(0) as u16;
            Tile::PuzzlePiece(PieceId::new(u16::from(floor.get()) * 10 + digit))
        }
        '%' => boxes.next().map_or(Tile::Floor, Tile::BoxMagic),
        '~' => Tile::SnakeMarker(SnakeMode::Bounce, false),
        '@' => Tile::SnakeMarker(SnakeMode::Bounce, true),
        '*' => Tile::SnakeMarker(SnakeMode::Clock, false),
        '&' => Tile::SnakeMarker(SnakeMode::Clock, true),
        letter => StatueName::new(letter).map_or(Tile::Floor, Tile::StatueMarker),
    }
}

/// Static definition of a puzzle piece.
#[derive(Clone, Copy, Debug)]
pub struct PieceDefinition {
    /// Piece identifier.
    pub id: PieceId,
    /// Image shown by the puzzle collaborator.
    pub image: &'static str,
    /// Answers accepted after normalization.
    pub answers: &'static [&'static str],
}

/// Static definition of a puzzle set.
#[derive(Clone, Copy, Debug)]
pub struct PuzzleSetDefinition {
    /// Set identifier.
    pub id: SetId,
    /// Title shown by the puzzle collaborator.
    pub title: &'static str,
    /// Whether the set unlocks only once every piece is obtained.
    pub whole_set: bool,
    /// Pieces belonging to the set.
    pub pieces: &'static [PieceDefinition],
}

/// Two instances of one statue name that are always pushed together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkedPair {
    /// Shared name of the pair.
    pub name: StatueName,
    /// Floors the two instances start on.
    pub floors: [FloorId; 2],
}

/// Physics and change-state rule tables.
#[derive(Clone, Debug)]
pub struct TowerRules {
    /// Legal cumulative elevator increments per floor; absent floors allow only `0`.
    pub increment_allow_lists: BTreeMap<FloorId, Vec<u32>>,
    /// Floor whose push vectors are rotated.
    pub rotated_floor: Option<FloorId>,
    /// Statue pair exempt from the moved-once rule.
    pub linked_pair: Option<LinkedPair>,
    /// Statues that may only be pushed in one direction.
    pub restrictions: Vec<(StatueName, Direction)>,
    /// Redirect entries installed at start-up and by the cushion spell.
    pub default_redirects: Vec<(Position, Position)>,
}

impl TowerRules {
    /// Rule tables of the canonical tower.
    #[must_use]
    pub fn canonical() -> Self {
        let floor = FloorId::new;
        let name = |letter| StatueName::new(letter);
        let mut restrictions = Vec::new();
        if let Some(k) = name('k') {
            restrictions.push((k, Direction::West));
        }
        if let Some(m) = name('m') {
            restrictions.push((m, Direction::South));
        }

        Self {
            increment_allow_lists: BTreeMap::from([
                (floor(3), vec![0, 1, 2]),
                (floor(6), vec![0, 1]),
            ]),
            rotated_floor: Some(floor(2)),
            linked_pair: name('m').map(|name| LinkedPair {
                name,
                floors: [floor(4), floor(5)],
            }),
            restrictions,
            default_redirects: vec![
                (Position::new(5, 2, floor(6)), Position::new(0, 9, floor(5))),
                (Position::new(8, 4, floor(4)), Position::new(8, 4, floor(3))),
                (Position::new(2, 8, floor(3)), Position::new(7, 7, floor(0))),
            ],
        }
    }

    /// Allowed cumulative increments of a floor's elevator.
    #[must_use]
    pub fn increment_allow_list(&self, floor: FloorId) -> &[u32] {
        self.increment_allow_lists
            .get(&floor)
            .map_or(&[0], Vec::as_slice)
    }

    /// Direction a statue is restricted to, if any.
    #[must_use]
    pub fn restriction(&self, name: StatueName) -> Option<Direction> {
        self.restrictions
            .iter()
            .find(|(restricted, _)| *restricted == name)
            .map(|(_, direction)| *direction)
    }

    /// Reports whether the name belongs to the linked pair.
    #[must_use]
    pub fn is_linked(&self, name: StatueName) -> bool {
        self.linked_pair.is_some_and(|pair| pair.name == name)
    }

    /// Column and row offsets of a push on the provided floor.
    ///
    /// The rotated floor swaps north with south and east with west.
    #[must_use]
    pub fn push_vector(&self, floor: FloorId, direction: Direction) -> (i32, i32) {
        if self.rotated_floor == Some(floor) {
            direction.opposite().delta()
        } else {
            direction.delta()
        }
    }
}

/// Complete static description of a tower.
#[derive(Clone, Debug)]
pub struct Tower {
    /// Layout of every floor.
    pub layouts: Vec<FloorLayout>,
    /// Puzzle catalogue.
    pub puzzle_sets: Vec<PuzzleSetDefinition>,
    /// Physics and change-state rules.
    pub rules: TowerRules,
    /// Position the avatar starts at.
    pub start: Position,
}

impl Tower {
    /// The seven-floor tower shipped with the game.
    #[must_use]
    pub fn canonical() -> Self {
        Self {
            layouts: canonical_layouts(),
            puzzle_sets: CANONICAL_PUZZLE_SETS.to_vec(),
            rules: TowerRules::canonical(),
            start: Position::new(5, 9, FloorId::new(1)),
        }
    }

    /// Builds a tower from custom layouts sharing the canonical rules and puzzles.
    ///
    /// The avatar starts at the arrival cell of the first layout.
    #[must_use]
    pub fn with_layouts(layouts: Vec<FloorLayout>) -> Self {
        let start = layouts.first().map_or_else(
            || Position::new(5, 5, FloorId::new(1)),
            |layout| Position::at(layout.arrival, layout.floor),
        );
        Self {
            layouts,
            puzzle_sets: CANONICAL_PUZZLE_SETS.to_vec(),
            rules: TowerRules::canonical(),
            start,
        }
    }
}

const CANONICAL_PUZZLE_SETS: [PuzzleSetDefinition; 2] = [
    PuzzleSetDefinition {
        id: SetId::new(2),
        title: "Mirror riddles",
        whole_set: false,
        pieces: &[
            PieceDefinition {
                id: PieceId::new(21),
                image: "pieces/21.png",
                answers: &["reflection", "mirror"],
            },
            PieceDefinition {
                id: PieceId::new(22),
                image: "pieces/22.png",
                answers: &["echo"],
            },
        ],
    },
    PuzzleSetDefinition {
        id: SetId::new(5),
        title: "Serpent riddles",
        whole_set: true,
        pieces: &[
            PieceDefinition {
                id: PieceId::new(51),
                image: "pieces/51.png",
                answers: &["scale"],
            },
            PieceDefinition {
                id: PieceId::new(52),
                image: "pieces/52.png",
                answers: &["fang"],
            },
            PieceDefinition {
                id: PieceId::new(53),
                image: "pieces/53.png",
                answers: &["coil"],
            },
        ],
    },
];

fn canonical_layouts() -> Vec<FloorLayout> {
    let floor = FloorId::new;
    vec![
        FloorLayout {
            floor: floor(0),
            rows: [
                "###########",
                "#.........#",
                "#..?......#",
                "#.........#",
                "#.........#",
                "#....E....#",
                "#.........#",
                "#.A.......#",
                "#.........#",
                "#.........#",
                "###########",
            ],
            arrival: CellCoord::new(5, 5),
            boxes: &[],
        },
        FloorLayout {
            floor: floor(1),
            rows: [
                "###########",
                "#...#E#..%#",
                "#...#.#...#",
                "#~~@#.#...#",
                "##.##.##.##",
                "#.........#",
                "#..OO...C.#",
                "#.....?...#",
                "#.A.......#",
                "#.........#",
                "###########",
            ],
            arrival: CellCoord::new(5, 9),
            boxes: &[SpellKind::Cushion],
        },
        FloorLayout {
            floor: floor(2),
            rows: [
                "###########",
                "#....E....#",
                "#.........#",
                "#.*&*.....#",
                "#.*.*..a..#",
                "#.***.....#",
                "#.........#",
                "#..1...2..#",
                "#.........#",
                "#..P...%..#",
                "###########",
            ],
            arrival: CellCoord::new(5, 1),
            boxes: &[SpellKind::Move],
        },
        FloorLayout {
            floor: floor(3),
            rows: [
                "###########",
                "#.........#",
                "#..?......#",
                "#.........#",
                "#.........#",
                "#.b..E..A.#",
                "#.........#",
                "#......M..#",
                "#.O.......#",
                "#.........#",
                "###########",
            ],
            arrival: CellCoord::new(5, 5),
            boxes: &[],
        },
        FloorLayout {
            floor: floor(4),
            rows: [
                "###########",
                "#.........#",
                "#..m......#",
                "#.........#",
                "#.......O.#",
                "#.........#",
                "#.A.....k.#",
                "#.........#",
                "#..M......#",
                "#....E....#",
                "###########",
            ],
            arrival: CellCoord::new(5, 9),
            boxes: &[],
        },
        FloorLayout {
            floor: floor(5),
            rows: [
                "###########",
                "#.........#",
                "#......m..#",
                "#.........#",
                "#..!......#",
                "#......O..#",
                "#.1.2.3...#",
                "~.........#",
                "~....P....#",
                "@#...E....#",
                "###########",
            ],
            arrival: CellCoord::new(5, 9),
            boxes: &[],
        },
        FloorLayout {
            floor: floor(6),
            rows: [
                "###########",
                "#........Z#",
                "#....O....#",
                "#.........#",
                "#.........#",
                "#.........#",
                "#....n....#",
                "#..A......#",
                "#.........#",
                "#.M..E..%.#",
                "###########",
            ],
            arrival: CellCoord::new(5, 9),
            boxes: &[SpellKind::Elevator],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_layouts_are_eleven_by_eleven() {
        for layout in canonical_layouts() {
            for row in layout.rows {
                assert_eq!(row.chars().count(), 11, "floor {} row {row:?}", layout.floor);
            }
            assert_eq!(layout.tiles().len(), 121);
        }
    }

    #[test]
    fn legend_decodes_special_tiles() {
        let layouts = canonical_layouts();
        let second = &layouts[2];
        let tiles = second.tiles();
        let at = |column: u32, row: u32| tiles[(row * GRID_WIDTH + column) as usize];

        assert_eq!(at(5, 1), Tile::Elevator);
        assert_eq!(at(3, 7), Tile::PuzzlePiece(PieceId::new(21)));
        assert_eq!(at(3, 9), Tile::PuzzleSetMarker(SetId::new(2)));
        assert_eq!(at(7, 9), Tile::BoxMagic(SpellKind::Move));
        assert_eq!(at(3, 3), Tile::SnakeMarker(SnakeMode::Clock, true));
        assert_eq!(
            at(7, 4),
            Tile::StatueMarker(StatueName::new('a').expect("letter"))
        );
    }

    #[test]
    fn rotated_floor_swaps_push_vectors() {
        let rules = TowerRules::canonical();
        assert_eq!(rules.push_vector(FloorId::new(6), Direction::North), (0, -1));
        assert_eq!(rules.push_vector(FloorId::new(2), Direction::North), (0, 1));
        assert_eq!(rules.push_vector(FloorId::new(2), Direction::East), (-1, 0));
    }

    #[test]
    fn floors_without_allow_list_accept_only_zero() {
        let rules = TowerRules::canonical();
        assert_eq!(rules.increment_allow_list(FloorId::new(3)), &[0, 1, 2]);
        assert_eq!(rules.increment_allow_list(FloorId::new(1)), &[0]);
    }
}
