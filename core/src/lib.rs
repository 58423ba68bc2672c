#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Medusa Tower engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod save;

pub use save::{
    AvatarRecord, ChangeStateRecord, CushionRecord, ElevatorRecord, ModifierRecord, PieceRecord,
    PuzzleRecord, RedirectRecord, SaveSnapshot, SetRecord, StatueRecord, SAVE_VERSION,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Medusa Tower.";

/// Number of tile columns on every floor.
pub const GRID_WIDTH: u32 = 11;

/// Number of tile rows on every floor.
pub const GRID_HEIGHT: u32 = 11;

/// Folds typed words into the form keyword tables are written in.
///
/// Full-width ASCII variants are mapped to their half-width forms, every
/// whitespace character (including the ideographic space) is removed, and the
/// result is lowercased.
#[must_use]
pub fn normalize_words(text: &str) -> String {
    text.chars()
        .filter_map(|ch| {
            let folded = match u32::from(ch) {
                code @ 0xFF01..=0xFF5E => char::from_u32(code - 0xFEE0).unwrap_or(ch),
                _ => ch,
            };
            (!folded.is_whitespace()).then_some(folded)
        })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Movement intent produced by the input collaborator.
    MoveAvatar {
        /// Horizontal component in `-1..=1`.
        dx: i8,
        /// Vertical component in `-1..=1`.
        dy: i8,
    },
    /// Action-button intent: interact with the tile in front of or under the avatar.
    Interact,
    /// Dismisses the dialog that is currently open.
    Acknowledge,
    /// Relocates the avatar and records the destination as the floor's arrival point.
    Teleport {
        /// Cell and floor the avatar should occupy.
        destination: Position,
    },
    /// Advances snakes by one tick of their patrol.
    StepSnakes {
        /// Restricts stepping to snakes sharing the avatar's floor.
        only_current_floor: bool,
    },
    /// Starts the avatar's death path.
    TriggerFall {
        /// Cause reported to the player.
        reason: FallReason,
    },
    /// Pushes every eligible statue carrying the provided name.
    PushStatue {
        /// Name of the statue(s) to push.
        name: StatueName,
        /// Cardinal direction requested by the player.
        direction: Direction,
    },
    /// Applies a validated change spell to the change-state registry.
    ApplyChange {
        /// Floor the change was cast on.
        floor: FloorId,
        /// Change requested by the player.
        request: ChangeRequest,
        /// Registry scope receiving the modifier.
        scope: ModifierScope,
    },
    /// Grants cushion protection and repopulates the default redirect entries.
    GrantCushion {
        /// Number of protected steps.
        steps: u32,
    },
    /// Opens the statue selection dialog that follows a successful move spell.
    OpenMoveDialog,
    /// Submits an answer for a puzzle piece.
    AnswerPuzzle {
        /// Piece being answered.
        piece: PieceId,
        /// Raw answer text typed by the player.
        answer: String,
    },
    /// Overwrites a single tile of a floor's live grid.
    SetTile {
        /// Location of the tile.
        position: Position,
        /// Replacement tile.
        tile: Tile,
    },
    /// Restores a floor's live grid to its original layout.
    ResetFloor {
        /// Floor to reset.
        floor: FloorId,
    },
    /// Adds or replaces an entry of the statue redirect table.
    RegisterRedirect {
        /// Hole cell the statue falls through.
        from: Position,
        /// Cell the statue lands on.
        to: Position,
    },
    /// Opens a blocking message dialog.
    ShowMessage {
        /// Message to present.
        message: Message,
    },
    /// Replaces the mutable world state with a previously captured snapshot.
    RestoreSnapshot {
        /// Snapshot to restore.
        snapshot: Box<SaveSnapshot>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the avatar moved between two cells of the same floor.
    AvatarMoved {
        /// Position before the move.
        from: Position,
        /// Position after the move.
        to: Position,
        /// Facing after the move.
        facing: Facing,
    },
    /// Reports that a movement intent did not change the avatar's cell.
    MoveRejected {
        /// Facing adopted by the avatar despite the rejection.
        facing: Facing,
        /// Reason the move did not happen.
        reason: ActionError,
    },
    /// Announces that the avatar now stands on another floor.
    FloorChanged {
        /// Floor the avatar left.
        from: FloorId,
        /// Floor the avatar entered.
        to: FloorId,
    },
    /// Reports the avatar's position after a respawn.
    AvatarRespawned {
        /// Position the avatar respawned at.
        position: Position,
    },
    /// Reports the new cell of every snake that stepped.
    SnakesAdvanced {
        /// Snake positions after the step, ordered by identifier.
        snakes: Vec<SnakeStep>,
    },
    /// Reports that a falling statue destroyed a snake.
    SnakeKilled {
        /// Identifier of the destroyed snake.
        snake: SnakeId,
        /// Cell the snake occupied.
        position: Position,
    },
    /// Reports that a statue changed position or flags.
    StatueStateChanged {
        /// Statue that changed.
        statue: StatueId,
        /// Position the statue now occupies.
        position: Position,
        /// Flags after the change.
        state: StatueState,
    },
    /// Reports that a puzzle piece or set changed its unlock state.
    PuzzleStateChanged {
        /// Piece that was solved.
        piece: PieceId,
        /// Set the piece belongs to.
        set: SetId,
        /// Whether the set is now unlocked.
        set_unlocked: bool,
    },
    /// Asks the puzzle collaborator to collect an answer for a piece.
    PuzzlePrompted {
        /// Piece awaiting an answer.
        piece: PieceId,
    },
    /// Reports that the player inspected a puzzle set marker.
    PuzzleSetViewed {
        /// Set the marker belongs to.
        set: SetId,
    },
    /// Reports that a spell became available.
    MagicUnlocked {
        /// Spell that was unlocked.
        spell: SpellKind,
    },
    /// Announces that a dialog opened and blocks further input.
    MessageShown {
        /// Message presented by the dialog.
        message: Message,
    },
    /// Announces that a dialog request arrived while another dialog was open.
    MessageQueued {
        /// Message waiting behind the open dialog.
        message: Message,
    },
    /// Announces that the open dialog was dismissed.
    MessageClosed,
    /// Reports that a floor's live grid was restored to its original layout.
    FloorReset {
        /// Floor that was reset.
        floor: FloorId,
    },
    /// Reports that a tile of the live grid changed outside of a floor reset.
    TileChanged {
        /// Location of the tile.
        position: Position,
        /// Tile now stored at the location.
        tile: Tile,
    },
    /// Reports that the change-state registry was mutated.
    ChangeStateChanged {
        /// Spell whose behaviour changed.
        spell: SpellKind,
        /// Scope that received the change.
        scope: ModifierScope,
    },
    /// Reports that the avatar gained cushion protection.
    CushionGranted {
        /// Protected steps now available.
        steps: u32,
    },
    /// Asks the move collaborator to collect a statue name and direction.
    MoveDialogOpened,
    /// Reports that a command was refused without changing state.
    ActionRejected {
        /// Reason the command was refused.
        error: ActionError,
    },
    /// Announces that a snapshot replaced the mutable world state.
    SnapshotRestored,
}

/// Reasons recorded when a world mutation or a spell is refused.
///
/// Every variant is recoverable. [`ActionError::is_user_visible`] separates the
/// rejections that surface as a dialog from the ones that stay silent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum ActionError {
    /// Target cell lies outside the grid.
    #[error("the way is out of reach")]
    OutOfBounds,
    /// Target cell is obstructed.
    #[error("nothing happens")]
    Blocked,
    /// Change spell outside the floor's allow-list.
    #[error("the altar refuses that change")]
    InvalidChangeRequest,
    /// Incantation not recognised at all.
    #[error("the words have no power")]
    WrongIncantation,
    /// Recognised incantation cast away from its circle.
    #[error("cast it on the right circle")]
    WrongLocation,
    /// Correct incantation and circle, but the change state differs.
    #[error("the circle stirs, but its state is not right for those words")]
    StateMismatch,
    /// Known incantation that this circle does not answer to in its current state.
    #[error("the circle answers to different words")]
    MisplacedIncantation,
    /// Statue would fall through a hole with nowhere to land.
    #[error("the statue cannot be moved")]
    UnresolvableFall,
    /// Statue already used its single push.
    #[error("the statue will not move again")]
    AlreadyMoved,
    /// Statue can only be pushed in another direction.
    #[error("the statue does not budge that way")]
    DirectionRestricted,
    /// Move option forbids targeting the named statue from here.
    #[error("that statue is beyond the reach of this spell")]
    TargetRestricted,
    /// No statue answers to the provided name.
    #[error("no such statue")]
    UnknownStatue,
    /// Spell has not been unlocked yet.
    #[error("you do not know this magic yet")]
    AbilityLocked,
    /// Puzzle answer was not accepted.
    #[error("that is not the answer")]
    WrongAnswer,
    /// Action button pressed with nothing to interact with.
    #[error("there is nothing here")]
    NothingToInteract,
}

impl ActionError {
    /// Reports whether the rejection should open a dialog.
    #[must_use]
    pub const fn is_user_visible(self) -> bool {
        !matches!(
            self,
            Self::OutOfBounds | Self::Blocked | Self::NothingToInteract
        )
    }
}

/// Messages presented by the blocking dialog collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// The avatar died.
    Fell(FallReason),
    /// An action was refused.
    Rejected(ActionError),
    /// An info marker was read.
    Info(InfoKind),
    /// A puzzle piece was solved.
    PuzzleSolved(PieceId),
    /// A spell was unlocked from a magic box.
    MagicUnlocked(SpellKind),
}

impl Message {
    /// Player-facing text of the message.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Fell(FallReason::Hole) => "You fell into the hole.".to_owned(),
            Self::Fell(FallReason::SnakeSight(_)) => "The snake spotted you.".to_owned(),
            Self::Fell(FallReason::StatueCrush(_)) => {
                "You were crushed by a falling statue.".to_owned()
            }
            Self::Rejected(error) => {
                let mut text = error.to_string();
                if let Some(first) = text.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                text.push('.');
                text
            }
            Self::Info(InfoKind::Hint) => "Words carved here hint at the way forward.".to_owned(),
            Self::Info(InfoKind::Warning) => "Beware the gaze that turns to stone.".to_owned(),
            Self::PuzzleSolved(piece) => format!("Puzzle piece {} obtained.", piece.get()),
            Self::MagicUnlocked(spell) => format!("You learned the {spell} magic."),
        }
    }
}

/// Causes of the avatar's death path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FallReason {
    /// Stepped into a hole without cushion protection.
    Hole,
    /// Seen by a snake.
    SnakeSight(SnakeId),
    /// Crushed by a falling statue.
    StatueCrush(StatueId),
}

/// Identifier of a floor. Floor `0` lies below ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FloorId(u8);

impl FloorId {
    /// Every floor of the tower, bottom to top.
    pub const ALL: [FloorId; 7] = [
        FloorId(0),
        FloorId(1),
        FloorId(2),
        FloorId(3),
        FloorId(4),
        FloorId(5),
        FloorId(6),
    ];

    /// Creates a new floor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for FloorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            write!(f, "B1")
        } else {
            write!(f, "{}F", self.0)
        }
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Reports whether the cell lies inside the 11×11 grid.
    #[must_use]
    pub const fn in_bounds(&self) -> bool {
        self.column < GRID_WIDTH && self.row < GRID_HEIGHT
    }

    /// Returns the cell displaced by the provided offsets, if it stays inside the grid.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<CellCoord> {
        let column = i64::from(self.column) + i64::from(dx);
        let row = i64::from(self.row) + i64::from(dy);
        if column < 0 || row < 0 {
            return None;
        }
        let cell = CellCoord::new(u32::try_from(column).ok()?, u32::try_from(row).ok()?);
        cell.in_bounds().then_some(cell)
    }
}

/// Cell on a specific floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    floor: FloorId,
    cell: CellCoord,
}

impl Position {
    /// Creates a position from column, row and floor.
    #[must_use]
    pub const fn new(column: u32, row: u32, floor: FloorId) -> Self {
        Self {
            floor,
            cell: CellCoord::new(column, row),
        }
    }

    /// Creates a position from a cell and a floor.
    #[must_use]
    pub const fn at(cell: CellCoord, floor: FloorId) -> Self {
        Self { floor, cell }
    }

    /// Floor of the position.
    #[must_use]
    pub const fn floor(&self) -> FloorId {
        self.floor
    }

    /// Cell of the position.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{})",
            self.cell.column(),
            self.cell.row(),
            self.floor.get()
        )
    }
}

/// Cardinal directions used for statue pushes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing row indices.
    North,
    /// Toward increasing column indices.
    East,
    /// Toward increasing row indices.
    South,
    /// Toward decreasing column indices.
    West,
}

impl Direction {
    /// Standard column and row offsets of the direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }
}

/// Error returned when a direction name cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown direction '{0}'")]
pub struct ParseDirectionError(String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "n" | "north" | "up" => Ok(Self::North),
            "e" | "east" | "right" => Ok(Self::East),
            "s" | "south" | "down" => Ok(Self::South),
            "w" | "west" | "left" => Ok(Self::West),
            _ => Err(ParseDirectionError(value.to_owned())),
        }
    }
}

/// Direction the avatar sprite faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Facing increasing rows.
    Down,
    /// Facing decreasing rows.
    Up,
    /// Facing decreasing columns.
    Left,
    /// Facing increasing columns.
    Right,
}

impl Facing {
    /// Derives the facing from a movement intent.
    ///
    /// The vertical axis wins ties, so a diagonal intent faces up or down.
    #[must_use]
    pub fn from_intent(dx: i8, dy: i8) -> Option<Self> {
        if dy != 0 && dy.unsigned_abs() >= dx.unsigned_abs() {
            Some(if dy > 0 { Self::Down } else { Self::Up })
        } else if dx != 0 {
            Some(if dx > 0 { Self::Right } else { Self::Left })
        } else {
            None
        }
    }

    /// Column and row offsets of the cell in front of the avatar.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Down => (0, 1),
            Self::Up => (0, -1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

/// Magic kinds. Each kind is both a castable spell and a magic box content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpellKind {
    /// Teleports between floors.
    Elevator,
    /// Pushes statues.
    Move,
    /// Protects the avatar from holes.
    Cushion,
    /// Alters the behaviour of the other spells.
    Change,
}

impl fmt::Display for SpellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Elevator => "elevator",
            Self::Move => "move",
            Self::Cushion => "cushion",
            Self::Change => "change",
        };
        f.write_str(name)
    }
}

/// Kinds of info markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfoKind {
    /// Puzzle hint.
    Hint,
    /// Danger warning.
    Warning,
}

/// Motion models available to snakes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnakeMode {
    /// Reverses at both ends of the path.
    Bounce,
    /// Wraps from the last index back to the first.
    Loop,
    /// Wraps like [`SnakeMode::Loop`] around a path ordered clockwise.
    Clock,
}

/// Name key shared by statues, stored as a lowercase ASCII letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatueName(u8);

impl StatueName {
    /// Creates a statue name from a lowercase ASCII letter.
    #[must_use]
    pub fn new(letter: char) -> Option<Self> {
        letter
            .is_ascii_lowercase()
            .then(|| Self(letter as u8))
    }

    /// Letter identifying the statue.
    #[must_use]
    pub const fn letter(&self) -> char {
        self.0 as char
    }
}

impl fmt::Display for StatueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "statue_{}", self.letter())
    }
}

/// Error returned when a statue name cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown statue name '{0}'")]
pub struct ParseStatueNameError(String);

impl FromStr for StatueName {
    type Err = ParseStatueNameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim().to_ascii_lowercase();
        let key = trimmed.strip_prefix("statue_").unwrap_or(&trimmed);
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => {
                Self::new(letter).ok_or_else(|| ParseStatueNameError(value.to_owned()))
            }
            _ => Err(ParseStatueNameError(value.to_owned())),
        }
    }
}

/// Tile values stored in every floor grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    /// Plain walkable floor.
    Floor,
    /// Impassable wall.
    Wall,
    /// Hole the avatar and statues fall through.
    Hole,
    /// Readable marker.
    InfoMarker(InfoKind),
    /// Circle the elevator spell is cast on.
    Elevator,
    /// Circle the move spell is cast on.
    Move,
    /// Circle the cushion spell is cast on.
    Cushion,
    /// Altar the change spell is cast on.
    ChangeAltar,
    /// Collectable puzzle piece.
    PuzzlePiece(PieceId),
    /// Marker displaying a puzzle set.
    PuzzleSetMarker(SetId),
    /// Standing statue.
    StatueMarker(StatueName),
    /// Walkable snake path cell from the static layout.
    SnakeMarker(SnakeMode, bool),
    /// Stone gazer blocking the way.
    Medusa,
    /// Box that teaches a spell.
    BoxMagic(SpellKind),
    /// Statue that fell through a hole and broke.
    FallenStatue(StatueName),
}

impl Tile {
    /// Reports whether the avatar may enter the tile.
    #[must_use]
    pub const fn is_walkable(&self) -> bool {
        !matches!(
            self,
            Self::Wall | Self::Medusa | Self::StatueMarker(_) | Self::FallenStatue(_)
        )
    }

    /// Reports whether the tile holds a statue, standing or fallen.
    #[must_use]
    pub const fn is_statue(&self) -> bool {
        matches!(self, Self::StatueMarker(_) | Self::FallenStatue(_))
    }

    /// Reports whether the tile interrupts a snake's line of sight.
    #[must_use]
    pub const fn blocks_sight(&self) -> bool {
        matches!(
            self,
            Self::Wall | Self::Medusa | Self::StatueMarker(_) | Self::FallenStatue(_)
        )
    }
}

/// Unique identifier assigned to a snake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnakeId(u32);

impl SnakeId {
    /// Creates a new snake identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a statue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatueId(u32);

impl StatueId {
    /// Creates a new statue identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a puzzle piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(u16);

impl PieceId {
    /// Creates a new piece identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Unique identifier assigned to a puzzle set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SetId(u8);

impl SetId {
    /// Creates a new set identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Travel direction of a floor's elevator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElevatorDirection {
    /// Default direction.
    #[default]
    Up,
    /// Inverted direction.
    Down,
}

impl ElevatorDirection {
    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// Per-floor elevator change state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElevatorConfig {
    /// Cumulative increment applied by change spells.
    pub increment: u32,
    /// Current travel direction.
    pub direction: ElevatorDirection,
}

impl ElevatorConfig {
    /// Reports whether the config behaves like an absent entry.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Option restricting which statue instances the move spell may target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetOption {
    /// Only instances on the avatar's floor.
    Same,
    /// Only instances on other floors.
    Different,
}

/// Modifier record altering the behaviour of a spell.
///
/// A record carries both modifier kinds: a non-zero `increase` is an
/// accumulated numeric increase, `inverted` is the meaning inversion toggle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifier {
    /// Accumulated numeric increase.
    pub increase: u32,
    /// Whether the spell's meaning is inverted.
    pub inverted: bool,
    /// Optional target restriction.
    pub option: Option<TargetOption>,
}

/// Registry scope a modifier lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModifierScope {
    /// Applies on every floor unless a floor record overrides it.
    Global,
    /// Applies on a single floor.
    Floor(FloorId),
}

/// Effect requested by a change spell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeEffect {
    /// Numeric increase by the provided amount.
    Increase(u8),
    /// Meaning inversion toggle.
    Invert,
    /// Target option for the move spell.
    Restrict(TargetOption),
}

/// Change requested by the player at an altar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// Spell whose behaviour should change.
    pub target: SpellKind,
    /// Effect applied to the spell.
    pub effect: ChangeEffect,
}

impl ChangeRequest {
    /// Creates a new change request.
    #[must_use]
    pub const fn new(target: SpellKind, effect: ChangeEffect) -> Self {
        Self { target, effect }
    }
}

/// New cell of a snake after stepping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SnakeStep {
    /// Snake that stepped.
    pub snake: SnakeId,
    /// Position after the step.
    pub position: Position,
}

/// Flags describing a statue's lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatueState {
    /// Statue used its push.
    pub moved: bool,
    /// Statue fell through a hole.
    pub broken: bool,
    /// Statue was destroyed and left play.
    pub removed: bool,
}

/// Immutable representation of the avatar used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AvatarSnapshot {
    /// Current position.
    pub position: Position,
    /// Current facing.
    pub facing: Facing,
    /// Animation frame in `0..4`.
    pub frame: u8,
    /// Remaining cushion-protected steps.
    pub cushion: u32,
    /// Whether movement intents are currently ignored.
    pub suppressed: bool,
}

/// Immutable representation of a single snake's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnakeSnapshot {
    /// Identifier of the snake.
    pub id: SnakeId,
    /// Current position.
    pub position: Position,
    /// Motion model.
    pub mode: SnakeMode,
}

/// Read-only snapshot describing the live snakes of a floor.
#[derive(Clone, Debug, Default)]
pub struct SnakeView {
    snapshots: Vec<SnakeSnapshot>,
}

impl SnakeView {
    /// Creates a new snake view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<SnakeSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snake snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &SnakeSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<SnakeSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single statue's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatueSnapshot {
    /// Identifier of the statue.
    pub id: StatueId,
    /// Name key of the statue.
    pub name: StatueName,
    /// Current position.
    pub position: Position,
    /// Lifecycle flags.
    pub state: StatueState,
}

/// Read-only view into a single floor's live tiles.
#[derive(Clone, Copy, Debug)]
pub struct FloorView<'a> {
    floor: FloorId,
    tiles: &'a [Tile],
}

impl<'a> FloorView<'a> {
    /// Captures a new floor view backed by the provided row-major tile slice.
    #[must_use]
    pub fn new(floor: FloorId, tiles: &'a [Tile]) -> Self {
        Self { floor, tiles }
    }

    /// Floor the view describes.
    #[must_use]
    pub const fn floor(&self) -> FloorId {
        self.floor
    }

    /// Returns the tile stored at the provided cell, if it lies inside the grid.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<Tile> {
        if !cell.in_bounds() {
            return None;
        }
        let index = usize::try_from(cell.row() * GRID_WIDTH + cell.column()).ok()?;
        self.tiles.get(index).copied()
    }

    /// Iterator over the rows of the floor, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &'a [Tile]> {
        self.tiles.chunks(GRID_WIDTH as usize)
    }
}
