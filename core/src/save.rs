//! Versioned snapshot of the mutable world state.
//!
//! Every field defaults when absent so that snapshots written by older builds,
//! or truncated by hand, still load field by field.

use serde::{Deserialize, Serialize};

use crate::{
    ElevatorConfig, FloorId, Modifier, ModifierScope, PieceId, Position, SetId, SnakeId,
    SpellKind, StatueName, StatueState,
};

/// Snapshot layout version written by this build.
pub const SAVE_VERSION: u32 = 1;

/// Complete persisted state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveSnapshot {
    /// Layout version the snapshot was written with.
    pub version: u32,
    /// Change-state registry contents.
    pub change_state: ChangeStateRecord,
    /// Puzzle progress.
    pub puzzles: PuzzleRecord,
    /// Every statue known to the world.
    pub statues: Vec<StatueRecord>,
    /// Cushion protection and redirect table.
    pub cushion: CushionRecord,
    /// Avatar placement.
    pub avatar: Option<AvatarRecord>,
    /// Per-floor respawn cells recorded on arrival.
    pub arrivals: Vec<Position>,
    /// Spells taught by magic boxes.
    pub unlocked_magic: Vec<SpellKind>,
    /// Snakes destroyed by falling statues.
    pub killed_snakes: Vec<SnakeId>,
}

/// Persisted change-state registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeStateRecord {
    /// Per-floor elevator configs.
    pub elevators: Vec<ElevatorRecord>,
    /// Modifiers of the remaining spells.
    pub modifiers: Vec<ModifierRecord>,
}

/// Persisted elevator config of one floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElevatorRecord {
    /// Floor the config belongs to.
    pub floor: FloorId,
    /// Stored config.
    pub config: ElevatorConfig,
}

/// Persisted modifier of one spell in one scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierRecord {
    /// Spell the modifier alters.
    pub spell: SpellKind,
    /// Scope of the modifier.
    pub scope: ModifierScope,
    /// Stored modifier.
    pub modifier: Modifier,
}

/// Persisted puzzle progress.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleRecord {
    /// Piece progress.
    pub pieces: Vec<PieceRecord>,
    /// Set progress.
    pub sets: Vec<SetRecord>,
}

/// Persisted progress of a puzzle piece.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceRecord {
    /// Piece identifier.
    pub id: PieceId,
    /// Whether the piece was obtained.
    pub unlocked: bool,
    /// Accepted answer text, once solved.
    #[serde(default)]
    pub answer: Option<String>,
}

/// Persisted progress of a puzzle set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRecord {
    /// Set identifier.
    pub id: SetId,
    /// Whether the set is unlocked.
    pub unlocked: bool,
}

/// Persisted statue placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatueRecord {
    /// Name key of the statue.
    pub name: StatueName,
    /// Floor the statue started on; with the name it identifies the statue.
    pub initial_floor: FloorId,
    /// Position to restore the statue at.
    pub position: Position,
    /// Lifecycle flags.
    #[serde(default)]
    pub state: StatueState,
}

/// Persisted cushion protection and redirect table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CushionRecord {
    /// Remaining protected steps.
    pub remaining: u32,
    /// Redirect table entries.
    pub redirects: Vec<RedirectRecord>,
}

/// Persisted redirect table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRecord {
    /// Hole cell the statue falls through.
    pub from: Position,
    /// Cell the statue lands on.
    pub to: Position,
}

/// Persisted avatar placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarRecord {
    /// Position of the avatar.
    pub position: Position,
}
