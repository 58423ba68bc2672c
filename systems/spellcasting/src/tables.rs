//! Keyword and rule tables of the four spells.

use medusa_tower_core::{
    ChangeEffect, ChangeRequest, ElevatorConfig, ElevatorDirection, FloorId, ModifierScope,
    Position, SpellKind, TargetOption,
};

/// Change state an elevator rule requires before it teleports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequiredState {
    /// No change applied to the floor's elevator.
    Default,
    /// Cumulative increment with the default direction.
    Increment(u32),
    /// Cumulative increment with the inverted direction.
    IncrementInverted(u32),
}

impl RequiredState {
    /// Reports whether the stored config satisfies the requirement.
    #[must_use]
    pub fn accepts(self, config: Option<ElevatorConfig>) -> bool {
        let config = config.unwrap_or_default();
        match self {
            Self::Default => config.is_default(),
            Self::Increment(increment) => {
                config.increment == increment && config.direction == ElevatorDirection::Up
            }
            Self::IncrementInverted(increment) => {
                config.increment == increment && config.direction == ElevatorDirection::Down
            }
        }
    }
}

/// One row of the elevator table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElevatorRule {
    /// Floor the rule is cast on.
    pub floor: FloorId,
    /// Normalized keyword.
    pub keyword: &'static str,
    /// Change state the floor's elevator must be in.
    pub required: RequiredState,
    /// Where the avatar arrives.
    pub destination: Position,
}

/// Change allowed on one floor's altar, with the registry scope it writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllowedChange {
    /// Floor of the altar.
    pub floor: FloorId,
    /// Accepted request.
    pub request: ChangeRequest,
    /// Scope that receives the modifier.
    pub scope: ModifierScope,
}

/// Accepted words of a spell, normal and alternate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeywordPairs {
    /// Words accepted in the default state.
    pub normal: [&'static str; 2],
    /// Words accepted once the spell's behaviour changed.
    pub alternate: [&'static str; 2],
}

impl KeywordPairs {
    /// Words of the pair in force.
    #[must_use]
    pub fn active(&self, alternate: bool) -> [&'static str; 2] {
        if alternate {
            self.alternate
        } else {
            self.normal
        }
    }

    /// Reports whether the keyword belongs to either pair.
    #[must_use]
    pub fn knows(&self, keyword: &str) -> bool {
        self.normal.contains(&keyword) || self.alternate.contains(&keyword)
    }
}

/// Complete spell rule set.
#[derive(Clone, Debug)]
pub struct Spellbook {
    /// Elevator rules.
    pub elevator: Vec<ElevatorRule>,
    /// Move spell words; the alternate pair applies while the move modifier is inverted.
    pub movement: KeywordPairs,
    /// Cushion spell words; the alternate pair applies at the increased step count.
    pub cushion: KeywordPairs,
    /// Change spell words.
    pub change: [&'static str; 2],
    /// Per-floor altar allow-lists.
    pub changes: Vec<AllowedChange>,
    /// Cushion steps before any increase.
    pub base_cushion: u32,
    /// Step count at which the cushion spell switches to its alternate words.
    pub increased_cushion: u32,
}

impl Spellbook {
    /// Rule tables of the canonical tower.
    #[must_use]
    pub fn canonical() -> Self {
        let floor = FloorId::new;
        let elevator = |on: u8, keyword, required, destination: (u32, u32, u8)| ElevatorRule {
            floor: floor(on),
            keyword,
            required,
            destination: Position::new(destination.0, destination.1, floor(destination.2)),
        };
        let allowed = |on: u8, target, effect, scope| AllowedChange {
            floor: floor(on),
            request: ChangeRequest::new(target, effect),
            scope,
        };
        use RequiredState::{Increment, IncrementInverted};

        Self {
            elevator: vec![
                elevator(0, "ascend", RequiredState::Default, (5, 5, 3)),
                elevator(1, "ascend", RequiredState::Default, (5, 1, 2)),
                elevator(2, "ascend", RequiredState::Default, (5, 5, 3)),
                elevator(2, "descend", RequiredState::Default, (5, 1, 1)),
                elevator(3, "ascend", RequiredState::Default, (5, 9, 4)),
                elevator(3, "descend", RequiredState::Default, (5, 1, 2)),
                elevator(3, "soar", Increment(1), (5, 9, 5)),
                elevator(3, "leap", Increment(2), (5, 9, 6)),
                elevator(3, "plunge", IncrementInverted(1), (5, 5, 0)),
                elevator(4, "ascend", RequiredState::Default, (5, 9, 5)),
                elevator(4, "descend", RequiredState::Default, (5, 5, 3)),
                elevator(5, "ascend", RequiredState::Default, (5, 9, 6)),
                elevator(5, "descend", RequiredState::Default, (5, 9, 4)),
                elevator(6, "descend", RequiredState::Default, (5, 9, 5)),
                elevator(6, "plunge", IncrementInverted(1), (5, 1, 1)),
            ],
            movement: KeywordPairs {
                normal: ["shift", "move"],
                alternate: ["stay", "still"],
            },
            cushion: KeywordPairs {
                normal: ["cushion", "pillow"],
                alternate: ["featherbed", "cloud"],
            },
            change: ["alter", "change"],
            changes: vec![
                allowed(0, SpellKind::Move, ChangeEffect::Invert, ModifierScope::Global),
                allowed(
                    1,
                    SpellKind::Cushion,
                    ChangeEffect::Increase(1),
                    ModifierScope::Global,
                ),
                allowed(
                    3,
                    SpellKind::Elevator,
                    ChangeEffect::Increase(1),
                    ModifierScope::Floor(floor(3)),
                ),
                allowed(
                    3,
                    SpellKind::Elevator,
                    ChangeEffect::Increase(2),
                    ModifierScope::Floor(floor(3)),
                ),
                allowed(
                    3,
                    SpellKind::Elevator,
                    ChangeEffect::Invert,
                    ModifierScope::Floor(floor(3)),
                ),
                allowed(
                    3,
                    SpellKind::Move,
                    ChangeEffect::Invert,
                    ModifierScope::Floor(floor(3)),
                ),
                allowed(
                    4,
                    SpellKind::Move,
                    ChangeEffect::Restrict(TargetOption::Same),
                    ModifierScope::Floor(floor(4)),
                ),
                allowed(
                    4,
                    SpellKind::Move,
                    ChangeEffect::Restrict(TargetOption::Different),
                    ModifierScope::Floor(floor(4)),
                ),
                allowed(
                    6,
                    SpellKind::Elevator,
                    ChangeEffect::Increase(1),
                    ModifierScope::Floor(floor(6)),
                ),
                allowed(
                    6,
                    SpellKind::Elevator,
                    ChangeEffect::Invert,
                    ModifierScope::Floor(floor(6)),
                ),
            ],
            base_cushion: 3,
            increased_cushion: 4,
        }
    }

    /// Elevator rule matching the keyword on a floor.
    #[must_use]
    pub fn elevator_rule(&self, floor: FloorId, keyword: &str) -> Option<&ElevatorRule> {
        self.elevator
            .iter()
            .find(|rule| rule.floor == floor && rule.keyword == keyword)
    }

    /// Reports whether any floor answers to the elevator keyword.
    #[must_use]
    pub fn knows_elevator_keyword(&self, keyword: &str) -> bool {
        self.elevator.iter().any(|rule| rule.keyword == keyword)
    }

    /// Allow-list entry of a floor matching the request.
    #[must_use]
    pub fn allowed_change(&self, floor: FloorId, request: ChangeRequest) -> Option<&AllowedChange> {
        self.changes
            .iter()
            .find(|entry| entry.floor == floor && entry.request == request)
    }
}

impl Default for Spellbook {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_state_distinguishes_direction() {
        let inverted = ElevatorConfig {
            increment: 1,
            direction: ElevatorDirection::Down,
        };
        assert!(RequiredState::Default.accepts(None));
        assert!(RequiredState::Default.accepts(Some(ElevatorConfig::default())));
        assert!(!RequiredState::Default.accepts(Some(inverted)));
        assert!(!RequiredState::Increment(1).accepts(Some(inverted)));
        assert!(RequiredState::IncrementInverted(1).accepts(Some(inverted)));
        assert!(!RequiredState::Increment(0).accepts(Some(inverted)));
    }

    #[test]
    fn elevator_rules_leave_their_floor() {
        let book = Spellbook::canonical();
        for rule in &book.elevator {
            assert_ne!(rule.floor, rule.destination.floor(), "{rule:?}");
        }
        assert!(book.knows_elevator_keyword("soar"));
        assert!(book.elevator_rule(FloorId::new(1), "soar").is_none());
    }

    #[test]
    fn keyword_pairs_switch_on_alternate_state() {
        let book = Spellbook::canonical();
        assert_eq!(book.movement.active(false), ["shift", "move"]);
        assert_eq!(book.movement.active(true), ["stay", "still"]);
        assert!(book.cushion.knows("cloud"));
        assert!(!book.cushion.knows("shift"));
    }
}
