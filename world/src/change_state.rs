use std::collections::BTreeMap;

use medusa_tower_core::{
    ActionError, ChangeEffect, ChangeRequest, ChangeStateRecord, ElevatorConfig, ElevatorRecord,
    FloorId, Modifier, ModifierRecord, ModifierScope, SpellKind,
};

/// Modifier records altering spell behaviour. Absent entries mean default behaviour.
#[derive(Clone, Debug, Default)]
pub(crate) struct ChangeStateRegistry {
    elevators: BTreeMap<FloorId, ElevatorConfig>,
    modifiers: BTreeMap<(SpellKind, ModifierScope), Modifier>,
}

impl ChangeStateRegistry {
    pub(crate) fn elevator_config(&self, floor: FloorId) -> Option<ElevatorConfig> {
        self.elevators.get(&floor).copied()
    }

    /// Adds `amount` to the floor's cumulative increment.
    ///
    /// The resulting value must be a member of `allowed`; otherwise the stored
    /// config is left untouched.
    pub(crate) fn set_elevator_increment(
        &mut self,
        floor: FloorId,
        amount: u32,
        allowed: &[u32],
    ) -> Result<ElevatorConfig, ActionError> {
        let current = self.elevator_config(floor).unwrap_or_default();
        let increment = current
            .increment
            .checked_add(amount)
            .ok_or(ActionError::InvalidChangeRequest)?;
        if !allowed.contains(&increment) {
            return Err(ActionError::InvalidChangeRequest);
        }
        let updated = ElevatorConfig {
            increment,
            ..current
        };
        let _ = self.elevators.insert(floor, updated);
        Ok(updated)
    }

    /// Flips the floor's elevator direction, keeping its increment.
    pub(crate) fn toggle_elevator_direction(&mut self, floor: FloorId) -> ElevatorConfig {
        let config = self.elevators.entry(floor).or_default();
        config.direction = config.direction.flipped();
        *config
    }

    pub(crate) fn modifier(&self, spell: SpellKind, scope: ModifierScope) -> Option<Modifier> {
        self.modifiers.get(&(spell, scope)).copied()
    }

    pub(crate) fn set_modifier(&mut self, spell: SpellKind, scope: ModifierScope, modifier: Modifier) {
        let _ = self.modifiers.insert((spell, scope), modifier);
    }

    /// Modifier in force on a floor: the floor record wins over the global one.
    pub(crate) fn effective_modifier(&self, spell: SpellKind, floor: FloorId) -> Option<Modifier> {
        self.modifier(spell, ModifierScope::Floor(floor))
            .or_else(|| self.modifier(spell, ModifierScope::Global))
    }

    /// Applies a change request that already passed the floor's allow-list.
    ///
    /// Elevator changes always land in the floor's elevator config; `scope` is
    /// only consulted for the other spells.
    pub(crate) fn apply_request(
        &mut self,
        floor: FloorId,
        request: ChangeRequest,
        scope: ModifierScope,
        increment_allow_list: &[u32],
    ) -> Result<(), ActionError> {
        match (request.target, request.effect) {
            (SpellKind::Elevator, ChangeEffect::Increase(amount)) => {
                let config =
                    self.set_elevator_increment(floor, u32::from(amount), increment_allow_list)?;
                log::info!("elevator on floor {floor} now at {config:?}");
            }
            (SpellKind::Elevator, ChangeEffect::Invert) => {
                let config = self.toggle_elevator_direction(floor);
                log::info!("elevator on floor {floor} now at {config:?}");
            }
            (SpellKind::Elevator, ChangeEffect::Restrict(_)) => {
                return Err(ActionError::InvalidChangeRequest);
            }
            (spell, effect) => {
                let mut modifier = self.modifier(spell, scope).unwrap_or_default();
                match effect {
                    ChangeEffect::Increase(amount) => {
                        modifier.increase = modifier.increase.saturating_add(u32::from(amount));
                    }
                    ChangeEffect::Invert => modifier.inverted = !modifier.inverted,
                    ChangeEffect::Restrict(option) if spell == SpellKind::Move => {
                        modifier.option = Some(option);
                    }
                    ChangeEffect::Restrict(_) => return Err(ActionError::InvalidChangeRequest),
                }
                self.set_modifier(spell, scope, modifier);
                log::info!("{spell} modifier in {scope:?} now at {modifier:?}");
            }
        }
        Ok(())
    }

    pub(crate) fn to_record(&self) -> ChangeStateRecord {
        ChangeStateRecord {
            elevators: self
                .elevators
                .iter()
                .map(|(floor, config)| ElevatorRecord {
                    floor: *floor,
                    config: *config,
                })
                .collect(),
            modifiers: self
                .modifiers
                .iter()
                .map(|((spell, scope), modifier)| ModifierRecord {
                    spell: *spell,
                    scope: *scope,
                    modifier: *modifier,
                })
                .collect(),
        }
    }

    pub(crate) fn from_record(record: &ChangeStateRecord) -> Self {
        let mut registry = Self::default();
        for entry in &record.elevators {
            let _ = registry.elevators.insert(entry.floor, entry.config);
        }
        for entry in &record.modifiers {
            registry.set_modifier(entry.spell, entry.scope, entry.modifier);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medusa_tower_core::{ElevatorDirection, TargetOption};

    const THIRD_FLOOR_ALLOWED: [u32; 3] = [0, 1, 2];

    #[test]
    fn absent_elevator_config_means_default() {
        let registry = ChangeStateRegistry::default();
        assert_eq!(registry.elevator_config(FloorId::new(3)), None);
    }

    #[test]
    fn increments_accumulate_within_allow_list() {
        let mut registry = ChangeStateRegistry::default();
        let floor = FloorId::new(3);

        let first = registry
            .set_elevator_increment(floor, 1, &THIRD_FLOOR_ALLOWED)
            .expect("1 is allowed");
        assert_eq!(first.increment, 1);
        assert_eq!(registry.elevator_config(floor), Some(first));

        let second = registry
            .set_elevator_increment(floor, 1, &THIRD_FLOOR_ALLOWED)
            .expect("cumulative 2 is allowed");
        assert_eq!(second.increment, 2, "repeated increments add up");

        assert_eq!(
            registry.set_elevator_increment(floor, 1, &THIRD_FLOOR_ALLOWED),
            Err(ActionError::InvalidChangeRequest)
        );
        assert_eq!(registry.elevator_config(floor), Some(second));
    }

    #[test]
    fn rejected_increment_never_creates_entry() {
        let mut registry = ChangeStateRegistry::default();
        let floor = FloorId::new(1);
        for amount in 1..5 {
            assert!(registry.set_elevator_increment(floor, amount, &[0]).is_err());
        }
        assert_eq!(registry.elevator_config(floor), None);
    }

    #[test]
    fn inversion_flips_direction_only() {
        let mut registry = ChangeStateRegistry::default();
        let floor = FloorId::new(3);
        let _ = registry
            .set_elevator_increment(floor, 2, &THIRD_FLOOR_ALLOWED)
            .expect("allowed");

        let inverted = registry.toggle_elevator_direction(floor);
        assert_eq!(inverted.increment, 2);
        assert_eq!(inverted.direction, ElevatorDirection::Down);

        let restored = registry.toggle_elevator_direction(floor);
        assert_eq!(restored.direction, ElevatorDirection::Up);
        assert_eq!(restored.increment, 2);
    }

    #[test]
    fn floor_modifier_takes_precedence_over_global() {
        let mut registry = ChangeStateRegistry::default();
        let floor = FloorId::new(4);
        registry.set_modifier(
            SpellKind::Move,
            ModifierScope::Global,
            Modifier {
                inverted: true,
                ..Modifier::default()
            },
        );
        assert!(registry
            .effective_modifier(SpellKind::Move, floor)
            .is_some_and(|modifier| modifier.inverted));

        registry.set_modifier(
            SpellKind::Move,
            ModifierScope::Floor(floor),
            Modifier::default(),
        );
        assert_eq!(
            registry.effective_modifier(SpellKind::Move, floor),
            Some(Modifier::default())
        );
        assert!(registry
            .effective_modifier(SpellKind::Move, FloorId::new(5))
            .is_some_and(|modifier| modifier.inverted));
    }

    #[test]
    fn restrict_only_applies_to_move() {
        let mut registry = ChangeStateRegistry::default();
        let floor = FloorId::new(4);
        let scope = ModifierScope::Floor(floor);

        registry
            .apply_request(
                floor,
                ChangeRequest::new(SpellKind::Move, ChangeEffect::Restrict(TargetOption::Same)),
                scope,
                &[0],
            )
            .expect("move accepts options");
        assert_eq!(
            registry.modifier(SpellKind::Move, scope).and_then(|modifier| modifier.option),
            Some(TargetOption::Same)
        );

        assert_eq!(
            registry.apply_request(
                floor,
                ChangeRequest::new(
                    SpellKind::Cushion,
                    ChangeEffect::Restrict(TargetOption::Different)
                ),
                scope,
                &[0],
            ),
            Err(ActionError::InvalidChangeRequest)
        );
        assert_eq!(registry.modifier(SpellKind::Cushion, scope), None);
    }

    #[test]
    fn record_round_trip_preserves_both_scopes() {
        let mut registry = ChangeStateRegistry::default();
        let _ = registry.toggle_elevator_direction(FloorId::new(6));
        registry
            .apply_request(
                FloorId::new(1),
                ChangeRequest::new(SpellKind::Cushion, ChangeEffect::Increase(1)),
                ModifierScope::Global,
                &[0],
            )
            .expect("cushion increase");

        let restored = ChangeStateRegistry::from_record(&registry.to_record());
        assert_eq!(restored.to_record(), registry.to_record());
        assert_eq!(
            restored
                .modifier(SpellKind::Cushion, ModifierScope::Global)
                .map(|modifier| modifier.increase),
            Some(1)
        );
    }
}
