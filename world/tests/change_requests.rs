use medusa_tower_core::{
    ActionError, ChangeEffect, ChangeRequest, Command, ElevatorDirection, Event, FloorId, Message,
    ModifierScope, SpellKind, TargetOption,
};
use medusa_tower_world::{self as world, query, World};

fn change(floor: u8, target: SpellKind, effect: ChangeEffect, scope: ModifierScope) -> Command {
    Command::ApplyChange {
        floor: FloorId::new(floor),
        request: ChangeRequest::new(target, effect),
        scope,
    }
}

fn apply(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

#[test]
fn elevator_increments_accumulate_within_the_allow_list() {
    let mut world = World::new();
    let floor = FloorId::new(3);
    let scope = ModifierScope::Floor(floor);

    for expected in [1, 2] {
        let events = apply(
            &mut world,
            change(3, SpellKind::Elevator, ChangeEffect::Increase(1), scope),
        );
        assert_eq!(
            events,
            vec![Event::ChangeStateChanged {
                spell: SpellKind::Elevator,
                scope
            }]
        );
        assert_eq!(
            query::elevator_config(&world, floor).map(|config| config.increment),
            Some(expected)
        );
    }

    let events = apply(
        &mut world,
        change(3, SpellKind::Elevator, ChangeEffect::Increase(1), scope),
    );
    assert_eq!(
        events,
        vec![
            Event::ActionRejected {
                error: ActionError::InvalidChangeRequest
            },
            Event::MessageShown {
                message: Message::Rejected(ActionError::InvalidChangeRequest)
            },
        ]
    );
    assert_eq!(
        query::elevator_config(&world, floor).map(|config| config.increment),
        Some(2),
        "a refused increment leaves the config untouched"
    );
}

#[test]
fn floors_without_allow_list_refuse_increments() {
    let mut world = World::new();
    let _ = apply(
        &mut world,
        change(
            1,
            SpellKind::Elevator,
            ChangeEffect::Increase(1),
            ModifierScope::Global,
        ),
    );
    assert_eq!(query::elevator_config(&world, FloorId::new(1)), None);
}

#[test]
fn inversion_toggles_direction_and_keeps_the_increment() {
    let mut world = World::new();
    let floor = FloorId::new(6);
    let scope = ModifierScope::Floor(floor);
    let _ = apply(
        &mut world,
        change(6, SpellKind::Elevator, ChangeEffect::Increase(1), scope),
    );
    let _ = apply(
        &mut world,
        change(6, SpellKind::Elevator, ChangeEffect::Invert, scope),
    );
    let config = query::elevator_config(&world, floor).expect("stored config");
    assert_eq!(config.increment, 1);
    assert_eq!(config.direction, ElevatorDirection::Down);

    let _ = apply(
        &mut world,
        change(6, SpellKind::Elevator, ChangeEffect::Invert, scope),
    );
    assert_eq!(
        query::elevator_config(&world, floor).map(|config| config.direction),
        Some(ElevatorDirection::Up)
    );
}

#[test]
fn floor_modifiers_override_global_ones() {
    let mut world = World::new();
    let floor = FloorId::new(4);
    let _ = apply(
        &mut world,
        change(
            0,
            SpellKind::Move,
            ChangeEffect::Invert,
            ModifierScope::Global,
        ),
    );
    let _ = apply(
        &mut world,
        change(
            4,
            SpellKind::Move,
            ChangeEffect::Restrict(TargetOption::Different),
            ModifierScope::Floor(floor),
        ),
    );

    let on_fourth = query::effective_modifier(&world, SpellKind::Move, floor).expect("modifier");
    assert_eq!(on_fourth.option, Some(TargetOption::Different));
    assert!(!on_fourth.inverted);

    let elsewhere =
        query::effective_modifier(&world, SpellKind::Move, FloorId::new(2)).expect("modifier");
    assert!(elsewhere.inverted);
    assert_eq!(elsewhere.option, None);
}

#[test]
fn only_the_move_spell_takes_a_target_option() {
    let mut world = World::new();
    let events = apply(
        &mut world,
        change(
            1,
            SpellKind::Cushion,
            ChangeEffect::Restrict(TargetOption::Same),
            ModifierScope::Global,
        ),
    );
    assert!(events.contains(&Event::ActionRejected {
        error: ActionError::InvalidChangeRequest
    }));
    assert_eq!(
        query::modifier(&world, SpellKind::Cushion, ModifierScope::Global),
        None
    );
}
