/// PROPERTY-BASED TESTS: state delta create/apply invariants
///
/// 1. A delta of a state against itself is a no-op (or not produced)
/// 2. Applying create_delta(basis, target) onto a basis clone yields target
/// 3. The wire round-trip preserves both
use proptest::prelude::*;

use orrery_serde::BitBuffer;
use orrery_shared::{create_delta, StateBase, StateDelta, Tick, EntityId, FactoryType};
use orrery_test::{protocol, PawnState};

fn pawn_strategy() -> impl Strategy<Value = PawnState> {
    (
        -100_000i32..=100_000,
        -100_000i32..=100_000,
        // Quantization steps, so wire round-trips are exact.
        0u32..=6283,
        0i32..=100,
        "[a-z]{0,12}",
    )
        .prop_map(|(pos_x, pos_y, heading_steps, energy, label)| PawnState {
            pos_x,
            pos_y,
            heading: heading_steps as f32 * 0.001,
            energy,
            label,
        })
}

fn make_delta(basis: &PawnState, target: &PawnState, controller: bool, immutable: bool) -> Option<StateDelta> {
    create_delta(
        Tick::START,
        EntityId::first(),
        FactoryType(0),
        Some(basis as &dyn StateBase),
        target as &dyn StateBase,
        controller,
        immutable,
        Tick::INVALID,
        Tick::INVALID,
        false,
    )
}

proptest! {
    #[test]
    fn prop_self_delta_is_a_noop(state in pawn_strategy()) {
        // Nothing differs and nothing else is carried: no delta at all.
        prop_assert!(make_delta(&state, &state, false, false).is_none());

        // With controller data included a delta exists, but applying it
        // changes nothing.
        let delta = make_delta(&state, &state, true, false).expect("controller delta");
        let mut clone = state.clone();
        delta.apply(&mut clone as &mut dyn StateBase);
        prop_assert_eq!(clone, state);
    }

    #[test]
    fn prop_delta_reconstructs_target(
        basis in pawn_strategy(),
        target in pawn_strategy(),
    ) {
        let Some(delta) = make_delta(&basis, &target, true, true) else {
            // No delta means no observable difference on any section.
            prop_assert_eq!(&basis, &target);
            return Ok(());
        };

        let mut reconstructed = basis.clone();
        delta.apply(&mut reconstructed as &mut dyn StateBase);
        prop_assert_eq!(reconstructed, target);
    }

    #[test]
    fn prop_delta_survives_the_wire(
        basis in pawn_strategy(),
        target in pawn_strategy(),
    ) {
        let registry = protocol();
        let Some(delta) = make_delta(&basis, &target, true, true) else {
            return Ok(());
        };

        let mut buffer = BitBuffer::new();
        delta.encode(&registry, &mut buffer);
        let bytes = buffer.store();

        let mut loaded = BitBuffer::new();
        loaded.load(&bytes).unwrap();
        let decoded = StateDelta::decode(&registry, &mut loaded).unwrap();

        let mut reconstructed = basis.clone();
        decoded.apply(&mut reconstructed as &mut dyn StateBase);
        prop_assert_eq!(reconstructed, target);
        prop_assert_eq!(decoded.tick, delta.tick);
        prop_assert_eq!(decoded.entity_id, delta.entity_id);
    }
}
