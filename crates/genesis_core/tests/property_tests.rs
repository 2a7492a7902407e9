//! Property-based tests for genesis_core.
//!
//! Verifies that trait values and relationship quality stay within [0, 1]
//! for arbitrary sequences of mutations, and that the goal set never holds
//! duplicates.

use genesis_core::{
    CoreTrait, GoalSet, Middah, RelationshipRegistry, Trait, TraitFamily, TraitStore,
};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_trait() -> impl Strategy<Value = Trait> {
    prop_oneof![
        (0usize..CoreTrait::ALL.len()).prop_map(|i| Trait::Core(CoreTrait::ALL[i])),
        (0usize..Middah::ALL.len()).prop_map(|i| Trait::Middah(Middah::ALL[i])),
    ]
}

/// Deltas well outside the valid range, plus the odd non-finite value.
fn arb_delta() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -3.0f64..3.0,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
    ]
}

fn assert_in_range(store: &TraitStore) -> Result<(), TestCaseError> {
    for family in [TraitFamily::Core, TraitFamily::Middot] {
        for (t, v) in store.values(family) {
            prop_assert!(v.is_finite(), "{} not finite: {}", t, v);
            prop_assert!((0.0..=1.0).contains(&v), "{} out of range: {}", t, v);
        }
    }
    Ok(())
}

// ============================================================================
// Saturation
// ============================================================================

proptest! {
    /// **Core invariant**: every trait stays in [0, 1] after any sequence of adjusts.
    #[test]
    fn adjust_sequence_always_saturates(
        ops in prop::collection::vec((arb_trait(), arb_delta()), 0..200),
    ) {
        let mut store = TraitStore::default();
        for (t, delta) in ops {
            let v = store.adjust(t, delta);
            prop_assert!((0.0..=1.0).contains(&v), "adjust({}, {}) returned {}", t, delta, v);
        }
        assert_in_range(&store)?;
    }

    /// `set` saturates too, including for non-finite input.
    #[test]
    fn set_always_saturates(t in arb_trait(), value in arb_delta()) {
        let mut store = TraitStore::default();
        store.set(t, value);
        assert_in_range(&store)?;
    }

    /// Averages of in-range values are in range.
    #[test]
    fn averages_stay_in_range(
        ops in prop::collection::vec((arb_trait(), -1.0f64..1.0), 0..50),
    ) {
        let mut store = TraitStore::default();
        for (t, delta) in ops {
            store.adjust(t, delta);
        }
        for family in [TraitFamily::Core, TraitFamily::Middot] {
            let avg = store.average(family);
            prop_assert!((0.0..=1.0).contains(&avg));
        }
    }

    /// Relationship quality saturates for any bump sequence.
    #[test]
    fn relationship_quality_saturates(
        deltas in prop::collection::vec(-2.0f64..2.0, 0..100),
    ) {
        let mut registry = RelationshipRegistry::default();
        registry.touch("source");
        for d in deltas {
            let q = registry.bump_quality("source", d).unwrap();
            prop_assert!((0.0..=1.0).contains(&q));
        }
    }

    /// Interaction counts equal the number of touches.
    #[test]
    fn touch_counts_every_contact(n in 1u64..50) {
        let mut registry = RelationshipRegistry::default();
        let first_contact = registry.touch("s").first_contact;
        for _ in 1..n {
            registry.touch("s");
        }
        let record = registry.get("s").unwrap();
        prop_assert_eq!(record.interaction_count, n);
        prop_assert_eq!(record.first_contact, first_contact);
    }

    /// The goal set never contains duplicates, whatever is added.
    #[test]
    fn goal_set_never_duplicates(
        goals in prop::collection::vec("[a-c]{1,2}", 0..40),
    ) {
        let mut set = GoalSet::default();
        for g in goals {
            set.add(g);
        }
        let all = set.all();
        for (i, g) in all.iter().enumerate() {
            prop_assert!(!all[i + 1..].contains(g), "duplicate goal {}", g);
        }
    }
}
