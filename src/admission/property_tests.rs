//! Property-Based Tests for Admission Control
//!
//! Windows are long enough that no test run crosses a boundary.

use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use crate::admission::{AdmissionController, ResourceClass};

const LONG_WINDOW: Duration = Duration::from_secs(3600);

fn class_strategy() -> impl Strategy<Value = ResourceClass> {
    prop_oneof![Just(ResourceClass::Auth), Just(ResourceClass::ApiGeneral)]
}

fn identity_strategy() -> impl Strategy<Value = String> {
    "[a-d]".prop_map(|s| s)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Within one window exactly `limit` calls are admitted, with remaining
    // counting down to zero, and every later call is rejected.
    #[test]
    fn prop_fixed_window_admits_exactly_limit(limit in 1u32..50, extra in 1usize..20) {
        let controller = AdmissionController::default();
        let mut previous = limit;

        for _ in 0..limit {
            let result = controller.check("ip", ResourceClass::ApiGeneral, limit, LONG_WINDOW);
            prop_assert!(result.admitted);
            prop_assert!(result.remaining < previous, "remaining must strictly decrease");
            previous = result.remaining;
        }
        prop_assert_eq!(previous, 0);

        for _ in 0..extra {
            let result = controller.check("ip", ResourceClass::ApiGeneral, limit, LONG_WINDOW);
            prop_assert!(!result.admitted);
            prop_assert_eq!(result.remaining, 0);
        }
    }

    // Interleaved callers each see their own counter.
    #[test]
    fn prop_keys_are_independent(
        calls in prop::collection::vec((identity_strategy(), class_strategy()), 1..80),
        limit in 1u32..6
    ) {
        let controller = AdmissionController::default();
        let mut seen: HashMap<(String, ResourceClass), u32> = HashMap::new();

        for (identity, class) in calls {
            let count = seen.entry((identity.clone(), class)).or_insert(0);
            let result = controller.check(&identity, class, limit, LONG_WINDOW);

            if *count < limit {
                *count += 1;
                prop_assert!(result.admitted);
                prop_assert_eq!(result.remaining, limit - *count);
            } else {
                prop_assert!(!result.admitted);
                prop_assert_eq!(result.remaining, 0);
            }
        }

        prop_assert_eq!(controller.tracked(), seen.len());
    }
}
