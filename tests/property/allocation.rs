// Copyright 2025 Cowboy AI, LLC.

//! Zone allocation properties
//!
//! Assignment must be a pure function of (index-or-position, zone-list
//! length): total over every input, stable across calls, and always
//! inside the list.

use proptest::prelude::*;

use cim_cloudtree::synth::zones::allocate_zone;

fn zone_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,4}", 1..=6)
}

proptest! {
    #[test]
    fn allocation_is_total_and_in_range(
        zones in zone_list(),
        explicit in prop::option::of(0u32..64),
        position in 0usize..64,
    ) {
        let zone = allocate_zone(&zones, explicit, position).expect("non-empty list allocates");
        prop_assert!(zones.iter().any(|z| z == zone));
    }

    #[test]
    fn allocation_is_stable(
        zones in zone_list(),
        explicit in prop::option::of(0u32..64),
        position in 0usize..64,
    ) {
        prop_assert_eq!(
            allocate_zone(&zones, explicit, position),
            allocate_zone(&zones, explicit, position)
        );
    }

    #[test]
    fn explicit_index_wraps_modulo_length(
        zones in zone_list(),
        explicit in 0u32..64,
    ) {
        let expected = &zones[explicit as usize % zones.len()];
        prop_assert_eq!(allocate_zone(&zones, Some(explicit), 0), Some(expected.as_str()));
    }

    #[test]
    fn position_fallback_wraps_modulo_length(
        zones in zone_list(),
        position in 0usize..64,
    ) {
        let expected = &zones[position % zones.len()];
        prop_assert_eq!(allocate_zone(&zones, None, position), Some(expected.as_str()));
    }
}
