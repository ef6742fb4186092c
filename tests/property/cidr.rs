// Copyright 2025 Cowboy AI, LLC.

//! CIDR subdivision properties

use proptest::prelude::*;
use std::net::Ipv4Addr;

use cim_cloudtree::domain::CidrBlock;

fn parent_block() -> impl Strategy<Value = CidrBlock> {
    (any::<u32>(), 8u8..=24).prop_map(|(address, prefix)| {
        CidrBlock::new(Ipv4Addr::from(address), prefix).expect("prefix in range")
    })
}

proptest! {
    #[test]
    fn sub_blocks_are_contained_in_parent(parent in parent_block(), index in 0u32..64) {
        let count = 1u64 << (24 - parent.prefix_len());
        let index = (u64::from(index) % count) as u32;

        let sub = parent.sub_block(24, index).expect("index in range");
        prop_assert!(parent.contains(&sub));
        prop_assert_eq!(sub.prefix_len(), 24);
    }

    #[test]
    fn distinct_indexes_yield_disjoint_sub_blocks(parent in parent_block(), seed in 0u32..64) {
        let count = 1u64 << (24 - parent.prefix_len());
        let first = (u64::from(seed) % count) as u32;
        let second = (u64::from(seed + 1) % count) as u32;
        prop_assume!(first != second);

        let a = parent.sub_block(24, first).expect("index in range");
        let b = parent.sub_block(24, second).expect("index in range");
        prop_assert!(!a.contains(&b));
        prop_assert!(!b.contains(&a));
        prop_assert_ne!(a, b);
    }

    #[test]
    fn carve_is_deterministic(parent in parent_block()) {
        prop_assert_eq!(parent.first_slash24(), parent.first_slash24());
    }
}
