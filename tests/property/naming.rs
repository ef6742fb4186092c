// Copyright 2025 Cowboy AI, LLC.

//! Logical-id naming properties
//!
//! Declaration names derive from the topology path, so distinct paths
//! must yield distinct ids and equal paths equal ids — this is what
//! makes concurrent application of independent stacks safe.

use proptest::prelude::*;

use cim_cloudtree::declaration::LogicalId;

fn path() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9-]{1,8}", 1..=5)
}

fn id_of(segments: &[String]) -> LogicalId {
    let mut id = LogicalId::new(segments[0].clone());
    for segment in &segments[1..] {
        id = id.child(segment);
    }
    id
}

proptest! {
    #[test]
    fn equal_paths_yield_equal_ids(segments in path()) {
        prop_assert_eq!(id_of(&segments), id_of(&segments));
    }

    #[test]
    fn distinct_paths_yield_distinct_ids(a in path(), b in path()) {
        prop_assume!(a != b);
        prop_assert_ne!(id_of(&a), id_of(&b));
    }

    #[test]
    fn child_ids_stay_under_parent(segments in path(), leaf in "[a-z0-9-]{1,8}") {
        let parent = id_of(&segments);
        let child = parent.child(&leaf);
        prop_assert!(child.as_str().starts_with(parent.as_str()));
        prop_assert_ne!(child, parent);
    }
}
