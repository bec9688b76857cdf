// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bit-packing properties of composite ids and view types.

use proptest::prelude::*;
use understory_adapter::{NO_ID, item_id, view_type};

fn wrapped_id() -> impl Strategy<Value = i64> {
    (item_id::MIN_WRAPPED_ID..=item_id::MAX_WRAPPED_ID).prop_filter("not NO_ID", |&id| id != NO_ID)
}

fn wrapped_view_type() -> impl Strategy<Value = i32> {
    -(1_i32 << 23)..(1_i32 << 23)
}

proptest! {
    #[test]
    fn segment_round_trips_through_ids(segment in 0..=item_id::MAX_SEGMENT, id in wrapped_id()) {
        let composed = item_id::compose_segment(segment, id).unwrap();
        prop_assert_eq!(item_id::extract_segment(composed), Some(segment));
        prop_assert_eq!(item_id::extract_wrapped_id(composed), id);
    }

    #[test]
    fn restamping_keeps_the_wrapped_id(
        first in 0..=item_id::MAX_SEGMENT,
        second in 0..=item_id::MAX_SEGMENT,
        id in wrapped_id(),
    ) {
        let inner = item_id::compose_segment(first, id).unwrap();
        let outer = item_id::compose_segment(second, inner).unwrap();
        prop_assert_eq!(item_id::extract_segment(outer), Some(second));
        prop_assert_eq!(item_id::extract_wrapped_id(outer), id);
    }

    #[test]
    fn segment_round_trips_through_view_types(
        segment in 0..=view_type::MAX_SEGMENT,
        raw in wrapped_view_type(),
    ) {
        let composed = view_type::compose_segment(segment, raw).unwrap();
        prop_assert_eq!(view_type::extract_segment(composed), segment);
        prop_assert_eq!(view_type::extract_wrapped(composed), raw);
    }

    #[test]
    fn groups_and_children_are_told_apart(
        group in item_id::MIN_GROUP_ID..=item_id::MAX_GROUP_ID,
        child in item_id::MIN_CHILD_ID..=item_id::MAX_CHILD_ID,
        segment in 0..=item_id::MAX_SEGMENT,
    ) {
        let group_id = item_id::compose_expandable_group_id(group).unwrap();
        prop_assert!(item_id::is_expandable_group(group_id));
        prop_assert_eq!(item_id::extract_group_id(group_id), group);

        if child != NO_ID {
            let child_id = item_id::compose_expandable_child_id(group, child).unwrap();
            prop_assert!(!item_id::is_expandable_group(child_id));
            prop_assert_eq!(item_id::extract_group_id(child_id), group);
            prop_assert_eq!(item_id::extract_child_id(child_id), child);

            let stamped = item_id::compose_segment(segment, child_id).unwrap();
            prop_assert!(!item_id::is_expandable_group(stamped));
            prop_assert_eq!(item_id::extract_child_id(stamped), child);
        }
    }

    #[test]
    fn out_of_range_segments_are_rejected(segment in item_id::MAX_SEGMENT + 1..1_000_usize) {
        prop_assert!(item_id::compose_segment(segment, 0).is_err());
        prop_assert!(view_type::compose_segment(segment, 0).is_err());
    }
}
