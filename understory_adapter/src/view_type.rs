// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bit packing for composite view types.
//!
//! | bits    | width | field                                |
//! |---------|-------|--------------------------------------|
//! | 31      | 1     | expandable group flag                |
//! | 30..=24 | 7     | segment, unsigned `0..=127`          |
//! | 23..=0  | 24    | wrapped view type, signed            |
//!
//! Composing a segment only ever touches bits `30..=24`.

use crate::item_id::check_segment;
use crate::{AdapterError, ViewType};

/// Bit offset of the segment field.
pub const SEGMENT_OFFSET: u32 = 24;
/// Bit width of the segment field.
pub const SEGMENT_WIDTH: u32 = 7;
/// Largest segment value.
pub const MAX_SEGMENT: usize = (1 << SEGMENT_WIDTH) - 1;
/// Bit width of the wrapped view type field.
pub const WRAPPED_VIEW_TYPE_WIDTH: u32 = 24;

/// Mask of the expandable group flag.
pub const EXPANDABLE_GROUP_FLAG: ViewType = ViewType::MIN;
/// Mask of the segment field.
pub const SEGMENT_MASK: ViewType = ((1 << SEGMENT_WIDTH) - 1) << SEGMENT_OFFSET;
/// Mask of the wrapped view type field.
pub const WRAPPED_VIEW_TYPE_MASK: ViewType = (1 << WRAPPED_VIEW_TYPE_WIDTH) - 1;

/// Returns `true` if the expandable group flag is set.
#[must_use]
pub const fn is_expandable_group(view_type: ViewType) -> bool {
    (view_type & EXPANDABLE_GROUP_FLAG) != 0
}

/// Extracts the segment stamped on `view_type`.
#[must_use]
pub fn extract_segment(view_type: ViewType) -> usize {
    #[allow(
        clippy::cast_sign_loss,
        reason = "Masked to 7 unsigned bits before the cast"
    )]
    let segment = ((view_type & SEGMENT_MASK) >> SEGMENT_OFFSET) as usize;
    segment
}

/// Extracts the sign-extended 24-bit wrapped view type.
#[must_use]
pub const fn extract_wrapped(view_type: ViewType) -> ViewType {
    (view_type << (32 - WRAPPED_VIEW_TYPE_WIDTH)) >> (32 - WRAPPED_VIEW_TYPE_WIDTH)
}

/// Stamps `segment` on `view_type`, preserving the flag and the wrapped bits.
pub fn compose_segment(segment: usize, view_type: ViewType) -> Result<ViewType, AdapterError> {
    check_segment(segment)?;
    Ok(compose_segment_unchecked(segment, view_type))
}

pub(crate) fn compose_segment_unchecked(segment: usize, view_type: ViewType) -> ViewType {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        reason = "Callers guarantee a 7-bit segment"
    )]
    let segment = segment as ViewType;
    ((segment << SEGMENT_OFFSET) & SEGMENT_MASK)
        | (view_type & (EXPANDABLE_GROUP_FLAG | WRAPPED_VIEW_TYPE_MASK))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_round_trips_with_negative_view_types() {
        for v in [0, 1, -1, -3, 0x7F_FFFF, -0x80_0000] {
            let composed = compose_segment(77, v).unwrap();
            assert_eq!(extract_segment(composed), 77);
            assert_eq!(extract_wrapped(composed), v);
        }
    }

    #[test]
    fn composing_keeps_the_group_flag() {
        let group = EXPANDABLE_GROUP_FLAG | 12;
        let composed = compose_segment(3, group).unwrap();
        assert!(is_expandable_group(composed));
        assert_eq!(extract_wrapped(composed), 12);
        assert!(!is_expandable_group(compose_segment(3, 12).unwrap()));
    }

    #[test]
    fn restamping_replaces_the_segment() {
        let inner = compose_segment(5, 9).unwrap();
        let outer = compose_segment(6, inner).unwrap();
        assert_eq!(extract_segment(outer), 6);
        assert_eq!(extract_wrapped(outer), 9);
    }

    #[test]
    fn out_of_range_segment_is_rejected() {
        assert!(compose_segment(128, 0).is_err());
    }
}
