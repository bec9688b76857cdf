// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bit packing for composite item ids.
//!
//! A composite [`ItemId`] is laid out as follows (most significant bit first):
//!
//! | bits    | width | field                                   |
//! |---------|-------|-----------------------------------------|
//! | 63      | 1     | reserved, keeps the sign of wrapped ids |
//! | 62..=56 | 7     | segment, unsigned `0..=127`             |
//! | 55..=28 | 28    | group id, signed                        |
//! | 27..=0  | 28    | child id, signed                        |
//!
//! The lower 56 bits (group + child) form the *wrapped id* produced by a child
//! adapter. Each composing layer stamps its own segment on top with
//! [`compose_segment`]. An id whose child-id field is all ones is an
//! expandable *group* id; anything else is a plain or child id.
//!
//! [`NO_ID`] is never a valid composed value: every function here maps it to
//! itself.

use crate::{AdapterError, BitField, ItemId, NO_ID};

/// Bit offset of the segment field.
pub const SEGMENT_OFFSET: u32 = 56;
/// Bit width of the segment field.
pub const SEGMENT_WIDTH: u32 = 7;
/// Bit offset of the group id field.
pub const GROUP_ID_OFFSET: u32 = 28;
/// Bit width of the group id field.
pub const GROUP_ID_WIDTH: u32 = 28;
/// Bit offset of the child id field.
pub const CHILD_ID_OFFSET: u32 = 0;
/// Bit width of the child id field.
pub const CHILD_ID_WIDTH: u32 = 28;
/// Bit width of a wrapped id (group + child).
pub const WRAPPED_ID_WIDTH: u32 = GROUP_ID_WIDTH + CHILD_ID_WIDTH;

const fn mask(width: u32, offset: u32) -> i64 {
    ((1_i64 << width) - 1) << offset
}

/// Mask of the reserved sign bit.
pub const RESERVED_SIGN_MASK: i64 = i64::MIN;
/// Mask of the segment field.
pub const SEGMENT_MASK: i64 = mask(SEGMENT_WIDTH, SEGMENT_OFFSET);
/// Mask of the group id field.
pub const GROUP_ID_MASK: i64 = mask(GROUP_ID_WIDTH, GROUP_ID_OFFSET);
/// Mask of the child id field.
pub const CHILD_ID_MASK: i64 = mask(CHILD_ID_WIDTH, CHILD_ID_OFFSET);

/// Smallest segment value.
pub const MIN_SEGMENT: usize = 0;
/// Largest segment value.
pub const MAX_SEGMENT: usize = (1 << SEGMENT_WIDTH) - 1;
/// Smallest group id.
pub const MIN_GROUP_ID: i64 = -(1 << (GROUP_ID_WIDTH - 1));
/// Largest group id.
pub const MAX_GROUP_ID: i64 = (1 << (GROUP_ID_WIDTH - 1)) - 1;
/// Smallest child id.
pub const MIN_CHILD_ID: i64 = -(1 << (CHILD_ID_WIDTH - 1));
/// Largest child id.
pub const MAX_CHILD_ID: i64 = (1 << (CHILD_ID_WIDTH - 1)) - 1;
/// Smallest wrapped id that survives a segment round trip.
pub const MIN_WRAPPED_ID: i64 = -(1 << (WRAPPED_ID_WIDTH - 1));
/// Largest wrapped id that survives a segment round trip.
pub const MAX_WRAPPED_ID: i64 = (1 << (WRAPPED_ID_WIDTH - 1)) - 1;

fn check_range(field: BitField, value: i64, min: i64, max: i64) -> Result<(), AdapterError> {
    if value < min || value > max {
        return Err(AdapterError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

pub(crate) fn check_segment(segment: usize) -> Result<(), AdapterError> {
    if segment > MAX_SEGMENT {
        return Err(AdapterError::OutOfRange {
            field: BitField::Segment,
            value: i64::try_from(segment).unwrap_or(i64::MAX),
            min: 0,
            max: (1 << SEGMENT_WIDTH) - 1,
        });
    }
    Ok(())
}

/// Composes the id of a child item within an expandable group.
///
/// Fails if either id is outside its 28-bit signed range. A `child_id` of `-1`
/// is rejected as well: it is the all-ones pattern that marks group ids.
pub fn compose_expandable_child_id(group_id: i64, child_id: i64) -> Result<ItemId, AdapterError> {
    check_range(BitField::GroupId, group_id, MIN_GROUP_ID, MAX_GROUP_ID)?;
    check_range(BitField::ChildId, child_id, MIN_CHILD_ID, MAX_CHILD_ID)?;
    if child_id == NO_ID {
        return Err(AdapterError::ReservedValue {
            field: BitField::ChildId,
            value: child_id,
        });
    }
    Ok(((group_id << GROUP_ID_OFFSET) & GROUP_ID_MASK)
        | ((child_id << CHILD_ID_OFFSET) & CHILD_ID_MASK))
}

/// Composes the id of an expandable group item.
///
/// The child-id field is filled with the [`NO_ID`] pattern.
pub fn compose_expandable_group_id(group_id: i64) -> Result<ItemId, AdapterError> {
    check_range(BitField::GroupId, group_id, MIN_GROUP_ID, MAX_GROUP_ID)?;
    Ok(((group_id << GROUP_ID_OFFSET) & GROUP_ID_MASK)
        | ((NO_ID << CHILD_ID_OFFSET) & CHILD_ID_MASK))
}

/// Returns `true` if `id` is an expandable group id.
#[must_use]
pub const fn is_expandable_group(id: ItemId) -> bool {
    id != NO_ID && (id & CHILD_ID_MASK) == CHILD_ID_MASK
}

/// Extracts the segment stamped on `id`, or `None` for [`NO_ID`].
#[must_use]
pub fn extract_segment(id: ItemId) -> Option<usize> {
    if id == NO_ID {
        return None;
    }
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Masked to 7 unsigned bits before the cast"
    )]
    let segment = ((id & SEGMENT_MASK) >> SEGMENT_OFFSET) as usize;
    Some(segment)
}

/// Extracts the sign-extended group id of a group or child id.
#[must_use]
pub const fn extract_group_id(id: ItemId) -> ItemId {
    if id == NO_ID {
        return NO_ID;
    }
    (id << (64 - GROUP_ID_WIDTH - GROUP_ID_OFFSET)) >> (64 - GROUP_ID_WIDTH)
}

/// Extracts the sign-extended child id, or [`NO_ID`] for group ids.
#[must_use]
pub const fn extract_child_id(id: ItemId) -> ItemId {
    if id == NO_ID || is_expandable_group(id) {
        return NO_ID;
    }
    (id << (64 - CHILD_ID_WIDTH - CHILD_ID_OFFSET)) >> (64 - CHILD_ID_WIDTH)
}

/// Extracts the sign-extended wrapped id (group + child), dropping the segment.
#[must_use]
pub const fn extract_wrapped_id(id: ItemId) -> ItemId {
    if id == NO_ID {
        return NO_ID;
    }
    (id << (64 - WRAPPED_ID_WIDTH)) >> (64 - WRAPPED_ID_WIDTH)
}

/// Stamps `segment` on `wrapped_id`, replacing whatever segment it carried.
///
/// The reserved, group and child fields are preserved.
pub fn compose_segment(segment: usize, wrapped_id: ItemId) -> Result<ItemId, AdapterError> {
    check_segment(segment)?;
    if wrapped_id == NO_ID {
        return Ok(NO_ID);
    }
    #[allow(clippy::cast_possible_wrap, reason = "Segment is checked to be 7-bit")]
    let segment = segment as i64;
    Ok(((segment << SEGMENT_OFFSET) & SEGMENT_MASK)
        | (wrapped_id & (RESERVED_SIGN_MASK | GROUP_ID_MASK | CHILD_ID_MASK)))
}
