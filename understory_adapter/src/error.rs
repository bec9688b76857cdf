// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by every adapter in this crate.

use core::fmt;

use crate::{ItemId, ViewType};

/// A bit-field of a composite item id or view type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitField {
    /// The 7-bit segment field.
    Segment,
    /// The 28-bit group id field of an item id.
    GroupId,
    /// The 28-bit child id field of an item id.
    ChildId,
}

impl fmt::Display for BitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Segment => "segment",
            Self::GroupId => "group id",
            Self::ChildId => "child id",
        })
    }
}

/// Coarse classification of an [`AdapterError`].
///
/// None of these are recoverable by retrying; the only remedy is for the
/// caller not to perform the offending operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value did not fit the bit-field or index space it was meant for.
    Range,
    /// The stable-id contract between a composite and its children was violated.
    Configuration,
    /// The view-type translator ran out of wrapped segments.
    Capacity,
    /// A wrap/unwrap round trip disagreed with itself.
    Consistency,
    /// A mutator was re-entered, or an adapter was used after release.
    Reentrancy,
    /// An event that the adapter protocol cannot express was reported.
    ContractViolation,
}

/// Errors reported by composing adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// A bit-field value was outside its representable range.
    #[error("{field} {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// The field being composed.
        field: BitField,
        /// The rejected value.
        value: i64,
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
    },

    /// A bit-field value collides with a marker pattern.
    #[error("{field} {value} is reserved")]
    ReservedValue {
        /// The field being composed.
        field: BitField,
        /// The rejected value.
        value: i64,
    },

    /// A position or insertion index was past the end.
    #[error("position {position} is out of bounds (len {len})")]
    PositionOutOfBounds {
        /// The rejected position.
        position: usize,
        /// Number of addressable items or segments.
        len: usize,
    },

    /// A child without stable ids was combined with a composite that requires them.
    #[error("stable ids required: {reason}")]
    StableIdsRequired {
        /// What was being attempted.
        reason: &'static str,
    },

    /// Every wrapped view-type segment has already been allocated.
    #[error("failed to allocate a wrapped view type segment (limit {limit})")]
    ViewTypeCapacityExhausted {
        /// Number of segments that can be allocated.
        limit: usize,
    },

    /// A view type was passed back that this translator never produced.
    #[error("corrupted composite view type {view_type:#010x}")]
    CorruptedViewType {
        /// The offending view type.
        view_type: ViewType,
    },

    /// Unwrapping then re-wrapping a position did not return the original.
    #[error("position {position} unwrapped to {unwrapped} but wrapped back to {rewrapped:?}")]
    PositionMismatch {
        /// Flat position that was unwrapped.
        position: usize,
        /// Local position reported by the wrapper.
        unwrapped: usize,
        /// Position produced by wrapping `unwrapped` again.
        rewrapped: Option<usize>,
    },

    /// The id reported by a wrapper does not carry the owning child's id.
    #[error("item id {wrapped:#x} at {position} does not wrap child id {raw:#x}")]
    ItemIdMismatch {
        /// Flat position queried.
        position: usize,
        /// Id reported by the wrapper.
        wrapped: ItemId,
        /// Id reported by the owning child.
        raw: ItemId,
    },

    /// The view type reported by a wrapper does not carry the owning child's view type.
    #[error("view type {wrapped:#010x} at {position} does not wrap child view type {raw:#010x}")]
    ViewTypeMismatch {
        /// Flat position queried.
        position: usize,
        /// View type reported by the wrapper.
        wrapped: ViewType,
        /// View type reported by the owning child.
        raw: ViewType,
    },

    /// A mutator was called while a clear or another mutation was in progress.
    #[error("{operation} called re-entrantly")]
    Reentrant {
        /// The rejected operation.
        operation: &'static str,
    },

    /// An operation was called on an adapter that has been released.
    #[error("{operation} called after release")]
    Released {
        /// The rejected operation.
        operation: &'static str,
    },

    /// Only single-item moves can be propagated.
    #[error("moved events must carry exactly one item (got {count})")]
    UnsupportedMoveCount {
        /// The reported item count.
        count: usize,
    },
}

impl AdapterError {
    /// Returns the coarse classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfRange { .. }
            | Self::ReservedValue { .. }
            | Self::PositionOutOfBounds { .. } => ErrorKind::Range,
            Self::StableIdsRequired { .. } => ErrorKind::Configuration,
            Self::ViewTypeCapacityExhausted { .. } => ErrorKind::Capacity,
            Self::CorruptedViewType { .. }
            | Self::PositionMismatch { .. }
            | Self::ItemIdMismatch { .. }
            | Self::ViewTypeMismatch { .. } => ErrorKind::Consistency,
            Self::Reentrant { .. } | Self::Released { .. } => ErrorKind::Reentrancy,
            Self::UnsupportedMoveCount { .. } => ErrorKind::ContractViolation,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::{AdapterError, BitField, ErrorKind};

    #[test]
    fn messages_name_the_field() {
        let err = AdapterError::OutOfRange {
            field: BitField::Segment,
            value: 128,
            min: 0,
            max: 127,
        };
        assert_eq!(err.to_string(), "segment 128 is out of range [0, 127]");
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn released_and_reentrant_share_a_kind() {
        let released = AdapterError::Released { operation: "bind" };
        let reentrant = AdapterError::Reentrant { operation: "clear" };
        assert_eq!(released.kind(), ErrorKind::Reentrancy);
        assert_eq!(reentrant.kind(), released.kind());
    }
}
