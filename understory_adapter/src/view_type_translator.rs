// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dense allocation of view-type segments for a composing adapter.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::view_type::{self, MAX_SEGMENT};
use crate::{AdapterError, ViewType};

/// A view type split into the composite segment that produced it and the
/// child's own view type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UnwrappedViewType {
    /// Index of the composite segment that owns the view type.
    pub segment: usize,
    /// The view type as the child reported it.
    pub view_type: ViewType,
}

/// Maps `(composite segment, child view-type segment)` pairs onto the 7-bit
/// segment field of a view type.
///
/// Nested composition can produce far more pairs than the field can hold, so
/// values are allocated on demand, starting at 1. The map only grows: it lives
/// as long as the composing adapter and is never pruned. Once all 127 values
/// are in use, further pairs fail with
/// [`AdapterError::ViewTypeCapacityExhausted`].
#[derive(Clone, Debug, Default)]
pub struct SegmentedViewTypeTranslator {
    wrap: HashMap<(usize, usize), usize>,
    unwrap: Vec<(usize, usize)>,
}

impl SegmentedViewTypeTranslator {
    /// Creates a translator with nothing allocated.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocated segment values.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.unwrap.len()
    }

    /// Stamps a child's `view_type` with the value allocated for `segment`.
    pub fn wrap_item_view_type(
        &mut self,
        segment: usize,
        view_type: ViewType,
    ) -> Result<ViewType, AdapterError> {
        let key = (segment, view_type::extract_segment(view_type));
        let flattened = match self.wrap.get(&key) {
            Some(&flattened) => flattened,
            None => {
                let flattened = self.unwrap.len() + 1;
                if flattened > MAX_SEGMENT {
                    return Err(AdapterError::ViewTypeCapacityExhausted {
                        limit: MAX_SEGMENT,
                    });
                }
                tracing::trace!(
                    segment,
                    child_segment = key.1,
                    flattened,
                    "allocated view type segment"
                );
                self.wrap.insert(key, flattened);
                self.unwrap.push(key);
                flattened
            }
        };
        view_type::compose_segment(flattened, view_type)
    }

    /// Recovers the composite segment and the child's view type.
    ///
    /// Fails with [`AdapterError::CorruptedViewType`] if `view_type` was not
    /// produced by [`SegmentedViewTypeTranslator::wrap_item_view_type`].
    pub fn unwrap_view_type(&self, view_type: ViewType) -> Result<UnwrappedViewType, AdapterError> {
        let flattened = view_type::extract_segment(view_type);
        let Some(&(segment, child_segment)) = flattened
            .checked_sub(1)
            .and_then(|index| self.unwrap.get(index))
        else {
            return Err(AdapterError::CorruptedViewType { view_type });
        };
        Ok(UnwrappedViewType {
            segment,
            view_type: view_type::compose_segment_unchecked(child_segment, view_type),
        })
    }

    /// Forgets every allocation.
    pub fn clear(&mut self) {
        self.wrap.clear();
        self.unwrap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{SegmentedViewTypeTranslator, UnwrappedViewType};
    use crate::view_type;
    use crate::{AdapterError, ErrorKind};

    #[test]
    fn wraps_and_unwraps_child_view_types() {
        let mut translator = SegmentedViewTypeTranslator::new();
        let a = translator.wrap_item_view_type(0, 7).unwrap();
        let b = translator.wrap_item_view_type(2, -4).unwrap();
        let a_again = translator.wrap_item_view_type(0, 9).unwrap();
        assert_eq!(translator.allocated(), 2);
        assert_eq!(view_type::extract_segment(a), 1);
        assert_eq!(view_type::extract_segment(a_again), 1);
        assert_eq!(view_type::extract_segment(b), 2);

        assert_eq!(
            translator.unwrap_view_type(b),
            Ok(UnwrappedViewType {
                segment: 2,
                view_type: -4
            })
        );
        assert_eq!(translator.unwrap_view_type(a_again).unwrap().view_type, 9);
    }

    #[test]
    fn nested_child_segments_get_their_own_value() {
        let mut translator = SegmentedViewTypeTranslator::new();
        let inner = view_type::compose_segment(5, 3).unwrap();
        let wrapped = translator.wrap_item_view_type(1, inner).unwrap();
        let plain = translator.wrap_item_view_type(1, 3).unwrap();
        assert_ne!(wrapped, plain);
        assert_eq!(translator.unwrap_view_type(wrapped).unwrap().view_type, inner);
    }

    #[test]
    fn capacity_is_limited_to_the_segment_field() {
        let mut translator = SegmentedViewTypeTranslator::new();
        for segment in 0..127 {
            translator.wrap_item_view_type(segment, 0).unwrap();
        }
        let err = translator.wrap_item_view_type(127, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Capacity);
        // Already-allocated pairs keep working.
        assert!(translator.wrap_item_view_type(126, 1).is_ok());
    }

    #[test]
    fn unknown_segments_are_reported() {
        let translator = SegmentedViewTypeTranslator::new();
        assert_eq!(
            translator.unwrap_view_type(0),
            Err(AdapterError::CorruptedViewType { view_type: 0 })
        );
        let forged = view_type::compose_segment(9, 0).unwrap();
        assert_eq!(
            translator.unwrap_view_type(forged).unwrap_err().kind(),
            ErrorKind::Consistency
        );
    }
}
