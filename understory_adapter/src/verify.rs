// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debug decorator that cross-checks a wrapper's position and id translation.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::{
    Adapter, AdapterError, AdapterPathSegment, ChildAdapter, ItemId, ObserverList, Payload,
    UnwrapResult, ViewType, WrapperAdapter, item_id, view_type,
};

bitflags::bitflags! {
    /// Invariants checked by a [`VerifyingAdapter`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct VerifyOptions: u8 {
        /// Unwrapping a position and wrapping it again yields the original.
        const POSITION  = 0b0000_0001;
        /// The wrapped part of an item id equals the owning child's.
        const ITEM_ID   = 0b0000_0010;
        /// The wrapped part of a view type equals the owning child's.
        const VIEW_TYPE = 0b0000_0100;
    }
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// Wraps a [`WrapperAdapter`] and verifies its translations on every query.
///
/// The decorator is transparent: it shares the inner adapter's observers,
/// and its own unwrap/wrap delegate straight to the inner adapter. A failed
/// check is logged at error level and returned as a consistency error.
pub struct VerifyingAdapter<H> {
    inner: Rc<dyn WrapperAdapter<H>>,
    options: VerifyOptions,
}

impl<H> fmt::Debug for VerifyingAdapter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyingAdapter")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<H: 'static> VerifyingAdapter<H> {
    /// Decorates `inner`, checking the invariants in `options`.
    pub fn new<A: WrapperAdapter<H> + 'static>(inner: Rc<A>, options: VerifyOptions) -> Self {
        Self {
            inner,
            options,
        }
    }

    /// The decorated adapter.
    #[must_use]
    pub fn inner(&self) -> &Rc<dyn WrapperAdapter<H>> {
        &self.inner
    }

    /// The checked invariants.
    #[must_use]
    pub fn options(&self) -> VerifyOptions {
        self.options
    }

    fn unwrap_checked(&self, position: usize) -> Result<Option<UnwrapResult<H>>, AdapterError> {
        let Some(unwrapped) = self.inner.unwrap_position(position)? else {
            return Ok(None);
        };
        if self.options.contains(VerifyOptions::POSITION) {
            let segment = AdapterPathSegment {
                adapter: unwrapped.adapter.clone(),
                tag: unwrapped.tag,
            };
            let rewrapped = self.inner.wrap_position(&segment, unwrapped.position)?;
            if rewrapped != Some(position) {
                let err = AdapterError::PositionMismatch {
                    position,
                    unwrapped: unwrapped.position,
                    rewrapped,
                };
                tracing::error!(%err, "position verification failed");
                return Err(err);
            }
        }
        Ok(Some(unwrapped))
    }
}

impl<H: 'static> Adapter<H> for VerifyingAdapter<H> {
    fn item_count(&self) -> usize {
        self.inner.item_count()
    }

    fn item_id(&self, position: usize) -> Result<ItemId, AdapterError> {
        let wrapped = self.inner.item_id(position)?;
        let Some(owner) = self.unwrap_checked(position)? else {
            return Ok(wrapped);
        };
        if self.options.contains(VerifyOptions::ITEM_ID) {
            let raw = owner.adapter.adapter().item_id(owner.position)?;
            if item_id::extract_wrapped_id(wrapped) != item_id::extract_wrapped_id(raw) {
                let err = AdapterError::ItemIdMismatch {
                    position,
                    wrapped,
                    raw,
                };
                tracing::error!(%err, "item id verification failed");
                return Err(err);
            }
        }
        Ok(wrapped)
    }

    fn item_view_type(&self, position: usize) -> Result<ViewType, AdapterError> {
        let wrapped = self.inner.item_view_type(position)?;
        let Some(owner) = self.unwrap_checked(position)? else {
            return Ok(wrapped);
        };
        if self.options.contains(VerifyOptions::VIEW_TYPE) {
            let raw = owner.adapter.adapter().item_view_type(owner.position)?;
            if view_type::extract_wrapped(wrapped) != view_type::extract_wrapped(raw) {
                let err = AdapterError::ViewTypeMismatch {
                    position,
                    wrapped,
                    raw,
                };
                tracing::error!(%err, "view type verification failed");
                return Err(err);
            }
        }
        Ok(wrapped)
    }

    fn has_stable_ids(&self) -> bool {
        self.inner.has_stable_ids()
    }

    fn create_view_holder(&self, view_type: ViewType) -> Result<H, AdapterError> {
        self.inner.create_view_holder(view_type)
    }

    fn bind_view_holder(
        &self,
        holder: &mut H,
        position: usize,
        payloads: &[Payload],
    ) -> Result<(), AdapterError> {
        self.unwrap_checked(position)?;
        self.inner.bind_view_holder(holder, position, payloads)
    }

    fn observers(&self) -> &ObserverList {
        self.inner.observers()
    }

    fn on_view_attached(&self, holder: &mut H, view_type: ViewType) -> Result<(), AdapterError> {
        self.inner.on_view_attached(holder, view_type)
    }

    fn on_view_detached(&self, holder: &mut H, view_type: ViewType) -> Result<(), AdapterError> {
        self.inner.on_view_detached(holder, view_type)
    }

    fn on_view_recycled(&self, holder: &mut H, view_type: ViewType) -> Result<(), AdapterError> {
        self.inner.on_view_recycled(holder, view_type)
    }

    fn on_failed_to_recycle_view(
        &self,
        holder: &mut H,
        view_type: ViewType,
    ) -> Result<bool, AdapterError> {
        self.inner.on_failed_to_recycle_view(holder, view_type)
    }
}

impl<H: 'static> WrapperAdapter<H> for VerifyingAdapter<H> {
    fn unwrap_position(&self, position: usize) -> Result<Option<UnwrapResult<H>>, AdapterError> {
        self.unwrap_checked(position)
    }

    fn wrap_position(
        &self,
        segment: &AdapterPathSegment<H>,
        position: usize,
    ) -> Result<Option<usize>, AdapterError> {
        self.inner.wrap_position(segment, position)
    }

    fn wrapped_adapters(&self) -> Vec<ChildAdapter<H>> {
        self.inner.wrapped_adapters()
    }

    fn release(&self) {
        self.inner.release();
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::{VerifyOptions, VerifyingAdapter};
    use crate::test_support::{Holder, TestAdapter};
    use crate::{
        Adapter, AdapterError, AdapterPathSegment, ChildAdapter, CompositeAdapter, ErrorKind,
        ItemId, ObserverList, Payload, UnwrapResult, ViewType, WrapperAdapter,
    };

    /// Wraps one child but reports every id and position one step off.
    struct Skewed {
        child: Rc<TestAdapter>,
        observers: ObserverList,
    }

    impl Adapter<Holder> for Skewed {
        fn item_count(&self) -> usize {
            self.child.item_count()
        }

        fn item_id(&self, position: usize) -> Result<ItemId, AdapterError> {
            Ok(self.child.item_id(position)? + 1)
        }

        fn item_view_type(&self, position: usize) -> Result<ViewType, AdapterError> {
            self.child.item_view_type(position)
        }

        fn create_view_holder(&self, view_type: ViewType) -> Result<Holder, AdapterError> {
            self.child.create_view_holder(view_type)
        }

        fn bind_view_holder(
            &self,
            holder: &mut Holder,
            position: usize,
            payloads: &[Payload],
        ) -> Result<(), AdapterError> {
            self.child.bind_view_holder(holder, position, payloads)
        }

        fn observers(&self) -> &ObserverList {
            &self.observers
        }
    }

    impl WrapperAdapter<Holder> for Skewed {
        fn unwrap_position(
            &self,
            position: usize,
        ) -> Result<Option<UnwrapResult<Holder>>, AdapterError> {
            Ok(Some(UnwrapResult {
                adapter: ChildAdapter::plain(self.child.clone()),
                position,
                tag: None,
            }))
        }

        fn wrap_position(
            &self,
            _segment: &AdapterPathSegment<Holder>,
            position: usize,
        ) -> Result<Option<usize>, AdapterError> {
            Ok(Some(position + 1))
        }

        fn wrapped_adapters(&self) -> Vec<ChildAdapter<Holder>> {
            vec![ChildAdapter::plain(self.child.clone())]
        }

        fn release(&self) {}
    }

    fn skewed() -> Rc<Skewed> {
        Rc::new(Skewed {
            child: TestAdapter::with_stable_ids(3, 40),
            observers: ObserverList::new(),
        })
    }

    #[test]
    fn consistent_composite_passes() {
        let composite = CompositeAdapter::<Holder>::new();
        composite
            .add_adapter(ChildAdapter::plain(TestAdapter::with_stable_ids(2, 10)))
            .unwrap();
        composite
            .add_adapter(ChildAdapter::plain(TestAdapter::with_stable_ids(3, 20)))
            .unwrap();
        let verifier = VerifyingAdapter::new(composite, VerifyOptions::default());
        for position in 0..5 {
            verifier.item_id(position).unwrap();
            verifier.item_view_type(position).unwrap();
            let mut holder = Holder::default();
            verifier.bind_view_holder(&mut holder, position, &[]).unwrap();
        }
    }

    #[test]
    fn skewed_positions_are_reported() {
        let verifier = VerifyingAdapter::new(skewed(), VerifyOptions::POSITION);
        let err = verifier.item_view_type(1).unwrap_err();
        assert_eq!(
            err,
            AdapterError::PositionMismatch {
                position: 1,
                unwrapped: 1,
                rewrapped: Some(2)
            }
        );
        assert_eq!(err.kind(), ErrorKind::Consistency);
    }

    #[test]
    fn skewed_ids_are_reported() {
        let verifier = VerifyingAdapter::new(skewed(), VerifyOptions::ITEM_ID);
        assert_eq!(
            verifier.item_id(0),
            Err(AdapterError::ItemIdMismatch {
                position: 0,
                wrapped: 41,
                raw: 40
            })
        );
        // Only the selected invariants are checked.
        assert_eq!(verifier.item_view_type(0), Ok(0));
    }
}
