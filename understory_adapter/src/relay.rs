// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-child pass-through adapter.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::{
    Adapter, AdapterError, AdapterEvent, AdapterKey, AdapterObserver, AdapterPathSegment,
    BridgeSubscriber, ChangeBridge, ChildAdapter, ChildTag, ItemId, ObserverList, Payload,
    UnwrapResult, ViewType, WrapperAdapter,
};

/// Wraps exactly one adapter and relays its contract unchanged.
///
/// Positions, ids and view types pass straight through, and so do the
/// child's events (moves must still carry a single item). This is the base
/// case for adapters that decorate one child without segmenting it.
///
/// [`WrapperAdapter::release`] detaches from the child and drops the relay's
/// handle to it; every later call fails with [`AdapterError::Released`].
pub struct SimpleRelayAdapter<H> {
    child: RefCell<Option<ChildAdapter<H>>>,
    bridge: Rc<ChangeBridge>,
    observers: ObserverList,
}

impl<H> fmt::Debug for SimpleRelayAdapter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleRelayAdapter")
            .field("child", &self.child.borrow())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl<H: 'static> SimpleRelayAdapter<H> {
    /// Wraps `child` and starts observing it.
    pub fn new(child: ChildAdapter<H>) -> Result<Rc<Self>, AdapterError> {
        let relay = Rc::new_cyclic(|this: &Weak<Self>| {
            let subscriber: Weak<dyn BridgeSubscriber> = this.clone();
            Self {
                bridge: ChangeBridge::new(child.key(), subscriber),
                child: RefCell::new(Some(child.clone())),
                observers: ObserverList::new(),
            }
        });
        child.adapter().observers().register(relay.bridge_observer())?;
        Ok(relay)
    }

    /// The wrapped adapter, or `None` once released.
    #[must_use]
    pub fn wrapped_adapter(&self) -> Option<ChildAdapter<H>> {
        self.child.borrow().clone()
    }

    /// Returns `true` while the relay still holds its child.
    #[must_use]
    pub fn is_wrapped_adapter_alive(&self) -> bool {
        self.child.borrow().is_some()
    }

    fn bridge_observer(&self) -> Rc<dyn AdapterObserver> {
        self.bridge.clone()
    }

    fn child(&self, operation: &'static str) -> Result<ChildAdapter<H>, AdapterError> {
        self.child
            .borrow()
            .clone()
            .ok_or(AdapterError::Released { operation })
    }
}

impl<H: 'static> Adapter<H> for SimpleRelayAdapter<H> {
    fn item_count(&self) -> usize {
        self.child
            .borrow()
            .as_ref()
            .map_or(0, |c| c.adapter().item_count())
    }

    fn item_id(&self, position: usize) -> Result<ItemId, AdapterError> {
        self.child("item_id")?.adapter().item_id(position)
    }

    fn item_view_type(&self, position: usize) -> Result<ViewType, AdapterError> {
        self.child("item_view_type")?.adapter().item_view_type(position)
    }

    fn has_stable_ids(&self) -> bool {
        self.child
            .borrow()
            .as_ref()
            .is_some_and(|c| c.adapter().has_stable_ids())
    }

    fn create_view_holder(&self, view_type: ViewType) -> Result<H, AdapterError> {
        self.child("create_view_holder")?
            .adapter()
            .create_view_holder(view_type)
    }

    fn bind_view_holder(
        &self,
        holder: &mut H,
        position: usize,
        payloads: &[Payload],
    ) -> Result<(), AdapterError> {
        self.child("bind_view_holder")?
            .adapter()
            .bind_view_holder(holder, position, payloads)
    }

    fn observers(&self) -> &ObserverList {
        &self.observers
    }

    fn on_view_attached(&self, holder: &mut H, view_type: ViewType) -> Result<(), AdapterError> {
        self.child("on_view_attached")?
            .adapter()
            .on_view_attached(holder, view_type)
    }

    fn on_view_detached(&self, holder: &mut H, view_type: ViewType) -> Result<(), AdapterError> {
        self.child("on_view_detached")?
            .adapter()
            .on_view_detached(holder, view_type)
    }

    fn on_view_recycled(&self, holder: &mut H, view_type: ViewType) -> Result<(), AdapterError> {
        self.child("on_view_recycled")?
            .adapter()
            .on_view_recycled(holder, view_type)
    }

    fn on_failed_to_recycle_view(
        &self,
        holder: &mut H,
        view_type: ViewType,
    ) -> Result<bool, AdapterError> {
        self.child("on_failed_to_recycle_view")?
            .adapter()
            .on_failed_to_recycle_view(holder, view_type)
    }
}

impl<H: 'static> WrapperAdapter<H> for SimpleRelayAdapter<H> {
    fn unwrap_position(&self, position: usize) -> Result<Option<UnwrapResult<H>>, AdapterError> {
        Ok(Some(UnwrapResult {
            adapter: self.child("unwrap_position")?,
            position,
            tag: None,
        }))
    }

    fn wrap_position(
        &self,
        segment: &AdapterPathSegment<H>,
        position: usize,
    ) -> Result<Option<usize>, AdapterError> {
        let child = self.child("wrap_position")?;
        Ok(segment.adapter.same_adapter(&child).then_some(position))
    }

    fn wrapped_adapters(&self) -> Vec<ChildAdapter<H>> {
        self.child.borrow().iter().cloned().collect()
    }

    fn release(&self) {
        let Some(child) = self.child.borrow_mut().take() else {
            return;
        };
        if let Err(err) = child.adapter().observers().unregister(&self.bridge_observer()) {
            tracing::warn!(%err, "failed to detach relay from its child");
        }
        tracing::debug!(child = ?child.key(), "released relay adapter");
    }
}

impl<H: 'static> BridgeSubscriber for SimpleRelayAdapter<H> {
    fn on_bridged_event(
        &self,
        _source: AdapterKey,
        _tags: &[ChildTag],
        event: &AdapterEvent,
    ) -> Result<(), AdapterError> {
        if !self.is_wrapped_adapter_alive() {
            return Ok(());
        }
        if let AdapterEvent::RangeMoved { count, .. } = *event
            && count != 1
        {
            return Err(AdapterError::UnsupportedMoveCount { count });
        }
        self.observers.notify(event)
    }
}
