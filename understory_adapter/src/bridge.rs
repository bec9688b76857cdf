// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Forwarding of a child adapter's events to the adapter that composes it.

use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};
use core::fmt;

use smallvec::SmallVec;

use crate::{AdapterError, AdapterEvent, AdapterKey, AdapterObserver, ChildTag};

/// Receiver of events forwarded by a [`ChangeBridge`].
pub trait BridgeSubscriber {
    /// Handles `event` reported by the adapter `source`.
    ///
    /// `tags` are the provenance tags currently bound to `source` in the
    /// subscriber; empty for single-child wrappers.
    fn on_bridged_event(
        &self,
        source: AdapterKey,
        tags: &[ChildTag],
        event: &AdapterEvent,
    ) -> Result<(), AdapterError>;
}

/// Observer registered on one child adapter on behalf of one composing adapter.
///
/// The bridge is owned by the composing adapter's bookkeeping and registered
/// on the child for as long as at least one tag refers to it. Its handle to
/// the subscriber is weak, so a dropped subscriber simply stops receiving.
///
/// A bridge dropped by the child's [`ObserverList::clear`] marks itself
/// detached and must be registered again before it forwards anything.
///
/// [`ObserverList::clear`]: crate::ObserverList::clear
pub struct ChangeBridge {
    source: AdapterKey,
    tags: RefCell<SmallVec<[ChildTag; 2]>>,
    subscriber: Weak<dyn BridgeSubscriber>,
    attached: Cell<bool>,
}

impl fmt::Debug for ChangeBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeBridge")
            .field("source", &self.source)
            .field("tags", &self.tags.borrow())
            .field("attached", &self.attached.get())
            .field("subscriber_alive", &(self.subscriber.strong_count() > 0))
            .finish()
    }
}

impl ChangeBridge {
    /// Creates a bridge from `source` to `subscriber` with no tags.
    #[must_use]
    pub fn new(source: AdapterKey, subscriber: Weak<dyn BridgeSubscriber>) -> Rc<Self> {
        Rc::new(Self {
            source,
            tags: RefCell::new(SmallVec::new()),
            subscriber,
            attached: Cell::new(false),
        })
    }

    /// The observed adapter.
    #[must_use]
    pub fn source(&self) -> AdapterKey {
        self.source
    }

    /// Returns `true` while the bridge sits in its source's observer list.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    /// Records that the bridge was registered on, or unregistered from, its source.
    pub fn set_attached(&self, attached: bool) {
        self.attached.set(attached);
    }

    /// Binds another occurrence of the source adapter.
    pub fn add_tag(&self, tag: ChildTag) {
        let mut tags = self.tags.borrow_mut();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    /// Unbinds an occurrence. Returns `false` if `tag` was not bound.
    pub fn remove_tag(&self, tag: ChildTag) -> bool {
        let mut tags = self.tags.borrow_mut();
        let Some(index) = tags.iter().position(|t| *t == tag) else {
            return false;
        };
        tags.remove(index);
        true
    }

    /// Tags currently bound to the source adapter.
    #[must_use]
    pub fn tags(&self) -> SmallVec<[ChildTag; 2]> {
        self.tags.borrow().clone()
    }

    /// Returns `true` if no tag is bound.
    #[must_use]
    pub fn has_tags(&self) -> bool {
        !self.tags.borrow().is_empty()
    }
}

impl AdapterObserver for ChangeBridge {
    fn on_adapter_event(&self, event: &AdapterEvent) -> Result<(), AdapterError> {
        let Some(subscriber) = self.subscriber.upgrade() else {
            return Ok(());
        };
        // Copy the tags out so the subscriber may add or remove children.
        let tags = self.tags();
        subscriber.on_bridged_event(self.source, &tags, event)
    }

    fn on_detached(&self) {
        tracing::debug!(source = ?self.source, "change bridge detached by clear");
        self.attached.set(false);
    }
}
