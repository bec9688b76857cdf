// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The ordered set of children of a composing adapter.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;

use crate::{
    AdapterError, AdapterKey, AdapterObserver, BridgeSubscriber, ChangeBridge, ChildAdapter,
    ChildTag, SegmentSource,
};

struct Segment<H> {
    tag: ChildTag,
    adapter: ChildAdapter<H>,
}

struct Subscription<H> {
    adapter: ChildAdapter<H>,
    bridge: Rc<ChangeBridge>,
}

impl<H> Subscription<H> {
    fn observer(&self) -> Rc<dyn AdapterObserver> {
        self.bridge.clone()
    }
}

/// Ordered children of a composite, one segment per registration.
///
/// The same adapter instance may be registered several times; each
/// registration is its own segment with its own [`ChildTag`], but the
/// instance is observed through a single [`ChangeBridge`]. The bridge is
/// unregistered once the last tag referring to the instance is removed.
pub struct SegmentMultiplexer<H> {
    subscriber: Weak<dyn BridgeSubscriber>,
    segments: Vec<Segment<H>>,
    subscriptions: Vec<Subscription<H>>,
    next_tag: u64,
}

impl<H> fmt::Debug for SegmentMultiplexer<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentMultiplexer")
            .field(
                "segments",
                &self.segments.iter().map(|s| s.tag).collect::<Vec<_>>(),
            )
            .field("unique_adapters", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl<H> SegmentMultiplexer<H> {
    /// Creates an empty set whose bridges forward to `subscriber`.
    #[must_use]
    pub fn new(subscriber: Weak<dyn BridgeSubscriber>) -> Self {
        Self {
            subscriber,
            segments: Vec::new(),
            subscriptions: Vec::new(),
            next_tag: 1,
        }
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if there are no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Registers `adapter` as a new segment at `position`.
    ///
    /// The first registration of an instance attaches a bridge to it.
    pub fn add(&mut self, adapter: ChildAdapter<H>, position: usize) -> Result<ChildTag, AdapterError> {
        if position > self.segments.len() {
            return Err(AdapterError::PositionOutOfBounds {
                position,
                len: self.segments.len(),
            });
        }
        let key = adapter.key();
        let tag = ChildTag(self.next_tag);

        match self.subscription_index(key) {
            Some(index) => {
                let subscription = &self.subscriptions[index];
                if !subscription.bridge.is_attached() {
                    adapter.adapter().observers().register(subscription.observer())?;
                    subscription.bridge.set_attached(true);
                    tracing::debug!(source = ?key, "re-registered detached change bridge");
                }
                subscription.bridge.add_tag(tag);
            }
            None => {
                let bridge = ChangeBridge::new(key, self.subscriber.clone());
                bridge.add_tag(tag);
                let subscription = Subscription {
                    adapter: adapter.clone(),
                    bridge,
                };
                adapter.adapter().observers().register(subscription.observer())?;
                subscription.bridge.set_attached(true);
                tracing::debug!(source = ?key, "registered change bridge");
                self.subscriptions.push(subscription);
            }
        }

        self.next_tag += 1;
        self.segments.insert(position, Segment { tag, adapter });
        Ok(tag)
    }

    /// Removes the segment tagged `tag`, returning its adapter.
    ///
    /// Returns `Ok(None)` if `tag` is unknown.
    pub fn remove(&mut self, tag: ChildTag) -> Result<Option<ChildAdapter<H>>, AdapterError> {
        let Some(segment) = self.segment_of(tag) else {
            return Ok(None);
        };
        let key = self.segments[segment].adapter.key();
        if let Some(index) = self.subscription_index(key) {
            let subscription = &self.subscriptions[index];
            let last = subscription.bridge.tags().as_slice() == [tag];
            if last {
                // Unregister before touching any bookkeeping so a failure
                // leaves the segment fully bridged.
                subscription
                    .adapter
                    .adapter()
                    .observers()
                    .unregister(&subscription.observer())?;
                subscription.bridge.set_attached(false);
                tracing::debug!(source = ?key, "unregistered change bridge");
            }
            subscription.bridge.remove_tag(tag);
            if last {
                self.subscriptions.remove(index);
            }
        }
        Ok(Some(self.segments.remove(segment).adapter))
    }

    /// Index of the segment tagged `tag`.
    #[must_use]
    pub fn segment_of(&self, tag: ChildTag) -> Option<usize> {
        self.segments.iter().position(|s| s.tag == tag)
    }

    /// Adapter of `segment`.
    #[must_use]
    pub fn adapter(&self, segment: usize) -> Option<&ChildAdapter<H>> {
        self.segments.get(segment).map(|s| &s.adapter)
    }

    /// Tag of `segment`.
    #[must_use]
    pub fn tag(&self, segment: usize) -> Option<ChildTag> {
        self.segments.get(segment).map(|s| s.tag)
    }

    /// Tags bound to the instance `key`, in segment order.
    #[must_use]
    pub fn tags_of(&self, key: AdapterKey) -> SmallVec<[ChildTag; 2]> {
        self.segments
            .iter()
            .filter(|s| s.adapter.key() == key)
            .map(|s| s.tag)
            .collect()
    }

    /// Every registered adapter, one entry per segment.
    pub fn adapters(&self) -> impl Iterator<Item = &ChildAdapter<H>> {
        self.segments.iter().map(|s| &s.adapter)
    }

    /// Each registered instance once, in order of first registration.
    pub fn unique_adapters(&self) -> impl Iterator<Item = &ChildAdapter<H>> {
        self.subscriptions.iter().map(|s| &s.adapter)
    }

    /// Detaches every bridge and forgets every segment. Idempotent.
    pub fn release(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            // A failure here means the child is mid-clear and is dropping
            // its observers anyway.
            let _ = subscription
                .adapter
                .adapter()
                .observers()
                .unregister(&subscription.observer());
        }
        self.segments.clear();
    }

    /// Returns `true` if `key` is registered but its bridge was dropped by
    /// the child's [`ObserverList::clear`](crate::ObserverList::clear).
    ///
    /// Events from such a child have been missed since the clear.
    #[must_use]
    pub fn is_detached(&self, key: AdapterKey) -> bool {
        self.subscription_index(key)
            .is_some_and(|index| !self.subscriptions[index].bridge.is_attached())
    }

    fn subscription_index(&self, key: AdapterKey) -> Option<usize> {
        self.subscriptions.iter().position(|s| s.adapter.key() == key)
    }
}

impl<H> SegmentSource for SegmentMultiplexer<H> {
    fn segment_count(&self) -> usize {
        self.segments.len()
    }

    fn segment_item_count(&self, segment: usize) -> usize {
        self.segments
            .get(segment)
            .map_or(0, |s| s.adapter.adapter().item_count())
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::{Rc, Weak};

    use super::SegmentMultiplexer;
    use crate::test_support::{Holder, NullSubscriber, TestAdapter};
    use crate::{AdapterError, BridgeSubscriber, ChildAdapter, SegmentSource};

    fn multiplexer() -> (Rc<NullSubscriber>, SegmentMultiplexer<Holder>) {
        let subscriber = Rc::new(NullSubscriber);
        let weak: Weak<dyn BridgeSubscriber> = Rc::downgrade(&subscriber) as Weak<dyn BridgeSubscriber>;
        (subscriber, SegmentMultiplexer::new(weak))
    }

    #[test]
    fn shared_adapters_are_bridged_once() {
        let (_sub, mut mux) = multiplexer();
        let a = TestAdapter::new(3);
        let b = TestAdapter::new(2);

        let t1 = mux.add(ChildAdapter::plain(a.clone()), 0).unwrap();
        let t2 = mux.add(ChildAdapter::plain(b.clone()), 1).unwrap();
        let t3 = mux.add(ChildAdapter::plain(a.clone()), 1).unwrap();

        assert_eq!(mux.len(), 3);
        assert_eq!(a.observers.len(), 1);
        assert_eq!(b.observers.len(), 1);
        assert_eq!(mux.segment_of(t1), Some(0));
        assert_eq!(mux.segment_of(t3), Some(1));
        assert_eq!(mux.segment_of(t2), Some(2));
        assert_eq!(mux.unique_adapters().count(), 2);
        assert_eq!(mux.segment_item_count(1), 3);

        let removed = mux.remove(t1).unwrap().unwrap();
        assert!(removed.same_adapter(&ChildAdapter::plain(a.clone())));
        assert_eq!(a.observers.len(), 1, "a is still referenced by t3");
        mux.remove(t3).unwrap();
        assert_eq!(a.observers.len(), 0);
        assert!(mux.remove(t3).unwrap().is_none());
        assert_eq!(mux.segment_of(t2), Some(0));
    }

    #[test]
    fn cleared_bridge_is_registered_again_on_readd() {
        let (_sub, mut mux) = multiplexer();
        let a = TestAdapter::new(2);
        let key = ChildAdapter::<Holder>::plain(a.clone()).key();
        let first = mux.add(ChildAdapter::plain(a.clone()), 0).unwrap();
        assert!(!mux.is_detached(key));

        a.observers.clear().unwrap();
        assert!(mux.is_detached(key));

        let second = mux.add(ChildAdapter::plain(a.clone()), 1).unwrap();
        assert!(!mux.is_detached(key));
        assert_eq!(a.observers.len(), 1);
        assert_eq!(mux.unique_adapters().count(), 1);

        mux.remove(first).unwrap();
        assert_eq!(a.observers.len(), 1);
        mux.remove(second).unwrap();
        assert!(a.observers.is_empty());
    }

    #[test]
    fn insertion_past_the_end_is_rejected() {
        let (_sub, mut mux) = multiplexer();
        let a = TestAdapter::new(1);
        assert_eq!(
            mux.add(ChildAdapter::plain(a.clone()), 1),
            Err(AdapterError::PositionOutOfBounds { position: 1, len: 0 })
        );
        assert!(a.observers.is_empty());
        assert!(mux.is_empty());
    }

    #[test]
    fn release_detaches_everything_and_is_idempotent() {
        let (_sub, mut mux) = multiplexer();
        let a = TestAdapter::new(1);
        let b = TestAdapter::new(1);
        mux.add(ChildAdapter::plain(a.clone()), 0).unwrap();
        mux.add(ChildAdapter::plain(b.clone()), 1).unwrap();
        mux.release();
        mux.release();
        assert!(mux.is_empty());
        assert!(a.observers.is_empty());
        assert!(b.observers.is_empty());
    }
}
