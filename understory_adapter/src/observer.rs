// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change events and the observer list every adapter exposes.
//!
//! ## Delivery
//!
//! Notifications are synchronous and delivered in registration order. There
//! is no batching: each call to [`ObserverList::notify`] reaches every
//! observer before it returns, and the first error stops delivery and is
//! returned to the notifier.
//!
//! Delivery iterates a snapshot, so an observer may register or unregister
//! observers (including itself) from inside a callback.
//!
//! ## Clearing
//!
//! [`ObserverList::clear`] calls [`AdapterObserver::on_detached`] on every
//! observer. While that is in progress, [`ObserverList::register`],
//! [`ObserverList::unregister`] and nested `clear` calls fail with
//! [`AdapterError::Reentrant`] and leave the list untouched.

use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use smallvec::SmallVec;

use crate::{AdapterError, Payload};

/// A mutation reported by an adapter, in that adapter's local positions.
#[derive(Clone, Debug)]
pub enum AdapterEvent {
    /// Anything may have changed; positions, ids and view types are all suspect.
    Changed,
    /// Items `start..start + count` changed in place.
    RangeChanged {
        /// First changed position.
        start: usize,
        /// Number of changed items.
        count: usize,
        /// Optional partial-bind payload.
        payload: Option<Payload>,
    },
    /// `count` items were inserted at `start`.
    RangeInserted {
        /// Position of the first inserted item.
        start: usize,
        /// Number of inserted items.
        count: usize,
    },
    /// `count` items were removed from `start`.
    RangeRemoved {
        /// Position of the first removed item.
        start: usize,
        /// Number of removed items.
        count: usize,
    },
    /// `count` items moved from `from` to `to`.
    ///
    /// Composing adapters only propagate `count == 1`.
    RangeMoved {
        /// Original position.
        from: usize,
        /// New position.
        to: usize,
        /// Number of moved items.
        count: usize,
    },
}

impl PartialEq for AdapterEvent {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Changed, Self::Changed) => true,
            (
                Self::RangeChanged {
                    start: a_start,
                    count: a_count,
                    payload: a_payload,
                },
                Self::RangeChanged {
                    start: b_start,
                    count: b_count,
                    payload: b_payload,
                },
            ) => {
                a_start == b_start
                    && a_count == b_count
                    && match (a_payload, b_payload) {
                        (None, None) => true,
                        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                        _ => false,
                    }
            }
            (
                Self::RangeInserted {
                    start: a_start,
                    count: a_count,
                },
                Self::RangeInserted {
                    start: b_start,
                    count: b_count,
                },
            )
            | (
                Self::RangeRemoved {
                    start: a_start,
                    count: a_count,
                },
                Self::RangeRemoved {
                    start: b_start,
                    count: b_count,
                },
            ) => a_start == b_start && a_count == b_count,
            (
                Self::RangeMoved {
                    from: a_from,
                    to: a_to,
                    count: a_count,
                },
                Self::RangeMoved {
                    from: b_from,
                    to: b_to,
                    count: b_count,
                },
            ) => a_from == b_from && a_to == b_to && a_count == b_count,
            _ => false,
        }
    }
}

/// Receives [`AdapterEvent`]s from an [`ObserverList`].
pub trait AdapterObserver {
    /// Called for every event reported by the observed adapter.
    fn on_adapter_event(&self, event: &AdapterEvent) -> Result<(), AdapterError>;

    /// Called when the observer is dropped from its list by [`ObserverList::clear`].
    fn on_detached(&self) {}
}

type Snapshot = SmallVec<[Rc<dyn AdapterObserver>; 4]>;

fn same_observer(a: &Rc<dyn AdapterObserver>, b: &Rc<dyn AdapterObserver>) -> bool {
    core::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Ordered list of observers attached to one adapter.
#[derive(Default)]
pub struct ObserverList {
    observers: RefCell<Snapshot>,
    performing_clear: Cell<bool>,
}

impl fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.len())
            .field("performing_clear", &self.performing_clear.get())
            .finish()
    }
}

impl ObserverList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.borrow().len()
    }

    /// Returns `true` if no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `observer` is registered.
    #[must_use]
    pub fn contains(&self, observer: &Rc<dyn AdapterObserver>) -> bool {
        self.observers
            .borrow()
            .iter()
            .any(|o| same_observer(o, observer))
    }

    fn check_not_clearing(&self, operation: &'static str) -> Result<(), AdapterError> {
        if self.performing_clear.get() {
            return Err(AdapterError::Reentrant { operation });
        }
        Ok(())
    }

    /// Appends `observer`. Returns `false` if it was already registered.
    pub fn register(&self, observer: Rc<dyn AdapterObserver>) -> Result<bool, AdapterError> {
        self.check_not_clearing("ObserverList::register")?;
        if self.contains(&observer) {
            return Ok(false);
        }
        self.observers.borrow_mut().push(observer);
        Ok(true)
    }

    /// Removes `observer`. Returns `false` if it was not registered.
    pub fn unregister(&self, observer: &Rc<dyn AdapterObserver>) -> Result<bool, AdapterError> {
        self.check_not_clearing("ObserverList::unregister")?;
        let mut observers = self.observers.borrow_mut();
        let Some(index) = observers.iter().position(|o| same_observer(o, observer)) else {
            return Ok(false);
        };
        observers.remove(index);
        Ok(true)
    }

    /// Removes every observer, calling [`AdapterObserver::on_detached`] on each.
    pub fn clear(&self) -> Result<(), AdapterError> {
        self.check_not_clearing("ObserverList::clear")?;
        self.performing_clear.set(true);
        let detached = core::mem::take(&mut *self.observers.borrow_mut());
        for observer in &detached {
            observer.on_detached();
        }
        self.performing_clear.set(false);
        Ok(())
    }

    /// Delivers `event` to every observer in registration order.
    pub fn notify(&self, event: &AdapterEvent) -> Result<(), AdapterError> {
        let snapshot = self.observers.borrow().clone();
        for observer in &snapshot {
            observer.on_adapter_event(event)?;
        }
        Ok(())
    }

    /// Notifies that the whole data set changed.
    pub fn notify_changed(&self) -> Result<(), AdapterError> {
        self.notify(&AdapterEvent::Changed)
    }

    /// Notifies that `count` items changed in place at `start`.
    pub fn notify_item_range_changed(&self, start: usize, count: usize) -> Result<(), AdapterError> {
        self.notify(&AdapterEvent::RangeChanged {
            start,
            count,
            payload: None,
        })
    }

    /// Notifies a partial change carrying `payload`.
    pub fn notify_item_range_changed_with_payload(
        &self,
        start: usize,
        count: usize,
        payload: Payload,
    ) -> Result<(), AdapterError> {
        self.notify(&AdapterEvent::RangeChanged {
            start,
            count,
            payload: Some(payload),
        })
    }

    /// Notifies that `count` items were inserted at `start`.
    pub fn notify_item_range_inserted(&self, start: usize, count: usize) -> Result<(), AdapterError> {
        self.notify(&AdapterEvent::RangeInserted { start, count })
    }

    /// Notifies that `count` items were removed at `start`.
    pub fn notify_item_range_removed(&self, start: usize, count: usize) -> Result<(), AdapterError> {
        self.notify(&AdapterEvent::RangeRemoved { start, count })
    }

    /// Notifies that one item moved from `from` to `to`.
    pub fn notify_item_moved(&self, from: usize, to: usize) -> Result<(), AdapterError> {
        self.notify_item_range_moved(from, to, 1)
    }

    /// Notifies that `count` items moved from `from` to `to`.
    pub fn notify_item_range_moved(
        &self,
        from: usize,
        to: usize,
        count: usize,
    ) -> Result<(), AdapterError> {
        self.notify(&AdapterEvent::RangeMoved { from, to, count })
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};

    use super::{AdapterEvent, AdapterObserver, ObserverList};
    use crate::{AdapterError, ErrorKind};

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<AdapterEvent>>,
        detached: Cell<usize>,
    }

    impl AdapterObserver for Recorder {
        fn on_adapter_event(&self, event: &AdapterEvent) -> Result<(), AdapterError> {
            self.events.borrow_mut().push(event.clone());
            Ok(())
        }

        fn on_detached(&self) {
            self.detached.set(self.detached.get() + 1);
        }
    }

    /// Tries to unregister a sibling while the list is being cleared.
    struct Meddler {
        list: Rc<ObserverList>,
        victim: Rc<dyn AdapterObserver>,
        outcome: RefCell<Option<Result<bool, AdapterError>>>,
    }

    impl AdapterObserver for Meddler {
        fn on_adapter_event(&self, _event: &AdapterEvent) -> Result<(), AdapterError> {
            Ok(())
        }

        fn on_detached(&self) {
            *self.outcome.borrow_mut() = Some(self.list.unregister(&self.victim));
        }
    }

    #[test]
    fn events_reach_observers_in_order() {
        let list = ObserverList::new();
        let first = Rc::new(Recorder::default());
        let second = Rc::new(Recorder::default());
        assert_eq!(list.register(first.clone()), Ok(true));
        assert_eq!(list.register(second.clone()), Ok(true));
        assert_eq!(list.register(first.clone()), Ok(false));

        list.notify_item_range_inserted(2, 3).unwrap();
        list.notify_item_moved(0, 4).unwrap();

        let expected = [
            AdapterEvent::RangeInserted { start: 2, count: 3 },
            AdapterEvent::RangeMoved {
                from: 0,
                to: 4,
                count: 1,
            },
        ];
        assert_eq!(first.events.borrow().as_slice(), &expected);
        assert_eq!(second.events.borrow().as_slice(), &expected);
    }

    #[test]
    fn unregister_stops_delivery() {
        let list = ObserverList::new();
        let recorder = Rc::new(Recorder::default());
        let handle: Rc<dyn AdapterObserver> = recorder.clone();
        list.register(handle.clone()).unwrap();
        assert_eq!(list.unregister(&handle), Ok(true));
        assert_eq!(list.unregister(&handle), Ok(false));
        list.notify_changed().unwrap();
        assert!(recorder.events.borrow().is_empty());
    }

    #[test]
    fn mutation_during_clear_is_rejected() {
        let list = Rc::new(ObserverList::new());
        let victim = Rc::new(Recorder::default());
        let victim_handle: Rc<dyn AdapterObserver> = victim.clone();
        let meddler = Rc::new(Meddler {
            list: list.clone(),
            victim: victim_handle.clone(),
            outcome: RefCell::new(None),
        });
        list.register(meddler.clone()).unwrap();
        list.register(victim_handle).unwrap();

        list.clear().unwrap();

        let outcome = meddler.outcome.borrow_mut().take().unwrap();
        assert_eq!(outcome.unwrap_err().kind(), ErrorKind::Reentrancy);
        // The clear still ran to completion over the untouched list.
        assert_eq!(victim.detached.get(), 1);
        assert!(list.is_empty());
        // And the list is usable again afterwards.
        assert_eq!(list.register(victim.clone()), Ok(true));
    }
}
