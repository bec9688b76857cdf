// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixtures shared by the unit tests.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::{
    Adapter, AdapterError, AdapterEvent, AdapterKey, AdapterObserver, BridgeSubscriber, ChildTag,
    ItemId, NO_ID, ObserverList, Payload, ViewType,
};

#[derive(Debug, Default)]
pub(crate) struct Holder {
    pub(crate) view_type: ViewType,
    pub(crate) created_by: ItemId,
    pub(crate) position: Option<usize>,
}

/// A data adapter whose count and view type can be changed from the test.
///
/// Ids are `id_base + position` when stable ids are enabled.
#[derive(Debug)]
pub(crate) struct TestAdapter {
    count: Cell<usize>,
    stable_ids: bool,
    id_base: ItemId,
    pub(crate) view_type: Cell<ViewType>,
    pub(crate) observers: ObserverList,
    pub(crate) bound: RefCell<Vec<usize>>,
    pub(crate) recycled: RefCell<Vec<ViewType>>,
}

impl TestAdapter {
    pub(crate) fn new(count: usize) -> Rc<Self> {
        Self::build(count, false, 0)
    }

    pub(crate) fn with_stable_ids(count: usize, id_base: ItemId) -> Rc<Self> {
        Self::build(count, true, id_base)
    }

    fn build(count: usize, stable_ids: bool, id_base: ItemId) -> Rc<Self> {
        Rc::new(Self {
            count: Cell::new(count),
            stable_ids,
            id_base,
            view_type: Cell::new(0),
            observers: ObserverList::new(),
            bound: RefCell::new(Vec::new()),
            recycled: RefCell::new(Vec::new()),
        })
    }

    pub(crate) fn set_count(&self, count: usize) {
        self.count.set(count);
    }
}

impl Adapter<Holder> for TestAdapter {
    fn item_count(&self) -> usize {
        self.count.get()
    }

    fn item_id(&self, position: usize) -> Result<ItemId, AdapterError> {
        if !self.stable_ids {
            return Ok(NO_ID);
        }
        Ok(self.id_base + i64::try_from(position).unwrap())
    }

    fn item_view_type(&self, _position: usize) -> Result<ViewType, AdapterError> {
        Ok(self.view_type.get())
    }

    fn has_stable_ids(&self) -> bool {
        self.stable_ids
    }

    fn create_view_holder(&self, view_type: ViewType) -> Result<Holder, AdapterError> {
        Ok(Holder {
            view_type,
            created_by: self.id_base,
            position: None,
        })
    }

    fn bind_view_holder(
        &self,
        holder: &mut Holder,
        position: usize,
        _payloads: &[Payload],
    ) -> Result<(), AdapterError> {
        holder.position = Some(position);
        self.bound.borrow_mut().push(position);
        Ok(())
    }

    fn observers(&self) -> &ObserverList {
        &self.observers
    }

    fn on_view_recycled(&self, _holder: &mut Holder, view_type: ViewType) -> Result<(), AdapterError> {
        self.recycled.borrow_mut().push(view_type);
        Ok(())
    }
}

/// Observer that records every event it sees.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    events: RefCell<Vec<AdapterEvent>>,
}

impl Recorder {
    pub(crate) fn attach(observers: &ObserverList) -> Rc<Self> {
        let recorder = Rc::new(Self::default());
        observers.register(recorder.clone()).unwrap();
        recorder
    }

    pub(crate) fn take(&self) -> Vec<AdapterEvent> {
        core::mem::take(&mut *self.events.borrow_mut())
    }
}

impl AdapterObserver for Recorder {
    fn on_adapter_event(&self, event: &AdapterEvent) -> Result<(), AdapterError> {
        self.events.borrow_mut().push(event.clone());
        Ok(())
    }
}

/// Subscriber that accepts and drops every bridged event.
#[derive(Debug)]
pub(crate) struct NullSubscriber;

impl BridgeSubscriber for NullSubscriber {
    fn on_bridged_event(
        &self,
        _source: AdapterKey,
        _tags: &[ChildTag],
        _event: &AdapterEvent,
    ) -> Result<(), AdapterError> {
        Ok(())
    }
}
