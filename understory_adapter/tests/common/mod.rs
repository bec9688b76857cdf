// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixtures shared by the integration tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use understory_adapter::{
    Adapter, AdapterError, AdapterEvent, AdapterObserver, ItemId, NO_ID, ObserverList, Payload,
    ViewType,
};

/// View holder produced by [`Rows`].
#[derive(Debug, Default)]
pub(crate) struct Row {
    pub(crate) view_type: ViewType,
    pub(crate) text: String,
    pub(crate) attached: bool,
}

/// A named run of rows, bound as `"{name}:{position}"`.
#[derive(Debug)]
pub(crate) struct Rows {
    name: &'static str,
    len: Cell<usize>,
    id_base: Option<ItemId>,
    view_type: ViewType,
    pub(crate) observers: ObserverList,
}

impl Rows {
    pub(crate) fn new(name: &'static str, len: usize) -> Rc<Self> {
        Self::build(name, len, None, 0)
    }

    pub(crate) fn with_ids(name: &'static str, len: usize, id_base: ItemId) -> Rc<Self> {
        Self::build(name, len, Some(id_base), 0)
    }

    pub(crate) fn with_view_type(name: &'static str, len: usize, view_type: ViewType) -> Rc<Self> {
        Self::build(name, len, None, view_type)
    }

    fn build(
        name: &'static str,
        len: usize,
        id_base: Option<ItemId>,
        view_type: ViewType,
    ) -> Rc<Self> {
        Rc::new(Self {
            name,
            len: Cell::new(len),
            id_base,
            view_type,
            observers: ObserverList::new(),
        })
    }

    pub(crate) fn insert(&self, start: usize, count: usize) {
        self.len.set(self.len.get() + count);
        self.observers.notify_item_range_inserted(start, count).unwrap();
    }

    pub(crate) fn remove(&self, start: usize, count: usize) {
        self.len.set(self.len.get() - count);
        self.observers.notify_item_range_removed(start, count).unwrap();
    }
}

impl Adapter<Row> for Rows {
    fn item_count(&self) -> usize {
        self.len.get()
    }

    fn item_id(&self, position: usize) -> Result<ItemId, AdapterError> {
        Ok(self
            .id_base
            .map_or(NO_ID, |base| base + ItemId::try_from(position).unwrap()))
    }

    fn item_view_type(&self, _position: usize) -> Result<ViewType, AdapterError> {
        Ok(self.view_type)
    }

    fn has_stable_ids(&self) -> bool {
        self.id_base.is_some()
    }

    fn create_view_holder(&self, view_type: ViewType) -> Result<Row, AdapterError> {
        Ok(Row {
            view_type,
            ..Row::default()
        })
    }

    fn bind_view_holder(
        &self,
        holder: &mut Row,
        position: usize,
        _payloads: &[Payload],
    ) -> Result<(), AdapterError> {
        holder.text = format!("{}:{position}", self.name);
        Ok(())
    }

    fn observers(&self) -> &ObserverList {
        &self.observers
    }

    fn on_view_attached(&self, holder: &mut Row, view_type: ViewType) -> Result<(), AdapterError> {
        assert_eq!(view_type, self.view_type);
        holder.attached = true;
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
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl AdapterObserver for Recorder {
    fn on_adapter_event(&self, event: &AdapterEvent) -> Result<(), AdapterError> {
        self.events.borrow_mut().push(event.clone());
        Ok(())
    }
}
