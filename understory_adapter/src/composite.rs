// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A list adapter that concatenates child adapters into one flat index space.
//!
//! ## Event re-projection
//!
//! Every child is observed through a [`ChangeBridge`](crate::ChangeBridge).
//! Events arrive tagged with every segment the child occupies and are
//! translated before being re-emitted to the composite's own observers:
//!
//! - `Changed` invalidates every cached count and is re-emitted as is.
//! - `RangeChanged` is re-emitted once per segment, at the flat start of that
//!   segment; counts are untouched.
//! - `RangeInserted`/`RangeRemoved` for a child in a single segment
//!   invalidate that segment and are re-emitted at the flat start. A child
//!   occupying several segments collapses to `Changed`.
//! - `RangeMoved` must carry exactly one item. For a child in a single
//!   segment both ends are translated; otherwise it collapses to `Changed`.
//!
//! Adding or removing a child always emits `Changed`, since the ids and
//! view types of every later segment shift.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell, RefMut};
use core::fmt;

use smallvec::SmallVec;

use crate::{
    Adapter, AdapterError, AdapterEvent, AdapterKey, AdapterPathSegment, BridgeSubscriber,
    ChildAdapter, ChildTag, ItemId, ObserverList, Payload, SegmentMultiplexer, SegmentedPosition,
    SegmentedPositionTranslator, SegmentedViewTypeTranslator, UnwrapResult, ViewType,
    WrapperAdapter, item_id,
};

struct CompositeState<H> {
    children: SegmentMultiplexer<H>,
    positions: SegmentedPositionTranslator,
    view_types: SegmentedViewTypeTranslator,
}

impl<H> CompositeState<H> {
    fn locate(&mut self, position: usize) -> Result<(SegmentedPosition, ChildAdapter<H>), AdapterError> {
        let out_of_bounds = |state: &mut Self| AdapterError::PositionOutOfBounds {
            position,
            len: state.positions.total_item_count(&state.children),
        };
        let Some(segmented) = self.positions.segmented_position(&self.children, position) else {
            return Err(out_of_bounds(self));
        };
        match self.children.adapter(segmented.segment) {
            Some(child) => Ok((segmented, child.clone())),
            None => Err(out_of_bounds(self)),
        }
    }

    fn flat_position(&mut self, segment: usize, offset: usize) -> usize {
        self.positions.flat_position(&self.children, segment, offset)
    }

    fn project(
        &mut self,
        tags: &[ChildTag],
        event: &AdapterEvent,
    ) -> Result<SmallVec<[AdapterEvent; 2]>, AdapterError> {
        let segments: SmallVec<[usize; 2]> = tags
            .iter()
            .filter_map(|&tag| self.children.segment_of(tag))
            .collect();
        let mut projected = SmallVec::new();

        match *event {
            AdapterEvent::Changed => {
                self.positions.invalidate_all();
                projected.push(AdapterEvent::Changed);
            }
            AdapterEvent::RangeChanged {
                start,
                count,
                ref payload,
            } => {
                for &segment in &segments {
                    projected.push(AdapterEvent::RangeChanged {
                        start: self.flat_position(segment, start),
                        count,
                        payload: payload.clone(),
                    });
                }
            }
            AdapterEvent::RangeInserted { count: 0, .. }
            | AdapterEvent::RangeRemoved { count: 0, .. } => {}
            AdapterEvent::RangeInserted { start, count }
            | AdapterEvent::RangeRemoved { start, count } => match segments.as_slice() {
                [] => {}
                &[segment] => {
                    self.positions.invalidate_segment(segment);
                    let start = self.flat_position(segment, start);
                    projected.push(match event {
                        AdapterEvent::RangeInserted { .. } => {
                            AdapterEvent::RangeInserted { start, count }
                        }
                        _ => AdapterEvent::RangeRemoved { start, count },
                    });
                }
                many => {
                    for &segment in many {
                        self.positions.invalidate_segment(segment);
                    }
                    tracing::warn!(
                        segments = many.len(),
                        "ranged event from a child in several segments collapsed to a full change"
                    );
                    projected.push(AdapterEvent::Changed);
                }
            },
            AdapterEvent::RangeMoved { from, to, count } => {
                if count != 1 {
                    return Err(AdapterError::UnsupportedMoveCount { count });
                }
                match segments.as_slice() {
                    [] => {}
                    &[segment] => {
                        let from = self.flat_position(segment, from);
                        let to = self.flat_position(segment, to);
                        projected.push(AdapterEvent::RangeMoved { from, to, count });
                    }
                    many => {
                        tracing::warn!(
                            segments = many.len(),
                            "move from a child in several segments collapsed to a full change"
                        );
                        projected.push(AdapterEvent::Changed);
                    }
                }
            }
        }
        Ok(projected)
    }
}

/// Concatenation of child adapters, each occupying one segment.
///
/// Item ids and view types of children are stamped with the owning segment
/// (see [`item_id`] and [`view_type`](crate::view_type)), so they stay unique
/// across the whole composite. Children only ever see their own local
/// positions and their own view types.
///
/// Composites are shared through [`Rc`] and created with
/// [`CompositeAdapter::new`]. Register one as a child of another composite
/// with [`ChildAdapter::wrapper`].
pub struct CompositeAdapter<H> {
    state: RefCell<CompositeState<H>>,
    observers: ObserverList,
    stable_ids: Cell<bool>,
    released: Cell<bool>,
}

impl<H> fmt::Debug for CompositeAdapter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("CompositeAdapter");
        match self.state.try_borrow() {
            Ok(state) => debug.field("children", &state.children),
            Err(_) => debug.field("children", &"<borrowed>"),
        };
        debug
            .field("observers", &self.observers.len())
            .field("stable_ids", &self.stable_ids.get())
            .field("released", &self.released.get())
            .finish()
    }
}

impl<H: 'static> CompositeAdapter<H> {
    /// Creates an empty composite without stable ids.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let subscriber: Weak<dyn BridgeSubscriber> = this.clone();
            Self {
                state: RefCell::new(CompositeState {
                    children: SegmentMultiplexer::new(subscriber),
                    positions: SegmentedPositionTranslator::new(),
                    view_types: SegmentedViewTypeTranslator::new(),
                }),
                observers: ObserverList::new(),
                stable_ids: Cell::new(false),
                released: Cell::new(false),
            }
        })
    }

    /// Appends `adapter` as the last segment.
    pub fn add_adapter(&self, adapter: ChildAdapter<H>) -> Result<ChildTag, AdapterError> {
        self.insert_adapter(None, adapter)
    }

    /// Inserts `adapter` as segment `position`.
    ///
    /// Fails with [`AdapterError::PositionOutOfBounds`] if `position` is past
    /// the current number of segments.
    pub fn add_adapter_at(
        &self,
        position: usize,
        adapter: ChildAdapter<H>,
    ) -> Result<ChildTag, AdapterError> {
        self.insert_adapter(Some(position), adapter)
    }

    fn insert_adapter(
        &self,
        position: Option<usize>,
        adapter: ChildAdapter<H>,
    ) -> Result<ChildTag, AdapterError> {
        if self.stable_ids.get()
            && !self.observers.is_empty()
            && !adapter.adapter().has_stable_ids()
        {
            return Err(AdapterError::StableIdsRequired {
                reason: "an observed composite with stable ids only accepts children with stable ids",
            });
        }
        let (tag, segment) = {
            let mut state = self.state_mut("add_adapter")?;
            let segment = position.unwrap_or_else(|| state.children.len());
            // A child cleared of its observers left every segment it fills stale.
            let missed_events = state.children.is_detached(adapter.key());
            let tag = state.children.add(adapter, segment)?;
            state.positions.insert_segment(segment);
            if missed_events {
                state.positions.invalidate_all();
            }
            (tag, segment)
        };
        tracing::debug!(?tag, segment, "added child adapter");
        self.observers.notify_changed()?;
        Ok(tag)
    }

    /// Removes the segment tagged `tag`.
    ///
    /// Returns `Ok(false)` if `tag` is not registered.
    pub fn remove_adapter(&self, tag: ChildTag) -> Result<bool, AdapterError> {
        {
            let mut state = self.state_mut("remove_adapter")?;
            let Some(segment) = state.children.segment_of(tag) else {
                return Ok(false);
            };
            state.children.remove(tag)?;
            state.positions.remove_segment(segment);
            tracing::debug!(?tag, segment, "removed child adapter");
        }
        self.observers.notify_changed()?;
        Ok(true)
    }

    /// Declares whether [`Adapter::item_id`] returns stable ids.
    ///
    /// Enabling stable ids fails with [`AdapterError::StableIdsRequired`]
    /// if any current child does not have them.
    pub fn set_has_stable_ids(&self, stable_ids: bool) -> Result<(), AdapterError> {
        if stable_ids {
            let state = self.state("set_has_stable_ids")?;
            if !state.children.adapters().all(|c| c.adapter().has_stable_ids()) {
                return Err(AdapterError::StableIdsRequired {
                    reason: "every child must have stable ids",
                });
            }
        }
        self.stable_ids.set(stable_ids);
        Ok(())
    }

    /// Number of segments.
    #[must_use]
    pub fn child_adapter_count(&self) -> usize {
        self.state.try_borrow().map_or(0, |s| s.children.len())
    }

    /// Adapter of `segment`.
    #[must_use]
    pub fn adapter(&self, segment: usize) -> Option<ChildAdapter<H>> {
        let state = self.state.try_borrow().ok()?;
        state.children.adapter(segment).cloned()
    }

    /// Provenance tag of `segment`.
    #[must_use]
    pub fn tag(&self, segment: usize) -> Option<ChildTag> {
        self.state.try_borrow().ok()?.children.tag(segment)
    }

    /// Segment currently tagged `tag`.
    #[must_use]
    pub fn segment_of(&self, tag: ChildTag) -> Option<usize> {
        self.state.try_borrow().ok()?.children.segment_of(tag)
    }

    /// Resolves a flat position to its segment and local offset.
    pub fn segmented_position(
        &self,
        position: usize,
    ) -> Result<Option<SegmentedPosition>, AdapterError> {
        let mut state = self.state_mut("segmented_position")?;
        let state = &mut *state;
        Ok(state.positions.segmented_position(&state.children, position))
    }

    /// Flat position of `offset` within `segment`.
    pub fn flat_position(&self, segment: usize, offset: usize) -> Result<usize, AdapterError> {
        Ok(self.state_mut("flat_position")?.flat_position(segment, offset))
    }

    /// Returns `true` once [`WrapperAdapter::release`] has been called.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.get()
    }

    fn state(&self, operation: &'static str) -> Result<Ref<'_, CompositeState<H>>, AdapterError> {
        if self.released.get() {
            return Err(AdapterError::Released { operation });
        }
        self.state
            .try_borrow()
            .map_err(|_| AdapterError::Reentrant { operation })
    }

    fn state_mut(
        &self,
        operation: &'static str,
    ) -> Result<RefMut<'_, CompositeState<H>>, AdapterError> {
        if self.released.get() {
            return Err(AdapterError::Released { operation });
        }
        self.state
            .try_borrow_mut()
            .map_err(|_| AdapterError::Reentrant { operation })
    }

    fn locate(
        &self,
        operation: &'static str,
        position: usize,
    ) -> Result<(SegmentedPosition, ChildAdapter<H>), AdapterError> {
        self.state_mut(operation)?.locate(position)
    }

    fn child_for_view_type(
        &self,
        operation: &'static str,
        view_type: ViewType,
    ) -> Result<(ChildAdapter<H>, ViewType), AdapterError> {
        let state = self.state(operation)?;
        let unwrapped = state.view_types.unwrap_view_type(view_type)?;
        let child = state
            .children
            .adapter(unwrapped.segment)
            .cloned()
            .ok_or(AdapterError::CorruptedViewType { view_type })?;
        Ok((child, unwrapped.view_type))
    }
}

impl<H: 'static> Adapter<H> for CompositeAdapter<H> {
    fn item_count(&self) -> usize {
        if self.released.get() {
            return 0;
        }
        let Ok(mut state) = self.state.try_borrow_mut() else {
            tracing::warn!("item_count called re-entrantly");
            return 0;
        };
        let state = &mut *state;
        state.positions.total_item_count(&state.children)
    }

    fn item_id(&self, position: usize) -> Result<ItemId, AdapterError> {
        let (at, child) = self.locate("item_id", position)?;
        let raw = child.adapter().item_id(at.offset)?;
        item_id::compose_segment(at.segment, raw)
    }

    fn item_view_type(&self, position: usize) -> Result<ViewType, AdapterError> {
        let (at, child) = self.locate("item_view_type", position)?;
        let raw = child.adapter().item_view_type(at.offset)?;
        self.state_mut("item_view_type")?
            .view_types
            .wrap_item_view_type(at.segment, raw)
    }

    fn has_stable_ids(&self) -> bool {
        self.stable_ids.get()
    }

    fn create_view_holder(&self, view_type: ViewType) -> Result<H, AdapterError> {
        let (child, raw) = self.child_for_view_type("create_view_holder", view_type)?;
        child.adapter().create_view_holder(raw)
    }

    fn bind_view_holder(
        &self,
        holder: &mut H,
        position: usize,
        payloads: &[Payload],
    ) -> Result<(), AdapterError> {
        let (at, child) = self.locate("bind_view_holder", position)?;
        child.adapter().bind_view_holder(holder, at.offset, payloads)
    }

    fn observers(&self) -> &ObserverList {
        &self.observers
    }

    fn on_view_attached(&self, holder: &mut H, view_type: ViewType) -> Result<(), AdapterError> {
        let (child, raw) = self.child_for_view_type("on_view_attached", view_type)?;
        child.adapter().on_view_attached(holder, raw)
    }

    fn on_view_detached(&self, holder: &mut H, view_type: ViewType) -> Result<(), AdapterError> {
        let (child, raw) = self.child_for_view_type("on_view_detached", view_type)?;
        child.adapter().on_view_detached(holder, raw)
    }

    fn on_view_recycled(&self, holder: &mut H, view_type: ViewType) -> Result<(), AdapterError> {
        let (child, raw) = self.child_for_view_type("on_view_recycled", view_type)?;
        child.adapter().on_view_recycled(holder, raw)
    }

    fn on_failed_to_recycle_view(
        &self,
        holder: &mut H,
        view_type: ViewType,
    ) -> Result<bool, AdapterError> {
        let (child, raw) = self.child_for_view_type("on_failed_to_recycle_view", view_type)?;
        child.adapter().on_failed_to_recycle_view(holder, raw)
    }
}

impl<H: 'static> WrapperAdapter<H> for CompositeAdapter<H> {
    fn unwrap_position(&self, position: usize) -> Result<Option<UnwrapResult<H>>, AdapterError> {
        let mut state = self.state_mut("unwrap_position")?;
        let state = &mut *state;
        let Some(at) = state.positions.segmented_position(&state.children, position) else {
            return Ok(None);
        };
        Ok(state.children.adapter(at.segment).map(|adapter| UnwrapResult {
            adapter: adapter.clone(),
            position: at.offset,
            tag: state.children.tag(at.segment),
        }))
    }

    fn wrap_position(
        &self,
        segment: &AdapterPathSegment<H>,
        position: usize,
    ) -> Result<Option<usize>, AdapterError> {
        let Some(tag) = segment.tag else {
            return Ok(None);
        };
        let mut state = self.state_mut("wrap_position")?;
        let Some(index) = state.children.segment_of(tag) else {
            return Ok(None);
        };
        if !state
            .children
            .adapter(index)
            .is_some_and(|a| a.same_adapter(&segment.adapter))
        {
            return Ok(None);
        }
        Ok(Some(state.flat_position(index, position)))
    }

    fn wrapped_adapters(&self) -> Vec<ChildAdapter<H>> {
        self.state
            .try_borrow()
            .map(|s| s.children.unique_adapters().cloned().collect())
            .unwrap_or_default()
    }

    fn release(&self) {
        if self.released.get() {
            return;
        }
        let Ok(mut state) = self.state.try_borrow_mut() else {
            tracing::warn!("release called re-entrantly; ignored");
            return;
        };
        self.released.set(true);
        state.children.release();
        state.positions.clear();
        state.view_types.clear();
        tracing::debug!("released composite adapter");
    }
}

impl<H: 'static> BridgeSubscriber for CompositeAdapter<H> {
    fn on_bridged_event(
        &self,
        source: AdapterKey,
        tags: &[ChildTag],
        event: &AdapterEvent,
    ) -> Result<(), AdapterError> {
        if self.released.get() {
            return Ok(());
        }
        let projected = self.state_mut("on_bridged_event")?.project(tags, event)?;
        tracing::trace!(?source, ?event, emitted = projected.len(), "re-projected child event");
        for event in &projected {
            self.observers.notify(event)?;
        }
        Ok(())
    }
}
