// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_adapter --heading-base-level=0

//! Understory Adapter: composable list adapters over a single flat index space.
//!
//! A list or grid is often built from several independent data sources: a
//! header, a body, a footer, nested groups. This crate lets each source be
//! written as its own [`Adapter`] and composed into one, translating flat
//! positions, item ids, view types and change notifications across any depth
//! of nesting.
//!
//! The core concepts are:
//!
//! - [`Adapter`]: the data-source contract (item count, ids, view types,
//!   view-holder creation and binding) generic over the host's view-holder
//!   type, plus an [`ObserverList`] through which it reports [`AdapterEvent`]s.
//! - [`WrapperAdapter`]: an adapter composed of other adapters, able to
//!   unwrap a flat position to the child that owns it and wrap it back.
//! - [`CompositeAdapter`]: concatenates children, each in its own segment.
//!   Ids and view types are stamped with the owning segment (see [`item_id`]
//!   and [`view_type`]) and child events are re-projected into flat positions.
//! - [`SimpleRelayAdapter`]: the single-child pass-through wrapper.
//! - [`AdapterPath`]: the chain of adapters crossed to reach the owner of a
//!   position, with [`unwrap_position`] and [`wrap_position`] to move a
//!   position down or up that chain.
//! - [`SegmentedPositionTranslator`] and [`SegmentedViewTypeTranslator`]: the
//!   cached translation tables behind a composite.
//!
//! Everything is single-threaded and synchronous. Adapters are shared through
//! `Rc`, events are delivered before the notifying call returns, and every
//! fallible operation returns an [`AdapterError`] rather than panicking.
//!
//! ## Minimal example
//!
//! Two plain adapters composed into one list:
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use understory_adapter::{
//!     Adapter, AdapterError, ChildAdapter, CompositeAdapter, ItemId, ObserverList, Payload,
//!     ViewType, item_id,
//! };
//!
//! /// Rows numbered from `first`.
//! struct Rows {
//!     first: ItemId,
//!     len: Cell<usize>,
//!     observers: ObserverList,
//! }
//!
//! impl Adapter<String> for Rows {
//!     fn item_count(&self) -> usize {
//!         self.len.get()
//!     }
//!     fn item_id(&self, position: usize) -> Result<ItemId, AdapterError> {
//!         Ok(self.first + position as ItemId)
//!     }
//!     fn has_stable_ids(&self) -> bool {
//!         true
//!     }
//!     fn create_view_holder(&self, _view_type: ViewType) -> Result<String, AdapterError> {
//!         Ok(String::new())
//!     }
//!     fn bind_view_holder(
//!         &self,
//!         holder: &mut String,
//!         position: usize,
//!         _payloads: &[Payload],
//!     ) -> Result<(), AdapterError> {
//!         *holder = format!("row {}", self.first + position as ItemId);
//!         Ok(())
//!     }
//!     fn observers(&self) -> &ObserverList {
//!         &self.observers
//!     }
//! }
//!
//! let rows = |first, len| {
//!     Rc::new(Rows { first, len: Cell::new(len), observers: ObserverList::new() })
//! };
//! let (a, b) = (rows(0, 2), rows(100, 3));
//!
//! let list = CompositeAdapter::<String>::new();
//! list.add_adapter(ChildAdapter::plain(a.clone())).unwrap();
//! list.add_adapter(ChildAdapter::plain(b.clone())).unwrap();
//! assert_eq!(list.item_count(), 5);
//!
//! // Flat position 3 is the second row of `b`, tagged with segment 1.
//! let id = list.item_id(3).unwrap();
//! assert_eq!(item_id::extract_segment(id), Some(1));
//! assert_eq!(item_id::extract_wrapped_id(id), 101);
//!
//! let mut holder = list.create_view_holder(list.item_view_type(3).unwrap()).unwrap();
//! list.bind_view_holder(&mut holder, 3, &[]).unwrap();
//! assert_eq!(holder, "row 101");
//!
//! // A change in `a` shifts every later position.
//! a.len.set(3);
//! a.observers.notify_item_range_inserted(2, 1).unwrap();
//! assert_eq!(list.item_count(), 6);
//! assert_eq!(list.item_id(3).map(item_id::extract_wrapped_id).unwrap(), 100);
//! ```
//!
//! Host frameworks would register an observer on the composite's
//! [`ObserverList`] to receive the re-projected flat events.
//!
//! ## Features
//!
//! - `verify` (default): compiles [`VerifyingAdapter`], a debug decorator that
//!   cross-checks a wrapper's translations on every query.
//! - `std`: enables `std` support in dependencies.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod adapter;
mod bridge;
mod composite;
mod error;
mod header_footer;
pub mod item_id;
mod multiplexer;
mod observer;
mod path;
mod position;
mod relay;
mod tree;
#[cfg(feature = "verify")]
mod verify;
pub mod view_type;
mod view_type_translator;

#[cfg(test)]
mod test_support;

pub use adapter::{
    Adapter, AdapterKey, ChildAdapter, ChildTag, ItemId, NO_ID, Payload, UnwrapResult, ViewType,
    WrapperAdapter,
};
pub use bridge::{BridgeSubscriber, ChangeBridge};
pub use composite::CompositeAdapter;
pub use error::{AdapterError, BitField, ErrorKind};
pub use header_footer::{HeaderFooterAdapter, HeaderFooterSegment};
pub use multiplexer::SegmentMultiplexer;
pub use observer::{AdapterEvent, AdapterObserver, ObserverList};
pub use path::{
    AdapterPath, AdapterPathSegment, unwrap_position, unwrap_position_with_path, wrap_position,
};
pub use position::{SegmentSource, SegmentedPosition, SegmentedPositionTranslator};
pub use relay::SimpleRelayAdapter;
pub use tree::{collect_adapters, release_tree};
#[cfg(feature = "verify")]
pub use verify::{VerifyOptions, VerifyingAdapter};
pub use view_type_translator::{SegmentedViewTypeTranslator, UnwrappedViewType};
