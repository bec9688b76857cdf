// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The adapter contract shared by data adapters and composing adapters.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::{AdapterError, AdapterPathSegment, ObserverList};

/// Stable identifier of an item.
pub type ItemId = i64;

/// Item view type code.
pub type ViewType = i32;

/// The "no id" sentinel. Never a valid composed id.
pub const NO_ID: ItemId = -1;

/// Opaque partial-bind payload attached to range-changed events.
pub type Payload = Rc<dyn Any>;

/// A data source for a list or grid, indexed `0..item_count()`.
///
/// `H` is the view holder type of the host framework. Adapters are shared
/// through [`Rc`], so all methods take `&self`; implementations keep mutable
/// state behind [`Cell`](core::cell::Cell)/[`RefCell`](core::cell::RefCell).
///
/// Positions passed to an adapter are always local to it: a composing parent
/// translates its flat positions before delegating.
pub trait Adapter<H> {
    /// Number of items.
    fn item_count(&self) -> usize;

    /// Stable id of the item at `position`, or [`NO_ID`].
    fn item_id(&self, _position: usize) -> Result<ItemId, AdapterError> {
        Ok(NO_ID)
    }

    /// View type of the item at `position`.
    fn item_view_type(&self, _position: usize) -> Result<ViewType, AdapterError> {
        Ok(0)
    }

    /// Whether [`Adapter::item_id`] returns stable ids.
    fn has_stable_ids(&self) -> bool {
        false
    }

    /// Creates a view holder for a view type previously returned by
    /// [`Adapter::item_view_type`].
    fn create_view_holder(&self, view_type: ViewType) -> Result<H, AdapterError>;

    /// Binds the item at `position` into `holder`.
    ///
    /// `payloads` is empty for a full bind.
    fn bind_view_holder(
        &self,
        holder: &mut H,
        position: usize,
        payloads: &[Payload],
    ) -> Result<(), AdapterError>;

    /// Observers notified when this adapter's data changes.
    fn observers(&self) -> &ObserverList;

    /// A view created by this adapter was attached to the host.
    ///
    /// `view_type` is the type this adapter returned, never a parent's wrapped one.
    fn on_view_attached(&self, _holder: &mut H, _view_type: ViewType) -> Result<(), AdapterError> {
        Ok(())
    }

    /// A view created by this adapter was detached from the host.
    fn on_view_detached(&self, _holder: &mut H, _view_type: ViewType) -> Result<(), AdapterError> {
        Ok(())
    }

    /// A view created by this adapter was recycled.
    fn on_view_recycled(&self, _holder: &mut H, _view_type: ViewType) -> Result<(), AdapterError> {
        Ok(())
    }

    /// The host failed to recycle a view; return `true` to recycle it anyway.
    fn on_failed_to_recycle_view(
        &self,
        _holder: &mut H,
        _view_type: ViewType,
    ) -> Result<bool, AdapterError> {
        Ok(false)
    }
}

/// An adapter composed of other adapters.
///
/// Wrappers translate between their own positions and those of the adapters
/// they wrap, which is what [`AdapterPath`](crate::AdapterPath) walks.
pub trait WrapperAdapter<H>: Adapter<H> {
    /// Resolves `position` to the wrapped adapter that owns it.
    ///
    /// Returns `None` when no wrapped adapter owns the position.
    fn unwrap_position(&self, position: usize) -> Result<Option<UnwrapResult<H>>, AdapterError>;

    /// Translates a position of the adapter in `segment` into this adapter's space.
    ///
    /// Returns `None` if `segment` does not name one of this adapter's children.
    fn wrap_position(
        &self,
        segment: &AdapterPathSegment<H>,
        position: usize,
    ) -> Result<Option<usize>, AdapterError>;

    /// Unique adapters wrapped by this adapter, in registration order.
    fn wrapped_adapters(&self) -> Vec<ChildAdapter<H>>;

    /// Detaches from every wrapped adapter. Idempotent.
    ///
    /// The wrapped adapters themselves are left untouched.
    fn release(&self);
}

/// Identity of a shared adapter instance.
///
/// Two handles to the same allocation compare equal whatever trait they
/// are viewed through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AdapterKey(usize);

impl AdapterKey {
    /// Returns the key of the adapter behind `adapter`.
    #[must_use]
    pub fn of<T: ?Sized>(adapter: &Rc<T>) -> Self {
        Self(Rc::as_ptr(adapter).cast::<()>().addr())
    }
}

/// An adapter registered as a child, with its capabilities resolved once.
pub enum ChildAdapter<H> {
    /// A data adapter with no children of its own.
    Plain(Rc<dyn Adapter<H>>),
    /// A composing adapter whose positions can be unwrapped further.
    Wrapper(Rc<dyn WrapperAdapter<H>>),
}

impl<H> ChildAdapter<H> {
    /// Registers a data adapter.
    pub fn plain<A: Adapter<H> + 'static>(adapter: Rc<A>) -> Self {
        Self::Plain(adapter)
    }

    /// Registers a composing adapter.
    pub fn wrapper<A: WrapperAdapter<H> + 'static>(adapter: Rc<A>) -> Self {
        Self::Wrapper(adapter)
    }

    /// The base adapter contract.
    #[must_use]
    pub fn adapter(&self) -> &dyn Adapter<H> {
        match self {
            Self::Plain(adapter) => &**adapter,
            Self::Wrapper(adapter) => &**adapter,
        }
    }

    /// The wrapper contract, if this child is a composing adapter.
    #[must_use]
    pub fn as_wrapper(&self) -> Option<&Rc<dyn WrapperAdapter<H>>> {
        match self {
            Self::Plain(_) => None,
            Self::Wrapper(adapter) => Some(adapter),
        }
    }

    /// Identity of the underlying instance.
    #[must_use]
    pub fn key(&self) -> AdapterKey {
        match self {
            Self::Plain(adapter) => AdapterKey::of(adapter),
            Self::Wrapper(adapter) => AdapterKey::of(adapter),
        }
    }

    /// Returns `true` if both handles point at the same instance.
    #[must_use]
    pub fn same_adapter(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<H> Clone for ChildAdapter<H> {
    fn clone(&self) -> Self {
        match self {
            Self::Plain(adapter) => Self::Plain(adapter.clone()),
            Self::Wrapper(adapter) => Self::Wrapper(adapter.clone()),
        }
    }
}

impl<H> fmt::Debug for ChildAdapter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Plain(_) => "Plain",
            Self::Wrapper(_) => "Wrapper",
        };
        f.debug_tuple(kind).field(&self.key()).finish()
    }
}

/// Opaque provenance token for one occurrence of a child in a composite.
///
/// The same adapter instance registered twice gets two distinct tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChildTag(pub(crate) u64);

/// Result of [`WrapperAdapter::unwrap_position`].
pub struct UnwrapResult<H> {
    /// The wrapped adapter owning the position.
    pub adapter: ChildAdapter<H>,
    /// The position local to `adapter`.
    pub position: usize,
    /// The provenance tag of `adapter` in the wrapper, if it has one.
    pub tag: Option<ChildTag>,
}

impl<H> fmt::Debug for UnwrapResult<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnwrapResult")
            .field("adapter", &self.adapter)
            .field("position", &self.position)
            .field("tag", &self.tag)
            .finish()
    }
}
