// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Header / body / footer composition.

use alloc::rc::Rc;

use crate::{AdapterError, ChildAdapter, ChildTag, CompositeAdapter};

/// One of the three regions of a [`HeaderFooterAdapter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeaderFooterSegment {
    /// Items before the body.
    Header,
    /// The main content.
    Body,
    /// Items after the body.
    Footer,
}

/// A composite of exactly three children: header, body and footer.
///
/// The host binds to [`HeaderFooterAdapter::composite`]; this type only
/// remembers which segment is which so positions can be classified.
///
/// ```rust
/// use std::rc::Rc;
///
/// use understory_adapter::{
///     Adapter, AdapterError, ChildAdapter, HeaderFooterAdapter, HeaderFooterSegment,
///     ObserverList, Payload, ViewType,
/// };
///
/// struct Rows(usize, ObserverList);
///
/// impl Adapter<()> for Rows {
///     fn item_count(&self) -> usize { self.0 }
///     fn create_view_holder(&self, _: ViewType) -> Result<(), AdapterError> { Ok(()) }
///     fn bind_view_holder(&self, _: &mut (), _: usize, _: &[Payload]) -> Result<(), AdapterError> {
///         Ok(())
///     }
///     fn observers(&self) -> &ObserverList { &self.1 }
/// }
///
/// let rows = |n| ChildAdapter::<()>::plain(Rc::new(Rows(n, ObserverList::new())));
/// let list = HeaderFooterAdapter::new(rows(1), rows(10), rows(2)).unwrap();
///
/// assert_eq!(list.composite().item_count(), 13);
/// assert_eq!(list.locate(0).unwrap(), Some((HeaderFooterSegment::Header, 0)));
/// assert_eq!(list.locate(4).unwrap(), Some((HeaderFooterSegment::Body, 3)));
/// assert_eq!(list.locate(12).unwrap(), Some((HeaderFooterSegment::Footer, 1)));
/// assert_eq!(list.body_flat_position(3).unwrap(), Some(4));
/// ```
pub struct HeaderFooterAdapter<H> {
    composite: Rc<CompositeAdapter<H>>,
    header: ChildTag,
    body: ChildTag,
    footer: ChildTag,
}

impl<H> core::fmt::Debug for HeaderFooterAdapter<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HeaderFooterAdapter")
            .field("composite", &self.composite)
            .field("header", &self.header)
            .field("body", &self.body)
            .field("footer", &self.footer)
            .finish()
    }
}

impl<H: 'static> HeaderFooterAdapter<H> {
    /// Composes `header`, `body` and `footer` in that order.
    pub fn new(
        header: ChildAdapter<H>,
        body: ChildAdapter<H>,
        footer: ChildAdapter<H>,
    ) -> Result<Self, AdapterError> {
        let composite = CompositeAdapter::new();
        let header = composite.add_adapter(header)?;
        let body = composite.add_adapter(body)?;
        let footer = composite.add_adapter(footer)?;
        Ok(Self {
            composite,
            header,
            body,
            footer,
        })
    }

    /// The composite to hand to the host.
    #[must_use]
    pub fn composite(&self) -> &Rc<CompositeAdapter<H>> {
        &self.composite
    }

    /// The composite as a child of another composite.
    #[must_use]
    pub fn as_child(&self) -> ChildAdapter<H> {
        ChildAdapter::wrapper(self.composite.clone())
    }

    /// Provenance tag of `region` in [`HeaderFooterAdapter::composite`].
    #[must_use]
    pub fn tag(&self, region: HeaderFooterSegment) -> ChildTag {
        match region {
            HeaderFooterSegment::Header => self.header,
            HeaderFooterSegment::Body => self.body,
            HeaderFooterSegment::Footer => self.footer,
        }
    }

    /// Number of items in `region`.
    #[must_use]
    pub fn item_count(&self, region: HeaderFooterSegment) -> usize {
        self.composite
            .segment_of(self.tag(region))
            .and_then(|segment| self.composite.adapter(segment))
            .map_or(0, |child| child.adapter().item_count())
    }

    /// Classifies a flat position into its region and the offset inside it.
    pub fn locate(
        &self,
        position: usize,
    ) -> Result<Option<(HeaderFooterSegment, usize)>, AdapterError> {
        let Some(at) = self.composite.segmented_position(position)? else {
            return Ok(None);
        };
        let tag = self.composite.tag(at.segment);
        let region = [
            HeaderFooterSegment::Header,
            HeaderFooterSegment::Body,
            HeaderFooterSegment::Footer,
        ]
        .into_iter()
        .find(|&region| Some(self.tag(region)) == tag);
        Ok(region.map(|region| (region, at.offset)))
    }

    /// Flat position of the body item at `position`.
    ///
    /// Returns `Ok(None)` once the body has been removed from the composite.
    pub fn body_flat_position(&self, position: usize) -> Result<Option<usize>, AdapterError> {
        let Some(segment) = self.composite.segment_of(self.body) else {
            return Ok(None);
        };
        self.composite.flat_position(segment, position).map(Some)
    }
}
