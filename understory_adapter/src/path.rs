// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapter paths: the chain of adapters crossed to reach the owner of a position.
//!
//! ## Overview
//!
//! An [`AdapterPath`] is built outer → inner by repeatedly asking each
//! [`WrapperAdapter`](crate::WrapperAdapter) to unwrap a position, and is
//! consumed inner → outer by asking each parent to wrap it again.
//!
//! The first segment is the origin adapter and carries no tag. Every later
//! segment carries the provenance tag its parent assigned to it, if any.
//!
//! Paths are snapshots. Any mutation of the adapter tree invalidates them.

use smallvec::SmallVec;

use crate::{AdapterError, ChildAdapter, ChildTag};

/// One adapter on an [`AdapterPath`].
pub struct AdapterPathSegment<H> {
    /// The adapter reached at this step.
    pub adapter: ChildAdapter<H>,
    /// Provenance tag of `adapter` in the previous segment's adapter.
    pub tag: Option<ChildTag>,
}

impl<H> Clone for AdapterPathSegment<H> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            tag: self.tag,
        }
    }
}

impl<H> core::fmt::Debug for AdapterPathSegment<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdapterPathSegment")
            .field("adapter", &self.adapter)
            .field("tag", &self.tag)
            .finish()
    }
}

/// Ordered record of the adapters crossed while unwrapping a position.
pub struct AdapterPath<H> {
    segments: SmallVec<[AdapterPathSegment<H>; 4]>,
    position: Option<usize>,
}

impl<H> Default for AdapterPath<H> {
    fn default() -> Self {
        Self {
            segments: SmallVec::new(),
            position: None,
        }
    }
}

impl<H> core::fmt::Debug for AdapterPath<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdapterPath")
            .field("segments", &self.segments)
            .field("position", &self.position)
            .finish()
    }
}

impl<H> AdapterPath<H> {
    /// Creates an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks from `root` down to the adapter that owns `position`.
    ///
    /// The walk stops at the first plain adapter, or at a wrapper that does
    /// not own the position. Check [`AdapterPath::is_valid`] on the result.
    pub fn resolve(root: &ChildAdapter<H>, position: usize) -> Result<Self, AdapterError> {
        let mut path = Self::new();
        unwrap_position_with_path(root, None, None, position, &mut path)?;
        Ok(path)
    }

    /// Appends a segment.
    pub fn append(&mut self, segment: AdapterPathSegment<H>) {
        self.segments.push(segment);
    }

    /// Removes every segment and forgets the final position.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.position = None;
    }

    /// Returns `true` if the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[AdapterPathSegment<H>] {
        &self.segments
    }

    /// The outermost segment.
    #[must_use]
    pub fn first_segment(&self) -> Option<&AdapterPathSegment<H>> {
        self.segments.first()
    }

    /// The innermost segment.
    #[must_use]
    pub fn last_segment(&self) -> Option<&AdapterPathSegment<H>> {
        self.segments.last()
    }

    /// Position local to the innermost segment, if the walk reached one.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Returns `true` if the path is non-empty and ends at a position.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.segments.is_empty() && self.position.is_some()
    }
}

/// Translates `position` of `origin` into a position of `target`.
///
/// Returns `None` if `target` is not on the path that owns `position`.
pub fn unwrap_position<H>(
    origin: &ChildAdapter<H>,
    target: &ChildAdapter<H>,
    position: usize,
) -> Result<Option<usize>, AdapterError> {
    let mut path = AdapterPath::new();
    unwrap_position_with_path(origin, Some(target), None, position, &mut path)
}

/// Walks down from `origin`, recording every crossed adapter in `dest`.
///
/// With a `target`, the walk stops there and fails (returns `None`) if the
/// target is never reached. With a `target_tag`, the innermost segment must
/// also carry that tag. Without a `target`, the walk continues to the
/// terminal adapter.
pub fn unwrap_position_with_path<H>(
    origin: &ChildAdapter<H>,
    target: Option<&ChildAdapter<H>>,
    target_tag: Option<ChildTag>,
    position: usize,
    dest: &mut AdapterPath<H>,
) -> Result<Option<usize>, AdapterError> {
    dest.clear();
    dest.append(AdapterPathSegment {
        adapter: origin.clone(),
        tag: None,
    });

    let mut current = origin.clone();
    let mut position = Some(position);
    while let Some(local) = position {
        if target.is_some_and(|t| t.same_adapter(&current)) {
            break;
        }
        let Some(wrapper) = current.as_wrapper() else {
            break;
        };
        let Some(unwrapped) = wrapper.unwrap_position(local)? else {
            position = None;
            break;
        };
        dest.append(AdapterPathSegment {
            adapter: unwrapped.adapter.clone(),
            tag: unwrapped.tag,
        });
        position = Some(unwrapped.position);
        current = unwrapped.adapter;
    }

    if let Some(target) = target
        && !target.same_adapter(&current)
    {
        position = None;
    }
    if let Some(tag) = target_tag
        && dest.last_segment().and_then(|s| s.tag) != Some(tag)
    {
        position = None;
    }
    dest.position = position;
    Ok(position)
}

/// Translates a position of the segment at `origin` back up to the segment at `target`.
///
/// Indices refer to `path.segments()`; `origin` defaults to the innermost
/// segment and `target` to the outermost. Returns `None` as soon as a parent
/// does not recognize its child.
pub fn wrap_position<H>(
    path: &AdapterPath<H>,
    origin: Option<usize>,
    target: Option<usize>,
    position: usize,
) -> Result<Option<usize>, AdapterError> {
    let segments = path.segments();
    let Some(last) = segments.len().checked_sub(1) else {
        return Ok(None);
    };
    let origin = origin.unwrap_or(last).min(last);
    let target = target.unwrap_or(0);
    if target > origin {
        return Ok(None);
    }

    let mut position = position;
    for index in (target + 1..=origin).rev() {
        let Some(parent) = segments[index - 1].adapter.as_wrapper() else {
            return Ok(None);
        };
        match parent.wrap_position(&segments[index], position)? {
            Some(wrapped) => position = wrapped,
            None => return Ok(None),
        }
    }
    Ok(Some(position))
}
