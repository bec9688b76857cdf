// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat ↔ segmented position translation backed by a lazily-extended offset cache.

use alloc::vec::Vec;

/// A dense sequence of segments, each holding some number of items.
///
/// Item counts are not assumed to be stable between calls; the translator
/// caches them and relies on explicit invalidation.
pub trait SegmentSource {
    /// Number of segments.
    fn segment_count(&self) -> usize;

    /// Current item count of `segment`.
    fn segment_item_count(&self, segment: usize) -> usize;
}

/// A position split into the segment that owns it and the offset inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SegmentedPosition {
    /// Index of the owning segment.
    pub segment: usize,
    /// Position local to the segment.
    pub offset: usize,
}

/// Translates flat positions to [`SegmentedPosition`]s and back.
///
/// The translator keeps, per segment, a cached item count and a cached start
/// offset, plus a *frontier*: offsets of segments `0..=frontier` are known to
/// be correct, and for every segment before the frontier the cached count is
/// present and `offset[s + 1] == offset[s] + count[s]`. Queries past the
/// frontier walk forward and advance it, so a scroll session amortizes to
/// O(1) per lookup.
///
/// Invalidating a segment drops its count and pulls the frontier back to it;
/// earlier segments keep their cached values.
#[derive(Clone, Debug, Default)]
pub struct SegmentedPositionTranslator {
    counts: Vec<Option<usize>>,
    offsets: Vec<usize>,
    frontier: usize,
    total: Option<usize>,
}

impl SegmentedPositionTranslator {
    /// Creates an empty translator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest segment whose cached start offset is known to be correct.
    #[must_use]
    pub fn frontier(&self) -> usize {
        self.frontier
    }

    fn sync_len(&mut self, len: usize) {
        if self.counts.len() != len {
            // Someone changed the segment list without telling us.
            self.counts.resize(len, None);
            self.offsets.resize(len, 0);
            self.invalidate_all();
        }
    }

    fn item_count_of<S: SegmentSource + ?Sized>(&mut self, source: &S, segment: usize) -> usize {
        if let Some(count) = self.counts[segment] {
            return count;
        }
        let count = source.segment_item_count(segment);
        self.counts[segment] = Some(count);
        count
    }

    /// Returns the flat offset at which `segment` starts.
    ///
    /// A `segment` at or past the end yields the total item count.
    pub fn segment_offset<S: SegmentSource + ?Sized>(&mut self, source: &S, segment: usize) -> usize {
        let len = source.segment_count();
        self.sync_len(len);
        if segment >= len {
            return self.total_item_count(source);
        }
        if segment <= self.frontier {
            return self.offsets[segment];
        }

        let mut current = self.frontier;
        let mut offset = self.offsets[current];
        while current < segment {
            offset += self.item_count_of(source, current);
            current += 1;
            self.offsets[current] = offset;
        }
        self.frontier = segment;
        offset
    }

    /// Returns the flat position of `offset` within `segment`.
    pub fn flat_position<S: SegmentSource + ?Sized>(
        &mut self,
        source: &S,
        segment: usize,
        offset: usize,
    ) -> usize {
        self.segment_offset(source, segment) + offset
    }

    /// Resolves `flat` to its owning segment, or `None` past the last item.
    pub fn segmented_position<S: SegmentSource + ?Sized>(
        &mut self,
        source: &S,
        flat: usize,
    ) -> Option<SegmentedPosition> {
        let len = source.segment_count();
        self.sync_len(len);
        if len == 0 {
            return None;
        }

        // Last cached start at or before `flat`. Empty segments share their
        // start with the next one, so this lands on the rightmost of them.
        let cached = &self.offsets[..=self.frontier];
        let mut segment = cached.partition_point(|&o| o <= flat).saturating_sub(1);
        let mut offset = self.offsets[segment];

        while segment < len {
            let count = self.item_count_of(source, segment);
            if flat < offset + count {
                return Some(SegmentedPosition {
                    segment,
                    offset: flat - offset,
                });
            }
            offset += count;
            segment += 1;
            if segment < len && segment > self.frontier {
                self.offsets[segment] = offset;
                self.frontier = segment;
            }
        }
        None
    }

    /// Total number of items across all segments.
    pub fn total_item_count<S: SegmentSource + ?Sized>(&mut self, source: &S) -> usize {
        let len = source.segment_count();
        self.sync_len(len);
        if let Some(total) = self.total {
            return total;
        }
        let total = match len.checked_sub(1) {
            None => 0,
            Some(last) => self.segment_offset(source, last) + self.item_count_of(source, last),
        };
        self.total = Some(total);
        total
    }

    /// Forgets the item count of `segment` and every offset after it.
    pub fn invalidate_segment(&mut self, segment: usize) {
        if let Some(count) = self.counts.get_mut(segment) {
            *count = None;
        }
        self.frontier = self.frontier.min(segment);
        self.total = None;
    }

    /// Forgets every cached count and offset.
    pub fn invalidate_all(&mut self) {
        self.counts.fill(None);
        self.frontier = 0;
        self.total = None;
    }

    /// Makes room for a segment inserted at `segment`.
    ///
    /// Counts of the segments after it are kept; their offsets are not.
    pub fn insert_segment(&mut self, segment: usize) {
        let segment = segment.min(self.counts.len());
        self.counts.insert(segment, None);
        self.offsets.insert(segment, 0);
        self.after_splice(segment);
    }

    /// Drops the cache slot of a removed segment.
    pub fn remove_segment(&mut self, segment: usize) {
        if segment >= self.counts.len() {
            self.invalidate_all();
            return;
        }
        self.counts.remove(segment);
        self.offsets.remove(segment);
        self.after_splice(segment);
    }

    fn after_splice(&mut self, segment: usize) {
        // The slot at `segment` now belongs to a different segment, so the
        // last trustworthy offset is the one before it.
        self.frontier = self.frontier.min(segment.saturating_sub(1));
        if let Some(first) = self.offsets.first_mut() {
            *first = 0;
        }
        self.total = None;
    }

    /// Drops every cache slot.
    pub fn clear(&mut self) {
        self.counts.clear();
        self.offsets.clear();
        self.frontier = 0;
        self.total = None;
    }
}
