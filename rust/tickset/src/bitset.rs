//! Sparse segment directory with global head/tail maintenance.
//!
//! - The directory maps segment ids to exclusively-owned [`Segment`]s, keyed
//!   in ascending order; segments are created lazily and never freed once
//!   allocated, even when their population returns to zero.
//! - `head` is the smallest set global index (`u64::MAX` while empty), `tail`
//!   is one past the largest (`0` while empty).
//! - Insertion maintains both extrema with O(1) comparisons. Removal of an
//!   extremum index falls back to a directory rescan over the ordered
//!   segments; interior removals resolve entirely within one segment.

use std::collections::BTreeMap;

use crate::segment::Segment;

/// A sparse set of `u64` indices with O(1) access to the current minimum and
/// one-past-maximum set index.
///
/// Overview
/// - The index space is split into aligned [`SegmentedBitset::SPAN`]-sized
///   windows, each backed by a [`Segment`] in an ordered directory. Memory
///   scales with the number of touched windows, not with the index range, so
///   the structure suits clustered workloads (e.g. active price levels near a
///   reference price) where the range dwarfs the population.
/// - `head()` and `tail()` are maintained incrementally: setting a bit can
///   only widen them (two comparisons); clearing a bit re-derives them from
///   the segments' cached local extrema only when the removed index was an
///   endpoint.
///
/// Costs
/// - `set` / `contains`: O(log segments) directory access plus O(1) bit work;
///   `set` may allocate one segment.
/// - `unset`: same, plus a word walk within the segment when a segment-local
///   extremum is removed, plus an O(segments) directory rescan when a global
///   endpoint is removed.
/// - Indices are not range-checked: arbitrarily large indices allocate
///   arbitrarily many segments. Keeping the working range sane is the
///   caller's responsibility.
///
/// Single-threaded by design; callers sharing an instance must serialize
/// mutations externally.
pub struct SegmentedBitset {
    /// Segment id -> segment, ascending. Grows monotonically over the
    /// instance's lifetime.
    segments: BTreeMap<u64, Box<Segment>>,
    /// Smallest set global index; `u64::MAX` sentinel while empty.
    head: u64,
    /// One past the largest set global index; `0` while empty.
    tail: u64,
}

impl SegmentedBitset {
    /// Number of global indices covered by each segment.
    pub const SPAN: u64 = Segment::BITS as u64;

    /// Creates an empty set. `head()` and `tail()` return 0 until the first
    /// insertion.
    pub fn new() -> SegmentedBitset {
        SegmentedBitset {
            segments: BTreeMap::new(),
            head: u64::MAX,
            tail: 0,
        }
    }

    /// Creates a set containing the given indices.
    pub fn from_positions(positions: impl IntoIterator<Item = u64>) -> SegmentedBitset {
        let mut set = SegmentedBitset::new();
        set.extend(positions);
        set
    }

    #[inline]
    fn split(index: u64) -> (u64, usize) {
        (index / Self::SPAN, (index % Self::SPAN) as usize)
    }

    /// Inserts `index` into the set.
    ///
    /// Idempotent. Lazily allocates the covering segment on first touch. On
    /// actual insertion the global extrema are extended in place: a new bit
    /// can only widen `[head, tail)`, never invalidate a cached endpoint.
    pub fn set(&mut self, index: u64) {
        let (segment_id, bit) = Self::split(index);
        let segment = self
            .segments
            .entry(segment_id)
            .or_insert_with(|| Box::new(Segment::empty()));
        if segment.set(bit) {
            self.head = self.head.min(index);
            self.tail = self.tail.max(index + 1);
        }
    }

    /// Removes `index` from the set, returning `true` if it was present.
    ///
    /// Absent segment or clear bit: returns `false` with no state change.
    /// When the removed index was the current head (or `tail() - 1`), the
    /// affected endpoint is re-derived from the segments' cached extrema by
    /// scanning the ordered directory from the matching end. Interior
    /// removals never leave the owning segment.
    pub fn unset(&mut self, index: u64) -> bool {
        let (segment_id, bit) = Self::split(index);
        let Some(segment) = self.segments.get_mut(&segment_id) else {
            return false;
        };
        if !segment.unset(bit) {
            return false;
        }
        if index == self.head {
            self.rescan_head();
        }
        if index + 1 == self.tail {
            self.rescan_tail();
        }
        true
    }

    /// Checks whether `index` is in the set.
    #[inline]
    pub fn contains(&self, index: u64) -> bool {
        let (segment_id, bit) = Self::split(index);
        self.segments
            .get(&segment_id)
            .is_some_and(|segment| segment.contains(bit))
    }

    /// Checks whether no index is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == u64::MAX
    }

    /// Smallest set index, or 0 if the set is empty.
    #[inline]
    pub fn head(&self) -> u64 {
        if self.is_empty() { 0 } else { self.head }
    }

    /// One past the largest set index, or 0 if the set is empty.
    #[inline]
    pub fn tail(&self) -> u64 {
        if self.is_empty() { 0 } else { self.tail }
    }

    /// Eagerly allocates empty segments covering `[0, max_index]`.
    ///
    /// Later `set` calls in that range skip the lazy-allocation path.
    /// Existing segments are left untouched, and empty segments never
    /// contribute to `head()`/`tail()`. Pure capacity hint.
    pub fn reserve_for_max_index(&mut self, max_index: u64) {
        let last_segment = max_index / Self::SPAN;
        for segment_id in 0..=last_segment {
            self.segments
                .entry(segment_id)
                .or_insert_with(|| Box::new(Segment::empty()));
        }
    }

    /// Returns the total number of set indices, summed over the directory.
    pub fn count_positions(&self) -> u64 {
        self.segments
            .values()
            .map(|segment| segment.count() as u64)
            .sum()
    }

    /// Returns the number of allocated segments, populated or not.
    ///
    /// Segments accumulate over the instance's lifetime (emptied segments are
    /// retained for O(1) re-insertion), so this also reflects the high-water
    /// footprint of the touched index range.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Iterates the set indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.segments.iter().flat_map(|(&segment_id, segment)| {
            let base = segment_id * Self::SPAN;
            segment.iter().map(move |bit| base + bit as u64)
        })
    }

    /// Re-derives `head` from the first populated segment in key order.
    ///
    /// Within a segment `local_min` is the smallest set offset, and segment
    /// ids ascend, so the first populated segment owns the global minimum.
    fn rescan_head(&mut self) {
        self.head = self
            .segments
            .iter()
            .find(|(_, segment)| segment.count() > 0)
            .map(|(&segment_id, segment)| segment_id * Self::SPAN + segment.local_min() as u64)
            .unwrap_or(u64::MAX);
    }

    /// Re-derives `tail` from the last populated segment in key order.
    fn rescan_tail(&mut self) {
        self.tail = self
            .segments
            .iter()
            .rev()
            .find(|(_, segment)| segment.count() > 0)
            .map(|(&segment_id, segment)| {
                segment_id * Self::SPAN + segment.local_max() as u64 + 1
            })
            .unwrap_or(0);
    }
}

impl Default for SegmentedBitset {
    fn default() -> SegmentedBitset {
        SegmentedBitset::new()
    }
}

impl Extend<u64> for SegmentedBitset {
    fn extend<T: IntoIterator<Item = u64>>(&mut self, positions: T) {
        for position in positions {
            self.set(position);
        }
    }
}

impl FromIterator<u64> for SegmentedBitset {
    fn from_iter<T: IntoIterator<Item = u64>>(positions: T) -> SegmentedBitset {
        SegmentedBitset::from_positions(positions)
    }
}
