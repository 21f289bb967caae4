//! Segmented bitset with incrementally maintained order statistics.
//!
//! The index space is split into fixed-size segments ([`segment::Segment`])
//! held in a sparse ordered directory ([`SegmentedBitset`]). Each segment
//! caches its population count and local min/max set bit, which lets the
//! directory maintain the global head (smallest set index) and tail (one past
//! the largest set index) with O(1) work on the common paths.

pub mod bitset;
pub mod segment;

pub use bitset::SegmentedBitset;
