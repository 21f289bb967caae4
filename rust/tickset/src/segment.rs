//! A fixed-capacity bit segment with cached population count and local
//! extrema.
//!
//! Segments are the unit of storage of the sparse directory: each one covers
//! an aligned, fixed-size window of [`Segment::BITS`] positions of the global
//! index space, packed one bit per position into `u64` words. Alongside the
//! raw bits, a segment caches its population count and the offsets of its
//! smallest and largest set bit, so the directory can combine segment extrema
//! without touching word storage on the common paths.

const WORD_BITS: usize = 64;
const WORD_COUNT: usize = Segment::BITS / WORD_BITS;

/// A fixed-capacity bit array with cached local extrema.
///
/// Storage is 256 little-endian `u64` words: bit 0 is the LSB of word 0, bit
/// 63 its MSB, bit 64 the LSB of word 1, and so on. The struct is cache-line
/// aligned; the directory heap-allocates segments and owns them exclusively.
///
/// Cached state:
/// - `count` is the number of set bits.
/// - `local_min` / `local_max` are the offsets of the smallest and largest
///   set bit, defined only while `count > 0`. When the segment is empty they
///   hold sentinels (`usize::MAX` / `0`) and must not be read.
///
/// Setting a bit can only extend the extrema, so [`Segment::set`] maintains
/// them with two comparisons. Clearing an extremum bit triggers a local
/// rescan over the words, bounded by the fixed word count regardless of
/// population.
#[repr(align(64))]
pub struct Segment {
    words: [u64; WORD_COUNT],
    count: usize,
    local_min: usize,
    local_max: usize,
}

impl Segment {
    /// Number of bit positions covered by one segment.
    pub const BITS: usize = 16384;

    /// Creates an empty segment with all bits clear and sentinel extrema.
    pub fn empty() -> Segment {
        Segment {
            words: [0; WORD_COUNT],
            count: 0,
            local_min: usize::MAX,
            local_max: 0,
        }
    }

    #[inline]
    fn bit_position(bit: usize) -> (usize, u64) {
        debug_assert!(bit < Self::BITS, "Bit offset {bit} out of segment range");
        (bit / WORD_BITS, 1u64 << (bit % WORD_BITS))
    }

    /// Checks whether the bit at `bit` is set.
    #[inline]
    pub fn contains(&self, bit: usize) -> bool {
        let (word_index, mask) = Self::bit_position(bit);
        self.words[word_index] & mask != 0
    }

    /// Sets the bit at `bit`, returning `true` if it was newly set.
    ///
    /// Idempotent: setting an already-set bit leaves the segment untouched
    /// and returns `false`. On insertion the cached extrema are extended with
    /// two comparisons; a new bit can only widen them, never invalidate one.
    #[inline]
    pub fn set(&mut self, bit: usize) -> bool {
        let (word_index, mask) = Self::bit_position(bit);
        let word = &mut self.words[word_index];
        if *word & mask != 0 {
            return false;
        }
        *word |= mask;
        self.count += 1;
        self.local_min = self.local_min.min(bit);
        self.local_max = self.local_max.max(bit);
        true
    }

    /// Clears the bit at `bit`, returning `true` if it was previously set.
    ///
    /// Idempotent: clearing a clear bit is a no-op returning `false`. When
    /// the last bit goes away the extrema revert to their sentinels; when the
    /// cleared bit was a cached extremum, the corresponding extremum is
    /// recomputed by a word walk.
    pub fn unset(&mut self, bit: usize) -> bool {
        let (word_index, mask) = Self::bit_position(bit);
        let word = &mut self.words[word_index];
        if *word & mask == 0 {
            return false;
        }
        *word &= !mask;
        self.count -= 1;

        if self.count == 0 {
            self.local_min = usize::MAX;
            self.local_max = 0;
            return true;
        }
        if bit == self.local_min {
            self.rescan_local_min();
        }
        if bit == self.local_max {
            self.rescan_local_max();
        }
        true
    }

    /// Returns the number of set bits.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Offset of the smallest set bit. Meaningful only while `count() > 0`.
    #[inline]
    pub fn local_min(&self) -> usize {
        debug_assert!(self.count > 0, "local_min read on an empty segment");
        self.local_min
    }

    /// Offset of the largest set bit. Meaningful only while `count() > 0`.
    #[inline]
    pub fn local_max(&self) -> usize {
        debug_assert!(self.count > 0, "local_max read on an empty segment");
        self.local_max
    }

    /// Iterates the set bit offsets in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(word_index, &word)| {
            let base = word_index * WORD_BITS;
            std::iter::successors((word != 0).then_some(word), |&w| {
                let w = w & (w - 1);
                (w != 0).then_some(w)
            })
            .map(move |w| base + w.trailing_zeros() as usize)
        })
    }

    /// Recomputes `local_min` by scanning words low to high for the first
    /// nonzero word. Requires `count > 0`.
    fn rescan_local_min(&mut self) {
        debug_assert!(self.count > 0, "local rescan on an empty segment");
        for (word_index, &word) in self.words.iter().enumerate() {
            if word != 0 {
                self.local_min = word_index * WORD_BITS + word.trailing_zeros() as usize;
                return;
            }
        }
    }

    /// Recomputes `local_max` by scanning words high to low for the last
    /// nonzero word. Requires `count > 0`.
    fn rescan_local_max(&mut self) {
        debug_assert!(self.count > 0, "local rescan on an empty segment");
        for (word_index, &word) in self.words.iter().enumerate().rev() {
            if word != 0 {
                self.local_max = word_index * WORD_BITS
                    + (WORD_BITS - 1 - word.leading_zeros() as usize);
                return;
            }
        }
    }
}

impl Default for Segment {
    fn default() -> Segment {
        Segment::empty()
    }
}
