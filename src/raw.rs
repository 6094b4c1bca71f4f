//! `RawSlotBitmap`: the unchecked, arena-style slot-state index.

use core::{ptr::NonNull, slice};

use crate::{
    allocator::WordAllocator,
    bits::{first_one_bit, first_zero_bit, is_found, last_one_bit, next_one_bit, prev_one_bit},
    iter::ActiveSlots,
    macros::{bit, bitpos},
    storage::{
        MAX_SLOTS, WORD_BITS, allocate_words, release_words, tail_mask, word_count, words_mask,
    },
    traits::SlotBitmapError,
};

/// A two-level bitmap tracking which slots of a fixed-capacity bucket are
/// active and which are open for reuse.
///
/// # Layout
///
/// - A word array with one bit per slot (`1` = active).
/// - An *active summary*: bit `w` is set iff word `w` has an active slot.
/// - An *open summary*: bit `w` is set iff word `w` has an open slot.
///
/// The summaries let [`first_open_index`](Self::first_open_index) and
/// [`next_active_index`](Self::next_active_index) skip whole words with a
/// single bit scan, so a run of open slots is crossed in O(1).
///
/// # Ownership
///
/// The structure does not free its storage on drop. Storage obtained through
/// [`construct`](Self::construct) must be returned with exactly one call to
/// [`destroy`](Self::destroy), passing the same allocator and capacity.
/// Forgetting to do so leaks the words. [`SlotBitmap`](crate::SlotBitmap)
/// wraps this contract in RAII.
///
/// # Unchecked operations
///
/// Slot operations are `unsafe`: slot indices are not bounds-checked and the
/// first/last queries require the matching slot to exist. Debug builds assert
/// these preconditions.
///
/// # Examples
///
/// ```
/// use slot_bitmap::{Global, RawSlotBitmap};
///
/// let mut raw = RawSlotBitmap::construct(&Global, 130).unwrap();
/// unsafe {
///     raw.set(0);
///     raw.set(64);
///     raw.set(129);
///     assert_eq!(raw.first_active_index(), 0);
///     assert_eq!(raw.next_active_index(0), Some(64));
///     assert_eq!(raw.prev_active_index(129), Some(64));
///     assert_eq!(raw.first_open_index(), 1);
///     raw.destroy(&Global, 130);
/// }
/// ```
pub struct RawSlotBitmap {
    words: Option<NonNull<u64>>,
    active: u64,
    open: u64,
    /// Addressable bits of the last word.
    tail: u64,
    /// Index of the last word.
    last: usize,
}

// SAFETY: The word array is uniquely owned, like a `Box<[u64]>`, and every
// mutation goes through `&mut self`.
unsafe impl Send for RawSlotBitmap {}
// SAFETY: No interior mutability.
unsafe impl Sync for RawSlotBitmap {}

impl Default for RawSlotBitmap {
    /// A bitmap without storage: no active slot, and every summary word
    /// nominally open. Only the safe queries and traversal may be used on it.
    fn default() -> Self {
        Self::new()
    }
}

impl RawSlotBitmap {
    /// Creates a bitmap without storage. See [`Default`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: None,
            active: 0,
            open: !0,
            tail: !0,
            last: 0,
        }
    }

    /// Allocates storage for `capacity` slots, all open.
    ///
    /// # Errors
    ///
    /// - [`SlotBitmapError::CapacityOverflow`] if `capacity > MAX_SLOTS`.
    /// - [`SlotBitmapError::Alloc`] if the allocator fails.
    ///
    /// Nothing is allocated or retained on failure.
    pub fn construct<A>(allocator: &A, capacity: usize) -> Result<Self, SlotBitmapError>
    where
        A: WordAllocator + ?Sized,
    {
        if capacity > MAX_SLOTS {
            log::debug!("rejecting slot bitmap capacity {capacity} (max {MAX_SLOTS})");
            return Err(SlotBitmapError::CapacityOverflow {
                capacity,
                max: MAX_SLOTS,
            });
        }

        let n = word_count(capacity);
        let words = allocate_words(allocator, n).inspect_err(|err| {
            log::debug!("slot bitmap allocation failed: {err}");
        })?;
        log::trace!("constructed slot bitmap: capacity={capacity} words={n}");

        let tail = tail_mask(capacity);
        let last = n - 1;
        let mut open = words_mask(n);
        if tail == 0 {
            // capacity 0: the only word has no addressable slot
            open &= !bit!(last);
        }

        Ok(Self {
            words: Some(words),
            active: 0,
            open,
            tail,
            last,
        })
    }

    /// Releases the storage obtained from [`construct`](Self::construct).
    ///
    /// Does nothing for a bitmap without storage.
    ///
    /// # Safety
    ///
    /// `allocator` must be the allocator passed to `construct`, and
    /// `capacity` the capacity passed to it.
    pub unsafe fn destroy<A>(self, allocator: &A, capacity: usize)
    where
        A: WordAllocator + ?Sized,
    {
        let Some(words) = self.words else {
            return;
        };
        let n = word_count(capacity);
        debug_assert_eq!(
            n,
            self.last + 1,
            "destroyed with capacity {capacity} that does not match construction"
        );
        log::trace!("destroying slot bitmap: capacity={capacity} words={n}");
        // SAFETY: `words` came from `allocate_words(allocator, n)` as the
        // caller guarantees the construction arguments, and `self` is consumed.
        unsafe { release_words(allocator, words, n) }
    }

    /// Returns `true` if storage has been allocated.
    #[must_use]
    #[inline]
    pub const fn is_allocated(&self) -> bool {
        self.words.is_some()
    }

    /// Returns `true` if no slot is active.
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Returns `true` if no slot is open.
    ///
    /// A bitmap without storage is never full.
    #[must_use]
    #[inline]
    pub const fn is_full(&self) -> bool {
        self.open == 0
    }

    /// The active summary word.
    #[must_use]
    #[inline]
    pub const fn active_summary(&self) -> u64 {
        self.active
    }

    /// The open summary word.
    #[must_use]
    #[inline]
    pub const fn open_summary(&self) -> u64 {
        self.open
    }

    /// The word array, empty for a bitmap without storage.
    #[must_use]
    #[inline]
    pub const fn as_slice(&self) -> &[u64] {
        match self.words {
            // SAFETY: `words` is valid for `last + 1` initialized words until
            // `destroy` consumes `self`.
            Some(words) => unsafe { slice::from_raw_parts(words.as_ptr(), self.last + 1) },
            None => &[],
        }
    }

    /// Number of active slots.
    #[must_use]
    pub fn count_active(&self) -> usize {
        self.as_slice()
            .iter()
            .map(|w| w.count_ones() as usize)
            .sum()
    }

    /// The value of word `wi` when every addressable slot in it is active.
    #[inline(always)]
    const fn full_mask(&self, wi: usize) -> u64 {
        if wi == self.last { self.tail } else { !0 }
    }

    #[inline(always)]
    unsafe fn word(&self, wi: usize) -> u64 {
        debug_assert!(wi <= self.last, "word index {wi} out of bounds");
        debug_assert!(self.words.is_some(), "slot bitmap has no storage");
        match self.words {
            // SAFETY: Caller guarantees `wi <= last`.
            Some(words) => unsafe { *words.as_ptr().add(wi) },
            None => 0,
        }
    }

    #[inline(always)]
    unsafe fn word_mut(&mut self, wi: usize) -> &mut u64 {
        debug_assert!(wi <= self.last, "word index {wi} out of bounds");
        debug_assert!(self.words.is_some(), "slot bitmap has no storage");
        // SAFETY: Caller guarantees storage exists and `wi <= last`.
        unsafe { &mut *self.words.unwrap_unchecked().as_ptr().add(wi) }
    }

    #[inline(always)]
    fn debug_check_slot(&self, i: usize) {
        let (wi, bi) = bitpos!(i);
        debug_assert!(
            self.words.is_some() && wi <= self.last && self.full_mask(wi) & bit!(bi) != 0,
            "slot index {i} out of bounds"
        );
    }

    /// Returns `true` if slot `i` is active.
    ///
    /// # Safety
    ///
    /// Storage must be allocated and `i` must be below the capacity.
    #[must_use]
    #[inline]
    pub unsafe fn test(&self, i: usize) -> bool {
        self.debug_check_slot(i);
        let (wi, bi) = bitpos!(i);
        // SAFETY: Forwarded from the caller.
        unsafe { self.word(wi) & bit!(bi) != 0 }
    }

    /// Marks slot `i` active.
    ///
    /// # Safety
    ///
    /// Storage must be allocated and `i` must be below the capacity.
    #[inline]
    pub unsafe fn set(&mut self, i: usize) {
        self.debug_check_slot(i);
        let (wi, bi) = bitpos!(i);
        let full = self.full_mask(wi);
        // SAFETY: Forwarded from the caller.
        let word = unsafe { self.word_mut(wi) };
        *word |= bit!(bi);
        let now_full = *word == full;

        self.active |= bit!(wi);
        if now_full {
            self.open &= !bit!(wi);
        }
    }

    /// Marks slot `i` open.
    ///
    /// # Safety
    ///
    /// Storage must be allocated and `i` must be below the capacity.
    #[inline]
    pub unsafe fn reset(&mut self, i: usize) {
        self.debug_check_slot(i);
        let (wi, bi) = bitpos!(i);
        // SAFETY: Forwarded from the caller.
        let word = unsafe { self.word_mut(wi) };
        *word &= !bit!(bi);
        let now_empty = *word == 0;

        self.open |= bit!(wi);
        if now_empty {
            self.active &= !bit!(wi);
        }
    }

    /// Overwrites word `wi` and rederives its summary bits.
    ///
    /// # Safety
    ///
    /// Storage must be allocated, `wi` must be below the word count, and
    /// `word` must not set bits beyond the capacity.
    pub unsafe fn put_word(&mut self, wi: usize, word: u64) {
        let full = self.full_mask(wi);
        debug_assert!(
            word & !full == 0,
            "word {word:#x} sets slots beyond the capacity"
        );
        // SAFETY: Forwarded from the caller.
        unsafe { *self.word_mut(wi) = word };

        let mask = bit!(wi);
        if word != 0 {
            self.active |= mask;
        } else {
            self.active &= !mask;
        }
        if word != full {
            self.open |= mask;
        } else {
            self.open &= !mask;
        }
    }

    /// Marks every slot open.
    pub fn clear(&mut self) {
        let Some(words) = self.words else {
            return;
        };
        let n = self.last + 1;
        // SAFETY: `words` is valid for `n` words.
        unsafe { words.as_ptr().write_bytes(0, n) };
        self.active = 0;
        self.open = words_mask(n);
        if self.tail == 0 {
            self.open &= !bit!(self.last);
        }
    }

    /// Index of the lowest active slot.
    ///
    /// # Safety
    ///
    /// At least one slot must be active.
    #[must_use]
    #[inline]
    pub unsafe fn first_active_index(&self) -> usize {
        debug_assert!(!self.is_empty(), "no active slot");
        let wi = first_one_bit(self.active);
        // SAFETY: A set summary bit names an existing word.
        let bi = first_one_bit(unsafe { self.word(wi) });
        wi * WORD_BITS + bi
    }

    /// Index of the highest active slot.
    ///
    /// # Safety
    ///
    /// At least one slot must be active.
    #[must_use]
    #[inline]
    pub unsafe fn last_active_index(&self) -> usize {
        debug_assert!(!self.is_empty(), "no active slot");
        let wi = last_one_bit(self.active);
        // SAFETY: A set summary bit names an existing word.
        let bi = last_one_bit(unsafe { self.word(wi) });
        wi * WORD_BITS + bi
    }

    /// Index of the lowest open slot.
    ///
    /// # Safety
    ///
    /// Storage must be allocated and at least one slot must be open.
    #[must_use]
    #[inline]
    pub unsafe fn first_open_index(&self) -> usize {
        debug_assert!(self.words.is_some() && !self.is_full(), "no open slot");
        let wi = first_one_bit(self.open);
        // SAFETY: With storage allocated, a set open bit names an existing word.
        let bi = first_zero_bit(unsafe { self.word(wi) });
        wi * WORD_BITS + bi
    }

    /// Index of the lowest active slot after `i`, or `None`.
    ///
    /// Returns `None` for a bitmap without storage.
    ///
    /// # Safety
    ///
    /// `i` must be below the capacity.
    #[must_use]
    #[inline]
    pub unsafe fn next_active_index(&self, i: usize) -> Option<usize> {
        self.words?;
        self.debug_check_slot(i);
        let (wi, bi) = bitpos!(i);

        // SAFETY: Forwarded from the caller.
        let bi = next_one_bit(unsafe { self.word(wi) }, bi);
        if is_found(bi) {
            return Some(wi * WORD_BITS + bi);
        }

        let wi = next_one_bit(self.active, wi);
        if is_found(wi) {
            // SAFETY: A set summary bit names an existing word.
            let bi = first_one_bit(unsafe { self.word(wi) });
            return Some(wi * WORD_BITS + bi);
        }
        None
    }

    /// Index of the highest active slot before `i`, or `None`.
    ///
    /// Returns `None` for a bitmap without storage.
    ///
    /// # Safety
    ///
    /// `i` must be below the capacity.
    #[must_use]
    #[inline]
    pub unsafe fn prev_active_index(&self, i: usize) -> Option<usize> {
        self.words?;
        self.debug_check_slot(i);
        let (wi, bi) = bitpos!(i);

        // SAFETY: Forwarded from the caller.
        let bi = prev_one_bit(unsafe { self.word(wi) }, bi);
        if is_found(bi) {
            return Some(wi * WORD_BITS + bi);
        }

        let wi = prev_one_bit(self.active, wi);
        if is_found(wi) {
            // SAFETY: A set summary bit names an existing word.
            let bi = last_one_bit(unsafe { self.word(wi) });
            return Some(wi * WORD_BITS + bi);
        }
        None
    }

    /// Iterates over active slots in increasing order.
    #[must_use]
    pub fn iter(&self) -> ActiveSlots<'_> {
        ActiveSlots::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::Global;

    fn assert_summaries(raw: &RawSlotBitmap, capacity: usize) {
        let words = raw.as_slice();
        let last = words.len() - 1;
        for (wi, &word) in words.iter().enumerate() {
            let full = if wi == last { tail_mask(capacity) } else { !0 };
            assert_eq!(raw.active & bit!(wi) != 0, word != 0, "active bit {wi}");
            assert_eq!(raw.open & bit!(wi) != 0, word != full, "open bit {wi}");
        }
    }

    #[test]
    fn test_default_has_no_storage() {
        let raw = RawSlotBitmap::default();
        assert!(!raw.is_allocated());
        assert!(raw.is_empty());
        assert_eq!(raw.open_summary(), !0);
        assert!(raw.as_slice().is_empty());
        assert_eq!(unsafe { raw.next_active_index(0) }, None);
        assert_eq!(unsafe { raw.prev_active_index(0) }, None);
        assert_eq!(raw.iter().count(), 0);
    }

    #[test]
    fn test_construct_summaries() {
        for capacity in [0, 1, 63, 64, 65, 130, 4096] {
            let raw = RawSlotBitmap::construct(&Global, capacity).unwrap();
            assert_eq!(raw.as_slice().len(), word_count(capacity));
            assert_eq!(raw.active_summary(), 0);
            assert_summaries(&raw, capacity);
            unsafe { raw.destroy(&Global, capacity) };
        }
    }

    #[test]
    fn test_set_reset_maintain_summaries() {
        let capacity = 130;
        let mut raw = RawSlotBitmap::construct(&Global, capacity).unwrap();
        for i in (0..capacity).step_by(3) {
            unsafe { raw.set(i) };
            assert_summaries(&raw, capacity);
        }
        for i in 0..capacity {
            unsafe { raw.set(i) };
            assert_summaries(&raw, capacity);
        }
        assert!(raw.is_full());
        for i in (0..capacity).rev() {
            unsafe { raw.reset(i) };
            assert_summaries(&raw, capacity);
        }
        assert!(raw.is_empty());
        unsafe { raw.destroy(&Global, capacity) };
    }

    #[test]
    fn test_tail_bits_never_open() {
        let capacity = 66;
        let mut raw = RawSlotBitmap::construct(&Global, capacity).unwrap();
        for i in 0..capacity {
            assert_eq!(unsafe { raw.first_open_index() }, i);
            unsafe { raw.set(i) };
        }
        assert!(raw.is_full());
        assert_eq!(raw.open_summary(), 0);
        unsafe { raw.destroy(&Global, capacity) };
    }

    #[test]
    fn test_put_word_rederives_summaries() {
        let capacity = 130;
        let mut raw = RawSlotBitmap::construct(&Global, capacity).unwrap();
        unsafe {
            raw.put_word(0, !0);
            raw.put_word(1, 1 << 7);
            raw.put_word(2, 0b11);
        }
        assert_summaries(&raw, capacity);
        assert_eq!(raw.open_summary(), 0b010);
        assert_eq!(unsafe { raw.first_open_index() }, 64);

        unsafe { raw.put_word(0, 0) };
        assert_summaries(&raw, capacity);
        assert_eq!(unsafe { raw.first_active_index() }, 71);
        unsafe { raw.destroy(&Global, capacity) };
    }

    #[test]
    fn test_clear() {
        let mut raw = RawSlotBitmap::construct(&Global, 100).unwrap();
        unsafe {
            raw.set(3);
            raw.set(99);
        }
        raw.clear();
        assert!(raw.is_empty());
        assert_eq!(raw.count_active(), 0);
        assert_summaries(&raw, 100);
        unsafe { raw.destroy(&Global, 100) };
    }
}
