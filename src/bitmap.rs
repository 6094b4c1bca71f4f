//! `SlotBitmap` struct and its checked API.

use core::{
    mem::{self, ManuallyDrop},
    ptr,
};

use crate::{
    RawSlotBitmap,
    allocator::{Global, WordAllocator},
    iter::ActiveSlots,
    storage::{tail_mask, word_count},
    traits::SlotBitmapError,
};

/// An owned slot-state bitmap with a fixed capacity.
///
/// # Overview
///
/// `SlotBitmap` records, for each of `capacity` slots, whether the slot is
/// *active* (holds an element) or *open* (free for reuse). It is meant to sit
/// next to the element storage of a fixed-size bucket: the owner calls
/// [`set`](Self::set) and [`reset`](Self::reset) as it places and removes
/// elements, [`first_open`](Self::first_open) to choose where to place the
/// next one, and [`iter`](Self::iter) or
/// [`next_active`](Self::next_active) to visit live elements.
///
/// # Relationship to `RawSlotBitmap`
///
/// This type owns a [`RawSlotBitmap`] together with its capacity and
/// allocator, bounds-checks every index, turns precondition violations of
/// the raw queries into `None`, and releases the storage on drop. Use
/// [`into_raw_parts`](Self::into_raw_parts) to hand the raw structure to a
/// container that manages storage itself.
///
/// # Capacity
///
/// The capacity is at most [`MAX_SLOTS`](crate::MAX_SLOTS) and never
/// changes.
///
/// # Examples
///
/// ```
/// use slot_bitmap::SlotBitmap;
///
/// let mut slots = SlotBitmap::new(130).unwrap();
/// for i in [0, 63, 64, 129] {
///     slots.set(i);
/// }
///
/// assert_eq!(slots.first_active(), Some(0));
/// assert_eq!(slots.next_active(0), Some(63));
/// assert_eq!(slots.next_active(64), Some(129));
/// assert_eq!(slots.next_active(129), None);
/// assert_eq!(slots.last_active(), Some(129));
/// assert_eq!(slots.first_open(), Some(1));
/// ```
pub struct SlotBitmap<A: WordAllocator = Global> {
    pub(crate) raw: RawSlotBitmap,
    pub(crate) capacity: usize,
    pub(crate) allocator: A,
}

impl SlotBitmap {
    /// Creates a bitmap with `capacity` open slots on the global heap.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` exceeds
    /// [`MAX_SLOTS`](crate::MAX_SLOTS) or if allocation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_bitmap::{MAX_SLOTS, SlotBitmap};
    ///
    /// let slots = SlotBitmap::new(100).unwrap();
    /// assert_eq!(slots.capacity(), 100);
    /// assert!(slots.is_empty());
    ///
    /// assert!(SlotBitmap::new(MAX_SLOTS + 1).is_err());
    /// ```
    pub fn new(capacity: usize) -> Result<Self, SlotBitmapError> {
        Self::new_in(capacity, Global)
    }
}

impl<A: WordAllocator> SlotBitmap<A> {
    /// Creates a bitmap with `capacity` open slots using `allocator`.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` exceeds
    /// [`MAX_SLOTS`](crate::MAX_SLOTS) or if allocation fails.
    pub fn new_in(capacity: usize, allocator: A) -> Result<Self, SlotBitmapError> {
        let raw = RawSlotBitmap::construct(&allocator, capacity)?;
        Ok(Self {
            raw,
            capacity,
            allocator,
        })
    }

    /// Reassembles a bitmap from the parts returned by
    /// [`into_raw_parts`](Self::into_raw_parts).
    ///
    /// # Safety
    ///
    /// `raw` must have been constructed with `allocator` (or an allocator
    /// that can release its storage) and `capacity`, and not destroyed.
    pub unsafe fn from_raw_parts(raw: RawSlotBitmap, capacity: usize, allocator: A) -> Self {
        debug_assert!(raw.is_allocated());
        debug_assert_eq!(raw.as_slice().len(), word_count(capacity));
        Self {
            raw,
            capacity,
            allocator,
        }
    }

    /// Decomposes the bitmap into its raw structure, capacity and allocator.
    ///
    /// The caller becomes responsible for
    /// [`RawSlotBitmap::destroy`] with the returned allocator and capacity.
    #[must_use]
    pub fn into_raw_parts(self) -> (RawSlotBitmap, usize, A) {
        let mut this = ManuallyDrop::new(self);
        let raw = mem::take(&mut this.raw);
        // SAFETY: `this` is never dropped, so the allocator is moved out once.
        let allocator = unsafe { ptr::read(&this.allocator) };
        (raw, this.capacity, allocator)
    }

    /// Allocates a copy of this bitmap with a clone of its allocator.
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails.
    pub fn try_clone(&self) -> Result<Self, SlotBitmapError>
    where
        A: Clone,
    {
        let mut copy = Self::new_in(self.capacity, self.allocator.clone())?;
        for (wi, &word) in self.raw.as_slice().iter().enumerate() {
            // SAFETY: Same capacity, so same word count and tail.
            unsafe { copy.raw.put_word(wi, word) };
        }
        Ok(copy)
    }

    /// Number of slots.
    #[must_use]
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of storage words.
    #[must_use]
    #[inline]
    pub const fn word_count(&self) -> usize {
        word_count(self.capacity)
    }

    /// The allocator backing this bitmap.
    #[must_use]
    pub const fn allocator(&self) -> &A {
        &self.allocator
    }

    /// The underlying raw bitmap.
    #[must_use]
    pub const fn as_raw(&self) -> &RawSlotBitmap {
        &self.raw
    }

    /// Returns `true` if slot `i` is active. Out-of-range slots are open.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_bitmap::SlotBitmap;
    ///
    /// let mut slots = SlotBitmap::new(10).unwrap();
    /// slots.set(4);
    /// assert!(slots.test(4));
    /// assert!(!slots.test(5));
    /// assert!(!slots.test(1000));
    /// ```
    #[must_use]
    #[inline]
    pub fn test(&self, i: usize) -> bool {
        // SAFETY: Storage is allocated and `i` is checked.
        i < self.capacity && unsafe { self.raw.test(i) }
    }

    /// Marks slot `i` active.
    ///
    /// Returns `true` if the slot was open.
    ///
    /// # Panics
    ///
    /// Panics if `i >= capacity`.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_bitmap::SlotBitmap;
    ///
    /// let mut slots = SlotBitmap::new(10).unwrap();
    /// assert!(slots.set(3));
    /// assert!(!slots.set(3));
    /// ```
    #[inline]
    #[track_caller]
    pub fn set(&mut self, i: usize) -> bool {
        self.check_slot(i);
        // SAFETY: Storage is allocated and `i` is in bounds.
        unsafe {
            let was = self.raw.test(i);
            self.raw.set(i);
            !was
        }
    }

    /// Marks slot `i` open.
    ///
    /// Returns `true` if the slot was active.
    ///
    /// # Panics
    ///
    /// Panics if `i >= capacity`.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_bitmap::SlotBitmap;
    ///
    /// let mut slots = SlotBitmap::new(10).unwrap();
    /// slots.set(3);
    /// assert!(slots.reset(3));
    /// assert!(!slots.reset(3));
    /// ```
    #[inline]
    #[track_caller]
    pub fn reset(&mut self, i: usize) -> bool {
        self.check_slot(i);
        // SAFETY: Storage is allocated and `i` is in bounds.
        unsafe {
            let was = self.raw.test(i);
            self.raw.reset(i);
            was
        }
    }

    #[inline(always)]
    #[track_caller]
    fn check_slot(&self, i: usize) {
        assert!(
            i < self.capacity,
            "slot index {i} out of bounds for capacity {}",
            self.capacity
        );
    }

    /// Index of the lowest active slot, or `None` if no slot is active.
    #[must_use]
    #[inline]
    pub fn first_active(&self) -> Option<usize> {
        // SAFETY: Only called with an active slot present.
        (!self.raw.is_empty()).then(|| unsafe { self.raw.first_active_index() })
    }

    /// Index of the highest active slot, or `None` if no slot is active.
    #[must_use]
    #[inline]
    pub fn last_active(&self) -> Option<usize> {
        // SAFETY: Only called with an active slot present.
        (!self.raw.is_empty()).then(|| unsafe { self.raw.last_active_index() })
    }

    /// Index of the lowest open slot, or `None` if every slot is active.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_bitmap::SlotBitmap;
    ///
    /// let mut slots = SlotBitmap::new(2).unwrap();
    /// assert_eq!(slots.first_open(), Some(0));
    /// slots.set(0);
    /// assert_eq!(slots.first_open(), Some(1));
    /// slots.set(1);
    /// assert_eq!(slots.first_open(), None);
    /// ```
    #[must_use]
    #[inline]
    pub fn first_open(&self) -> Option<usize> {
        // SAFETY: Storage is allocated and an open slot is present.
        (!self.raw.is_full()).then(|| unsafe { self.raw.first_open_index() })
    }

    /// Index of the lowest active slot after `i`.
    ///
    /// Returns `None` if there is none or `i` is out of range.
    #[must_use]
    #[inline]
    pub fn next_active(&self, i: usize) -> Option<usize> {
        if i >= self.capacity {
            return None;
        }
        // SAFETY: `i` is in bounds.
        unsafe { self.raw.next_active_index(i) }
    }

    /// Index of the highest active slot before `i`.
    ///
    /// An out-of-range `i` yields the last active slot.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_bitmap::SlotBitmap;
    ///
    /// let mut slots = SlotBitmap::new(100).unwrap();
    /// slots.set(10);
    /// slots.set(80);
    /// assert_eq!(slots.prev_active(80), Some(10));
    /// assert_eq!(slots.prev_active(10), None);
    /// assert_eq!(slots.prev_active(500), Some(80));
    /// ```
    #[must_use]
    #[inline]
    pub fn prev_active(&self, i: usize) -> Option<usize> {
        if i >= self.capacity {
            return self.last_active();
        }
        // SAFETY: `i` is in bounds.
        unsafe { self.raw.prev_active_index(i) }
    }

    /// Returns the number of active slots.
    ///
    /// Time complexity: O(n) where n is the number of words. Use
    /// [`is_empty`](Self::is_empty) or [`is_full`](Self::is_full) for the
    /// O(1) checks.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_bitmap::SlotBitmap;
    ///
    /// let mut slots = SlotBitmap::new(200).unwrap();
    /// assert_eq!(slots.len(), 0);
    ///
    /// slots.set(10);
    /// slots.set(150);
    /// assert_eq!(slots.len(), 2);
    /// ```
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.count_active()
    }

    /// Returns `true` if no slot is active.
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns `true` if no slot is open.
    #[must_use]
    #[inline]
    pub const fn is_full(&self) -> bool {
        self.raw.is_full()
    }

    /// Marks every slot open, keeping the allocation.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Iterates over active slots in increasing order.
    #[must_use]
    pub fn iter(&self) -> ActiveSlots<'_> {
        self.raw.iter()
    }

    /// The storage words, one bit per slot.
    #[must_use]
    pub const fn as_slice(&self) -> &[u64] {
        self.raw.as_slice()
    }

    /// Returns word `wi`, or `0` past the last word.
    #[must_use]
    pub fn word(&self, wi: usize) -> u64 {
        self.as_slice().get(wi).copied().unwrap_or(0)
    }

    /// Overwrites the 64 slots of word `wi` at once.
    ///
    /// Bits beyond the capacity are ignored.
    ///
    /// # Panics
    ///
    /// Panics if `wi` is not below [`word_count`](Self::word_count).
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_bitmap::SlotBitmap;
    ///
    /// let mut slots = SlotBitmap::new(70).unwrap();
    /// slots.put_word(1, !0);
    /// assert_eq!(slots.word(1), 0b11_1111);
    /// assert_eq!(slots.first_active(), Some(64));
    /// ```
    #[track_caller]
    pub fn put_word(&mut self, wi: usize, word: u64) {
        let n = self.word_count();
        assert!(wi < n, "word index {wi} out of bounds for {n} words");
        let word = if wi == n - 1 {
            word & tail_mask(self.capacity)
        } else {
            word
        };
        // SAFETY: `wi` is in bounds and `word` is masked to the capacity.
        unsafe { self.raw.put_word(wi, word) };
    }
}
