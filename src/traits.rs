//! Error types and trait implementations for the slot bitmaps.

use core::{
    fmt,
    hash::{Hash, Hasher},
    mem,
};

use crate::{
    RawSlotBitmap, SlotBitmap,
    allocator::{AllocError, WordAllocator},
};

/// Errors that can occur when constructing a slot bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotBitmapError {
    /// The requested capacity exceeds what the summaries can address.
    CapacityOverflow {
        /// The requested capacity
        capacity: usize,
        /// The largest supported capacity
        max: usize,
    },

    /// The allocator could not provide the word storage.
    Alloc(AllocError),
}

impl fmt::Display for SlotBitmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityOverflow { capacity, max } => {
                write!(
                    f,
                    "slot bitmap capacity {capacity} exceeds the maximum of {max} slots"
                )
            }
            Self::Alloc(err) => fmt::Display::fmt(err, f),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SlotBitmapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Alloc(err) => Some(err),
            Self::CapacityOverflow { .. } => None,
        }
    }
}

impl From<AllocError> for SlotBitmapError {
    fn from(err: AllocError) -> Self {
        Self::Alloc(err)
    }
}

impl fmt::Debug for RawSlotBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawSlotBitmap")
            .field("active", &format_args!("{:#b}", self.active_summary()))
            .field("open", &format_args!("{:#b}", self.open_summary()))
            .field("words", &self.as_slice())
            .finish()
    }
}

impl<A: WordAllocator> fmt::Debug for SlotBitmap<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = f.debug_set();
        for slot in self {
            w.entry(&slot);
        }
        w.finish()
    }
}

impl<A: WordAllocator> fmt::Display for SlotBitmap<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(self, f)
    }
}

impl<A: WordAllocator> fmt::Binary for SlotBitmap<A> {
    /// Formats the slot states as a binary string, highest slot first, with
    /// exactly `capacity` digits.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_bitmap::SlotBitmap;
    ///
    /// let mut slots = SlotBitmap::new(6).unwrap();
    /// slots.set(0);
    /// slots.set(4);
    /// assert_eq!(format!("{slots:b}"), "010001");
    /// assert_eq!(format!("{slots:#b}"), "0b010001");
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str("0b")?;
        }
        let words = self.as_slice();
        let [rem @ .., hi] = words else {
            return Ok(());
        };

        let hi_bits = self.capacity - rem.len() * crate::WORD_BITS;
        if hi_bits > 0 {
            write!(f, "{hi:0hi_bits$b}")?;
        }
        for &word in rem.iter().rev() {
            write!(f, "{word:064b}")?;
        }
        Ok(())
    }
}

impl<A: WordAllocator, B: WordAllocator> PartialEq<SlotBitmap<B>> for SlotBitmap<A> {
    fn eq(&self, other: &SlotBitmap<B>) -> bool {
        self.capacity == other.capacity && self.as_slice() == other.as_slice()
    }
}

impl<A: WordAllocator> Eq for SlotBitmap<A> {}

impl<A: WordAllocator> Hash for SlotBitmap<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.capacity.hash(state);
        self.as_slice().hash(state);
    }
}

// Release storage on drop
impl<A: WordAllocator> Drop for SlotBitmap<A> {
    fn drop(&mut self) {
        let raw = mem::take(&mut self.raw);
        // SAFETY: `raw` was constructed with this allocator and capacity.
        unsafe { raw.destroy(&self.allocator, self.capacity) }
    }
}
