//! Word storage layout and management for the slot bitmap.

use core::ptr::NonNull;

use crate::allocator::{AllocError, WordAllocator};

/// Number of slots tracked by a single storage word.
pub const WORD_BITS: usize = u64::BITS as usize;
pub(crate) const WORD_SHIFT: u32 = WORD_BITS.trailing_zeros();

/// Maximum number of storage words.
///
/// Each summary is itself a single word with one flag per storage word, so
/// the summaries can address at most `WORD_BITS` words.
pub const MAX_WORDS: usize = WORD_BITS;

/// Maximum number of slots a bitmap can be constructed with.
pub const MAX_SLOTS: usize = MAX_WORDS * WORD_BITS;

/// Number of storage words allocated for `capacity` slots.
///
/// At least one word is always allocated, even for a capacity of zero.
///
/// # Examples
///
/// ```
/// use slot_bitmap::word_count;
///
/// assert_eq!(word_count(0), 1);
/// assert_eq!(word_count(64), 1);
/// assert_eq!(word_count(65), 2);
/// assert_eq!(word_count(130), 3);
/// ```
#[inline]
#[must_use]
pub const fn word_count(capacity: usize) -> usize {
    let n = capacity.div_ceil(WORD_BITS);
    if n == 0 { 1 } else { n }
}

/// Mask of the addressable bits in the last storage word for `capacity`.
#[inline]
pub(crate) const fn tail_mask(capacity: usize) -> u64 {
    let rem = capacity % WORD_BITS;
    if capacity == 0 {
        0
    } else if rem == 0 {
        !0
    } else {
        (1 << rem) - 1
    }
}

/// Mask with one bit per existing storage word, as used by the summaries.
#[inline]
pub(crate) const fn words_mask(words: usize) -> u64 {
    debug_assert!(words > 0 && words <= MAX_WORDS);
    !0 >> (WORD_BITS - words)
}

/// Allocates `words` zeroed words from `allocator`.
pub(crate) fn allocate_words<A>(allocator: &A, words: usize) -> Result<NonNull<u64>, AllocError>
where
    A: WordAllocator + ?Sized,
{
    debug_assert!(words > 0);
    let ptr = allocator.allocate(words)?;
    // SAFETY: A successful allocation is valid for writes of `words` words.
    unsafe { ptr.as_ptr().write_bytes(0, words) };
    Ok(ptr)
}

/// Returns `words` words to `allocator`.
///
/// # Safety
///
/// `ptr` must come from [`allocate_words`] on the same allocator with the
/// same `words`, and must not be used afterwards.
pub(crate) unsafe fn release_words<A>(allocator: &A, ptr: NonNull<u64>, words: usize)
where
    A: WordAllocator + ?Sized,
{
    // SAFETY: Forwarded from the caller.
    unsafe { allocator.deallocate(ptr, words) }
}
