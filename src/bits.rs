//! Bit primitives over a single 64-bit word.
//!
//! Every query here is a constant-time combination of a count-leading-zeros,
//! count-trailing-zeros or count-trailing-ones instruction with a shift or a
//! mask. The directional queries never fail: when no matching bit exists they
//! return a position `>= WORD_BITS`, which callers use as the signal to move
//! from the bit level up to the word level.
//!
//! # Examples
//!
//! ```
//! use slot_bitmap::{WORD_BITS, bits};
//!
//! let word = 0b1001_0100_u64;
//! assert_eq!(bits::first_one_bit(word), 2);
//! assert_eq!(bits::last_one_bit(word), 7);
//! assert_eq!(bits::next_one_bit(word, 2), 4);
//! assert_eq!(bits::prev_one_bit(word, 4), 2);
//! assert!(bits::next_one_bit(word, 7) >= WORD_BITS);
//! ```

use crate::storage::WORD_BITS;

/// Returns `true` if `pos` names an actual bit rather than the "not found"
/// sentinel produced by the queries in this module.
#[inline(always)]
#[must_use]
pub const fn is_found(pos: usize) -> bool {
    pos < WORD_BITS
}

/// Position of the lowest set bit, or `WORD_BITS` if `word` is zero.
#[inline(always)]
#[must_use]
pub const fn first_one_bit(word: u64) -> usize {
    word.trailing_zeros() as usize
}

/// Position of the highest set bit.
///
/// For a zero word the subtraction wraps, yielding a value `>= WORD_BITS`.
#[inline(always)]
#[must_use]
pub const fn last_one_bit(word: u64) -> usize {
    (WORD_BITS - 1).wrapping_sub(word.leading_zeros() as usize)
}

/// Position of the lowest unset bit, or `WORD_BITS` if every bit is set.
#[inline(always)]
#[must_use]
pub const fn first_zero_bit(word: u64) -> usize {
    word.trailing_ones() as usize
}

/// Position of the lowest set bit strictly after `after`.
///
/// `after` must be below `WORD_BITS`.
#[inline(always)]
#[must_use]
pub const fn next_one_bit(word: u64, after: usize) -> usize {
    debug_assert!(after < WORD_BITS);
    // clears [0, after]; for after == 63 the mask is empty
    first_one_bit(word & (!1u64 << after))
}

/// Position of the highest set bit strictly before `before`.
///
/// `before` must be below `WORD_BITS`.
#[inline(always)]
#[must_use]
pub const fn prev_one_bit(word: u64, before: usize) -> usize {
    debug_assert!(before < WORD_BITS);
    // clears [before, WORD_BITS)
    last_one_bit(word & ((1u64 << before) - 1))
}
