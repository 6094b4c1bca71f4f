//! A two-level slot-state bitmap for fixed-capacity bucket containers.
//!
//! A bucket-based container (a "hive") stores elements in fixed-size blocks
//! and needs to know, for every slot of a block, whether it holds a live
//! element (*active*) or is free for reuse (*open*). This crate provides that
//! index with:
//!
//! - O(1) [`set`](SlotBitmap::set), [`reset`](SlotBitmap::reset) and
//!   [`test`](SlotBitmap::test) of a single slot
//! - O(1) lookup of the [first open slot](SlotBitmap::first_open)
//! - Amortized O(1) [forward](SlotBitmap::next_active) and
//!   [backward](SlotBitmap::prev_active) steps between active slots, skipping
//!   runs of open slots a whole word at a time
//!
//! # Examples
//!
//! ```
//! use slot_bitmap::SlotBitmap;
//!
//! let mut slots = SlotBitmap::new(130).unwrap();
//!
//! // Place three elements
//! for _ in 0..3 {
//!     let i = slots.first_open().unwrap();
//!     slots.set(i);
//! }
//! assert_eq!(slots.iter().collect::<Vec<_>>(), vec![0, 1, 2]);
//!
//! // Erase the middle one and place another: the hole is reused
//! slots.reset(1);
//! assert_eq!(slots.first_open(), Some(1));
//!
//! // Traversal skips open slots
//! slots.set(129);
//! assert_eq!(slots.next_active(2), Some(129));
//! ```
//!
//! # Structure
//!
//! Slot states live in an array of 64-bit words. Two further words summarize
//! the array: bit `w` of the *active summary* is set iff word `w` has an
//! active slot, and bit `w` of the *open summary* is set iff word `w` has an
//! open slot. Every query first scans a summary, then one storage word, using
//! the [bit primitives](bits).
//!
//! Because each summary is a single word, a bitmap holds at most
//! [`MAX_SLOTS`] (64 × 64) slots.
//!
//! # Raw and owned forms
//!
//! - [`RawSlotBitmap`] is the unchecked core. Its slot operations are
//!   `unsafe fn`s without bounds checks, and it must be released explicitly
//!   with [`RawSlotBitmap::destroy`] using the construction capacity.
//! - [`SlotBitmap`] owns a raw bitmap with its capacity and allocator, checks
//!   indices, and frees storage on drop.
//!
//! Storage comes from a [`WordAllocator`]; [`Global`] uses the global heap.
//!
//! # Features
//!
//! - `std` (default): `std::error::Error` implementations
//! - `serde`: serialization of [`SlotBitmap`] as `{ capacity, words }`

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

// Module declarations
mod allocator;
mod bitmap;
pub mod bits;
mod iter;
mod macros;
mod raw;
mod storage;
mod traits;

#[cfg(feature = "serde")]
pub mod serde;

// Re-exports
pub use allocator::{AllocError, Global, WordAllocator};
pub use bitmap::SlotBitmap;
pub use iter::ActiveSlots;
pub use raw::RawSlotBitmap;
pub use storage::{MAX_SLOTS, MAX_WORDS, WORD_BITS, word_count};
pub use traits::SlotBitmapError;
