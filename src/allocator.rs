//! The allocator seam through which word storage is obtained.

use alloc::alloc::{alloc, dealloc};
use core::{alloc::Layout, fmt, ptr::NonNull};

/// The allocator could not provide storage for the requested number of words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError {
    /// Number of 64-bit words that were requested
    pub words: usize,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to allocate {} bitmap words", self.words)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AllocError {}

/// A source of raw word storage for a [`RawSlotBitmap`](crate::RawSlotBitmap).
///
/// The bitmap zero-fills the words itself after allocation, so implementors
/// may hand out uninitialized memory.
///
/// # Safety
///
/// - A successful `allocate(words)` must return a pointer aligned for `u64`
///   and valid for reads and writes of `words` words until it is passed to
///   `deallocate`.
/// - Distinct live allocations must not overlap.
pub unsafe trait WordAllocator {
    /// Allocates storage for `words` words. `words` is never zero.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] if the request cannot be satisfied.
    fn allocate(&self, words: usize) -> Result<NonNull<u64>, AllocError>;

    /// Releases storage obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// - `ptr` must have been returned by `allocate` on this allocator and not
    ///   released since.
    /// - `words` must equal the count passed to that `allocate` call.
    unsafe fn deallocate(&self, ptr: NonNull<u64>, words: usize);
}

/// The global heap allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Global;

impl Global {
    fn layout(words: usize) -> Result<Layout, AllocError> {
        debug_assert!(words > 0);
        Layout::array::<u64>(words).map_err(|_| AllocError { words })
    }
}

// SAFETY: Backed by the global allocator with a `u64` array layout.
unsafe impl WordAllocator for Global {
    fn allocate(&self, words: usize) -> Result<NonNull<u64>, AllocError> {
        let layout = Self::layout(words)?;
        // SAFETY: `words > 0`, so the layout has a non-zero size.
        let ptr = unsafe { alloc(layout) };
        NonNull::new(ptr.cast::<u64>()).ok_or(AllocError { words })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u64>, words: usize) {
        let layout = Self::layout(words);
        debug_assert!(layout.is_ok(), "layout was valid at allocation");
        // SAFETY: `allocate` succeeded with the same `words`, which requires
        // `layout` to succeed.
        let layout = unsafe { layout.unwrap_unchecked() };

        // SAFETY: The caller guarantees `ptr` came from `allocate(words)`.
        unsafe { dealloc(ptr.as_ptr().cast(), layout) }
    }
}

// SAFETY: Forwards to `A`.
unsafe impl<A: WordAllocator + ?Sized> WordAllocator for &A {
    #[inline]
    fn allocate(&self, words: usize) -> Result<NonNull<u64>, AllocError> {
        (**self).allocate(words)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u64>, words: usize) {
        // SAFETY: Forwarded from the caller.
        unsafe { (**self).deallocate(ptr, words) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_roundtrip() {
        let ptr = Global.allocate(3).unwrap();
        unsafe {
            ptr.as_ptr().write_bytes(0xAB, 3);
            assert_eq!(*ptr.as_ptr().add(2), 0xABAB_ABAB_ABAB_ABAB);
            Global.deallocate(ptr, 3);
        }
    }

    #[test]
    fn test_global_releases_every_size() {
        for words in [1, 2, 63, 64, 1000] {
            let ptr = Global.allocate(words).unwrap();
            unsafe {
                ptr.as_ptr().add(words - 1).write(!0);
                Global.deallocate(ptr, words);
            }
        }
    }

    #[test]
    fn test_oversized_request_fails() {
        let err = Global.allocate(usize::MAX).unwrap_err();
        assert_eq!(err, AllocError { words: usize::MAX });
    }
}
