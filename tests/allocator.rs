use std::{
    cell::{Cell, RefCell},
    error::Error,
    ptr::NonNull,
};

use slot_bitmap::{AllocError, Global, RawSlotBitmap, SlotBitmap, SlotBitmapError, WordAllocator};

/// Forwards to the global heap and records every call.
#[derive(Default)]
struct CountingAlloc {
    allocs: RefCell<Vec<usize>>,
    deallocs: RefCell<Vec<usize>>,
}

unsafe impl WordAllocator for CountingAlloc {
    fn allocate(&self, words: usize) -> Result<NonNull<u64>, AllocError> {
        self.allocs.borrow_mut().push(words);
        Global.allocate(words)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u64>, words: usize) {
        self.deallocs.borrow_mut().push(words);
        unsafe { Global.deallocate(ptr, words) }
    }
}

/// Fails every request.
struct FailingAlloc {
    calls: Cell<usize>,
}

unsafe impl WordAllocator for FailingAlloc {
    fn allocate(&self, words: usize) -> Result<NonNull<u64>, AllocError> {
        self.calls.set(self.calls.get() + 1);
        Err(AllocError { words })
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u64>, _words: usize) {
        unreachable!("nothing was allocated");
    }
}

#[test]
fn test_wrapper_allocates_and_frees_once() {
    let alloc = CountingAlloc::default();
    {
        let mut bitmap = SlotBitmap::new_in(130, &alloc).unwrap();
        bitmap.set(5);
        assert_eq!(*alloc.allocs.borrow(), vec![3]);
        assert!(alloc.deallocs.borrow().is_empty());
    }
    assert_eq!(*alloc.deallocs.borrow(), vec![3]);
}

#[test]
fn test_zero_capacity_allocates_one_word() {
    let alloc = CountingAlloc::default();
    drop(SlotBitmap::new_in(0, &alloc).unwrap());
    assert_eq!(*alloc.allocs.borrow(), vec![1]);
    assert_eq!(*alloc.deallocs.borrow(), vec![1]);
}

#[test]
fn test_raw_destroy_releases_same_word_count() {
    let alloc = CountingAlloc::default();
    let mut raw = RawSlotBitmap::construct(&alloc, 1000).unwrap();
    unsafe {
        raw.set(999);
        raw.destroy(&alloc, 1000);
    }
    assert_eq!(*alloc.allocs.borrow(), vec![16]);
    assert_eq!(*alloc.deallocs.borrow(), vec![16]);
}

#[test]
fn test_destroy_without_storage_is_a_no_op() {
    let alloc = CountingAlloc::default();
    unsafe { RawSlotBitmap::default().destroy(&alloc, 64) };
    assert!(alloc.deallocs.borrow().is_empty());
}

#[test]
fn test_into_raw_parts_transfers_ownership() {
    let alloc = CountingAlloc::default();
    let bitmap = SlotBitmap::new_in(64, &alloc).unwrap();
    let (raw, capacity, allocator) = bitmap.into_raw_parts();
    assert!(alloc.deallocs.borrow().is_empty());

    unsafe { raw.destroy(allocator, capacity) };
    assert_eq!(*alloc.deallocs.borrow(), vec![1]);
}

#[test]
fn test_allocation_failure_is_reported() {
    let alloc = FailingAlloc {
        calls: Cell::new(0),
    };

    let err = SlotBitmap::new_in(200, &alloc).unwrap_err();
    assert_eq!(err, SlotBitmapError::Alloc(AllocError { words: 4 }));
    assert_eq!(err.to_string(), "failed to allocate 4 bitmap words");
    assert!(err.source().is_some());
    assert_eq!(alloc.calls.get(), 1);

    let err = RawSlotBitmap::construct(&alloc, 10).unwrap_err();
    assert_eq!(err, SlotBitmapError::Alloc(AllocError { words: 1 }));
}

#[test]
fn test_capacity_overflow_does_not_allocate() {
    let alloc = FailingAlloc {
        calls: Cell::new(0),
    };
    let err = RawSlotBitmap::construct(&alloc, 5000).unwrap_err();
    assert!(matches!(err, SlotBitmapError::CapacityOverflow { capacity: 5000, .. }));
    assert!(err.source().is_none());
    assert_eq!(alloc.calls.get(), 0);
}

#[test]
fn test_try_clone_uses_cloned_allocator() {
    let alloc = CountingAlloc::default();
    let mut bitmap = SlotBitmap::new_in(100, &alloc).unwrap();
    bitmap.extend([1, 99]);

    let copy = bitmap.try_clone().unwrap();
    assert_eq!(copy, bitmap);
    assert_eq!(*alloc.allocs.borrow(), vec![2, 2]);

    drop(bitmap);
    drop(copy);
    assert_eq!(*alloc.deallocs.borrow(), vec![2, 2]);
}
