//! Iteration over the active slots of a bitmap.

use core::iter::FusedIterator;

use crate::{RawSlotBitmap, SlotBitmap, allocator::WordAllocator};

/// An iterator over the indices of active slots.
///
/// Created by [`RawSlotBitmap::iter`] and [`SlotBitmap::iter`]. Each step is
/// one [`next_active_index`](RawSlotBitmap::next_active_index) (or
/// [`prev_active_index`](RawSlotBitmap::prev_active_index) from the back), so
/// runs of open slots are skipped a word at a time.
///
/// # Examples
///
/// ```
/// use slot_bitmap::SlotBitmap;
///
/// let mut slots = SlotBitmap::new(200).unwrap();
/// slots.set(5);
/// slots.set(70);
/// slots.set(199);
///
/// assert_eq!(slots.iter().collect::<Vec<_>>(), vec![5, 70, 199]);
/// assert_eq!(slots.iter().rev().collect::<Vec<_>>(), vec![199, 70, 5]);
/// ```
#[derive(Clone)]
pub struct ActiveSlots<'a> {
    raw: &'a RawSlotBitmap,
    // Both ends are active slots with front <= back, or both are None.
    front: Option<usize>,
    back: Option<usize>,
}

impl<'a> ActiveSlots<'a> {
    pub(crate) fn new(raw: &'a RawSlotBitmap) -> Self {
        if raw.is_empty() {
            return Self {
                raw,
                front: None,
                back: None,
            };
        }
        // SAFETY: The bitmap has an active slot.
        let (front, back) = unsafe { (raw.first_active_index(), raw.last_active_index()) };
        Self {
            raw,
            front: Some(front),
            back: Some(back),
        }
    }

    fn finish(&mut self) {
        self.front = None;
        self.back = None;
    }
}

impl Iterator for ActiveSlots<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.front?;
        if self.back == Some(cur) {
            self.finish();
        } else {
            // SAFETY: `cur` is an active slot, hence below the capacity.
            self.front = unsafe { self.raw.next_active_index(cur) };
        }
        Some(cur)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match (self.front, self.back) {
            (Some(front), Some(back)) => (1, Some(back - front + 1)),
            _ => (0, Some(0)),
        }
    }

    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }

    fn min(mut self) -> Option<Self::Item> {
        self.next()
    }

    fn max(mut self) -> Option<Self::Item> {
        self.next_back()
    }
}

impl DoubleEndedIterator for ActiveSlots<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let cur = self.back?;
        if self.front == Some(cur) {
            self.finish();
        } else {
            // SAFETY: `cur` is an active slot, hence below the capacity.
            self.back = unsafe { self.raw.prev_active_index(cur) };
        }
        Some(cur)
    }
}

impl FusedIterator for ActiveSlots<'_> {}

impl<'a, A: WordAllocator> IntoIterator for &'a SlotBitmap<A> {
    type IntoIter = ActiveSlots<'a>;
    type Item = usize;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a RawSlotBitmap {
    type IntoIter = ActiveSlots<'a>;
    type Item = usize;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<A: WordAllocator> Extend<usize> for SlotBitmap<A> {
    /// Marks every yielded slot active.
    ///
    /// # Panics
    ///
    /// Panics if a yielded index is out of bounds.
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for i in iter {
            self.set(i);
        }
    }
}
