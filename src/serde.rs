//! Serde implementations for `SlotBitmap`.
//!
//! A bitmap serializes as a struct with its `capacity` and its storage
//! `words`. Deserialization checks that the words match the capacity before
//! allocating, then rebuilds both summaries.

use alloc::vec::Vec;

use ::serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Unexpected},
    ser::SerializeStruct,
};

use crate::{
    SlotBitmap,
    allocator::WordAllocator,
    storage::{MAX_SLOTS, tail_mask, word_count},
};

impl<A: WordAllocator> Serialize for SlotBitmap<A> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("SlotBitmap", 2)?;
        state.serialize_field("capacity", &self.capacity())?;
        state.serialize_field("words", self.as_slice())?;
        state.end()
    }
}

#[derive(Deserialize)]
#[serde(rename = "SlotBitmap")]
struct Repr {
    capacity: usize,
    words: Vec<u64>,
}

impl<'de, A: WordAllocator + Default> Deserialize<'de> for SlotBitmap<A> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Repr { capacity, words } = Repr::deserialize(deserializer)?;

        if capacity > MAX_SLOTS {
            return Err(de::Error::invalid_value(
                Unexpected::Unsigned(capacity as u64),
                &"a capacity of at most MAX_SLOTS",
            ));
        }
        let n = word_count(capacity);
        if words.len() != n {
            return Err(de::Error::invalid_length(
                words.len(),
                &"one word per 64 slots",
            ));
        }
        if let Some(&hi) = words.last()
            && hi & !tail_mask(capacity) != 0
        {
            return Err(de::Error::custom("slot bits set beyond the capacity"));
        }

        let mut bitmap = Self::new_in(capacity, A::default()).map_err(de::Error::custom)?;
        for (wi, word) in words.into_iter().enumerate() {
            // SAFETY: `wi < n` and the last word was checked against the tail.
            unsafe { bitmap.raw.put_word(wi, word) };
        }
        Ok(bitmap)
    }
}
