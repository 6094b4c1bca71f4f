/// Splits a slot index into `(word index, bit position within word)`.
macro_rules! bitpos {
    ($idx:expr) => {{
        let idx: usize = $idx;
        (
            idx >> $crate::storage::WORD_SHIFT,
            idx & ($crate::storage::WORD_BITS - 1),
        )
    }};
}

/// Single-bit mask for position `$pos` of a word.
macro_rules! bit {
    ($pos:expr) => {
        1u64 << $pos
    };
}

pub(crate) use bit;
pub(crate) use bitpos;
