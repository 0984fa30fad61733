//! Fixed-capacity bitsets over small integer words.
//!
//! Bit `id` lives in word `id / BITS` under mask `1 << (id % BITS)`. Ids past
//! the capacity read as unset and ignore writes.

use std::fmt;

/// Storage word for a [`Bitset`].
pub trait Word: Copy + Default + Eq + fmt::Debug {
    /// Bits per word.
    const BITS: usize;

    /// Mask with only bit `bit` set.
    fn mask(bit: usize) -> Self;

    /// `self & mask != 0`.
    fn contains(self, mask: Self) -> bool;

    /// `self | mask`.
    fn union(self, mask: Self) -> Self;

    /// Widens to `u32` for raw word transfer.
    fn to_u32(self) -> u32;

    /// Narrows from `u32`. `None` if the value does not fit.
    fn from_u32(value: u32) -> Option<Self>;
}

macro_rules! impl_word {
    ($($ty:ty),*) => {$(
        impl Word for $ty {
            const BITS: usize = <$ty>::BITS as usize;

            #[inline]
            fn mask(bit: usize) -> Self {
                1 << bit
            }

            #[inline]
            fn contains(self, mask: Self) -> bool {
                self & mask != 0
            }

            #[inline]
            fn union(self, mask: Self) -> Self {
                self | mask
            }

            #[inline]
            fn to_u32(self) -> u32 {
                u32::from(self)
            }

            #[inline]
            fn from_u32(value: u32) -> Option<Self> {
                <$ty>::try_from(value).ok()
            }
        }
    )*};
}

impl_word!(u8, u32);

/// `N` words of `W`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Bitset<W: Word, const N: usize> {
    words: [W; N],
}

impl<W: Word, const N: usize> Bitset<W, N> {
    /// Number of addressable bits.
    pub const CAPACITY: usize = N * W::BITS;

    /// All bits clear.
    #[must_use]
    pub fn new() -> Self {
        Self {
            words: [W::default(); N],
        }
    }

    #[inline]
    const fn locate(id: usize) -> (usize, usize) {
        (id / W::BITS, id % W::BITS)
    }

    /// True if bit `id` is set.
    #[inline]
    #[must_use]
    pub fn test(&self, id: usize) -> bool {
        let (word, bit) = Self::locate(id);
        self.words
            .get(word)
            .is_some_and(|w| w.contains(W::mask(bit)))
    }

    /// Sets bit `id`. Returns `true` if it was previously clear.
    #[inline]
    pub fn set(&mut self, id: usize) -> bool {
        let (word, bit) = Self::locate(id);
        let Some(w) = self.words.get_mut(word) else {
            return false;
        };
        let mask = W::mask(bit);
        if w.contains(mask) {
            return false;
        }
        *w = w.union(mask);
        true
    }

    /// Whole word at `index`.
    #[inline]
    #[must_use]
    pub fn get_raw(&self, index: usize) -> Option<W> {
        self.words.get(index).copied()
    }

    /// Overwrites the word at `index`. Returns `false` if out of range.
    #[inline]
    pub fn set_raw(&mut self, index: usize, value: W) -> bool {
        match self.words.get_mut(index) {
            Some(w) => {
                *w = value;
                true
            }
            None => false,
        }
    }

    /// All words, lowest first.
    #[must_use]
    pub const fn words(&self) -> &[W; N] {
        &self.words
    }

    /// Copies words in from the front. Extra input is ignored, missing words
    /// are cleared.
    pub fn load_words(&mut self, words: &[W]) {
        for (i, w) in self.words.iter_mut().enumerate() {
            *w = words.get(i).copied().unwrap_or_default();
        }
    }

    /// Clears every bit.
    pub fn clear_all(&mut self) {
        self.words = [W::default(); N];
    }

    /// Number of set bits.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.to_u32().count_ones() as usize).sum()
    }
}

impl<W: Word, const N: usize> Default for Bitset<W, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Word, const N: usize> fmt::Debug for Bitset<W, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitset")
            .field("capacity", &Self::CAPACITY)
            .field("set", &self.count())
            .finish()
    }
}
