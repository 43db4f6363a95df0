//! Growable bit array.
//!
//! A [BitArray] stores bits in [u64] words and grows on demand. Unlike a fixed-length bit
//! vector, every index is addressable: reading an index beyond the current capacity returns
//! `false`, and writing one grows the storage to cover it. Storage never shrinks on its own,
//! only through [BitArray::resize].
//!
//! # Growth
//!
//! Writing beyond the current capacity grows the storage to the next power of two words that
//! covers the index, and to at least [MIN_WORDS] words. Repeatedly setting the next index is
//! therefore amortized.
//!
//! # Set Algebra
//!
//! Two arrays of different capacities can be combined with `&`, `|` and `^`. The shorter one is
//! treated as zero-extended and the result has the capacity of the longer one.

use std::{
    fmt::{self, Formatter, Write as _},
    ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Index},
};

/// Type alias for the underlying word type.
type Word = u64;

/// Number of bits in a [Word].
const BITS_PER_WORD: usize = Word::BITS as usize;

/// Number of bytes in a [Word].
const BYTES_PER_WORD: usize = std::mem::size_of::<Word>();

/// Smallest number of words allocated by automatic growth.
pub const MIN_WORDS: usize = 8;

/// Word with every bit set.
const FULL_WORD: Word = Word::MAX;

/// A growable array of bits.
#[derive(Clone, Default)]
pub struct BitArray {
    words: Vec<Word>,
}

impl BitArray {
    /// Creates an empty array with no storage.
    #[inline]
    pub const fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Creates an array able to hold `bits` bits without growing.
    pub fn with_capacity(bits: usize) -> Self {
        let mut array = Self::new();
        array.reserve(bits);
        array
    }

    /// Returns the number of addressable bits without growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.words.len() * BITS_PER_WORD
    }

    /// Returns the size of the storage in bytes.
    #[inline]
    pub fn bytes(&self) -> usize {
        self.words.len() * BYTES_PER_WORD
    }

    /// Returns the underlying words.
    #[inline]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Returns the word holding `index` masked down to that bit.
    ///
    /// The result is non-zero if and only if the bit is set.
    #[inline]
    pub fn test(&self, index: usize) -> Word {
        match self.words.get(Self::word_index(index)) {
            Some(word) => word & Self::bit_mask(index),
            None => 0,
        }
    }

    /// Returns the value of the bit at `index`, or `false` beyond the capacity.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        self.test(index) != 0
    }

    /// Sets the bit at `index` to 1, growing the storage if needed.
    #[inline]
    pub fn set(&mut self, index: usize) {
        self.expand(index);
        self.words[Self::word_index(index)] |= Self::bit_mask(index);
    }

    /// Sets the bit at `index` to 0, growing the storage if needed.
    #[inline]
    pub fn reset(&mut self, index: usize) {
        self.expand(index);
        self.words[Self::word_index(index)] &= !Self::bit_mask(index);
    }

    /// Sets the bit at `index` to `value`, growing the storage if needed.
    #[inline]
    pub fn set_to(&mut self, index: usize, value: bool) {
        if value {
            self.set(index);
        } else {
            self.reset(index);
        }
    }

    /// Returns true if any bit is set.
    pub fn any(&self) -> bool {
        self.words.iter().any(|&word| word != 0)
    }

    /// Returns the number of bits set to 1.
    pub fn count_ones(&self) -> usize {
        self.words
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum()
    }

    /// Sets every bit to 0 without releasing storage.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Returns the lowest unset index below the capacity, or `None` if every bit is set.
    ///
    /// Never grows the array. A caller allocating slots must grow it (for example with
    /// [BitArray::set] at [BitArray::capacity]) when this returns `None`.
    pub fn first_unset(&self) -> Option<usize> {
        self.words
            .iter()
            .position(|&word| word != FULL_WORD)
            .map(|i| i * BITS_PER_WORD + (!self.words[i]).trailing_zeros() as usize)
    }

    /// Returns an iterator over the indices of set bits, in increasing order.
    pub fn iter_ones(&self) -> Ones<'_> {
        Ones {
            words: &self.words,
            index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    /// Grows the storage to hold at least `bits` bits. Never shrinks.
    pub fn reserve(&mut self, bits: usize) {
        let words = Self::num_words(bits);
        if words > self.words.len() {
            self.words.resize(words, 0);
        }
    }

    /// Resizes the storage to hold exactly the words needed for `bits` bits.
    ///
    /// Growing preserves every bit. Shrinking discards every bit at or above `bits`. Resizing to
    /// zero releases the storage.
    pub fn resize(&mut self, bits: usize) {
        let words = Self::num_words(bits);
        if words == 0 {
            self.words = Vec::new();
            return;
        }

        if words < self.words.len() {
            self.words.truncate(words);
            self.words.shrink_to_fit();
        } else {
            self.words.resize(words, 0);
        }
        self.clear_trailing_bits(bits);
    }

    /// Intersects `self` with `other` in place.
    pub fn and(&mut self, other: &BitArray) {
        self.binary_op(other, |a, b| a & b);

        // Missing words of `other` are zero.
        if self.words.len() > other.words.len() {
            self.words[other.words.len()..].fill(0);
        }
    }

    /// Unites `self` with `other` in place.
    pub fn or(&mut self, other: &BitArray) {
        self.binary_op(other, |a, b| a | b);
    }

    /// Takes the symmetric difference of `self` and `other` in place.
    pub fn xor(&mut self, other: &BitArray) {
        self.binary_op(other, |a, b| a ^ b);
    }

    // ---------- Helper Functions ----------

    #[inline(always)]
    fn word_index(index: usize) -> usize {
        index / BITS_PER_WORD
    }

    #[inline(always)]
    fn bit_mask(index: usize) -> Word {
        1 << (index % BITS_PER_WORD)
    }

    #[inline(always)]
    fn num_words(bits: usize) -> usize {
        bits.div_ceil(BITS_PER_WORD)
    }

    /// Grows the storage so that `index` is addressable.
    #[inline]
    fn expand(&mut self, index: usize) {
        if index < self.capacity() {
            return;
        }
        let words = (Self::word_index(index) + 1)
            .next_power_of_two()
            .max(MIN_WORDS);
        self.words.resize(words, 0);
    }

    /// Grows `self` to the capacity of `other` and applies `op` word by word.
    #[inline]
    fn binary_op<F: Fn(Word, Word) -> Word>(&mut self, other: &BitArray, op: F) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a = op(*a, *b);
        }
    }

    /// Clears the bits of the last word at or above `bits`.
    #[inline]
    fn clear_trailing_bits(&mut self, bits: usize) {
        let offset = bits % BITS_PER_WORD;
        if offset == 0 {
            return;
        }
        if let Some(word) = self.words.last_mut() {
            *word &= FULL_WORD >> (BITS_PER_WORD - offset);
        }
    }
}

/// Iterator over the indices of set bits. Created by [BitArray::iter_ones].
pub struct Ones<'a> {
    words: &'a [Word],
    index: usize,
    current: Word,
}

impl Iterator for Ones<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(self.index * BITS_PER_WORD + bit);
            }
            if self.index + 1 >= self.words.len() {
                return None;
            }
            self.index += 1;
            self.current = self.words[self.index];
        }
    }
}

// ---------- Constructors ----------

impl<T: AsRef<[bool]>> From<T> for BitArray {
    fn from(bools: T) -> Self {
        let bools = bools.as_ref();
        let mut array = Self::new();
        array.resize(bools.len());
        for (index, _) in bools.iter().enumerate().filter(|&(_, &bit)| bit) {
            array.words[Self::word_index(index)] |= Self::bit_mask(index);
        }
        array
    }
}

// ---------- Comparison ----------

/// Arrays are equal if they have the same set bits, regardless of capacity.
impl PartialEq for BitArray {
    fn eq(&self, other: &Self) -> bool {
        let (short, long) = if self.words.len() <= other.words.len() {
            (&self.words, &other.words)
        } else {
            (&other.words, &self.words)
        };
        short[..] == long[..short.len()] && long[short.len()..].iter().all(|&word| word == 0)
    }
}

impl Eq for BitArray {}

// ---------- Debug ----------

impl fmt::Debug for BitArray {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // Large arrays only show the first and last bits
        const MAX_DISPLAY: usize = 128;
        const HALF_DISPLAY: usize = MAX_DISPLAY / 2;

        let write_bit = |formatter: &mut Formatter<'_>, index: usize| -> fmt::Result {
            formatter.write_char(if self.get(index) { '1' } else { '0' })
        };

        let capacity = self.capacity();
        f.write_str("BitArray[")?;
        if capacity <= MAX_DISPLAY {
            for i in 0..capacity {
                write_bit(f, i)?;
            }
        } else {
            for i in 0..HALF_DISPLAY {
                write_bit(f, i)?;
            }
            f.write_str("...")?;
            for i in (capacity - HALF_DISPLAY)..capacity {
                write_bit(f, i)?;
            }
        }
        f.write_str("]")
    }
}

// ---------- Operations ----------

impl Index<usize> for BitArray {
    type Output = bool;

    /// Reads a bit with the `[]` operator. Indices beyond the capacity read as `false`.
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        if self.get(index) {
            &true
        } else {
            &false
        }
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:ident) => {
        impl $trait for &BitArray {
            type Output = BitArray;

            fn $method(self, rhs: Self) -> Self::Output {
                let mut result = self.clone();
                result.$op(rhs);
                result
            }
        }

        impl $assign_trait<&BitArray> for BitArray {
            fn $assign_method(&mut self, rhs: &BitArray) {
                self.$op(rhs);
            }
        }
    };
}

impl_binary_op!(BitAnd, bitand, BitAndAssign, bitand_assign, and);
impl_binary_op!(BitOr, bitor, BitOrAssign, bitor_assign, or);
impl_binary_op!(BitXor, bitxor, BitXorAssign, bitxor_assign, xor);

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_new() {
        let array = BitArray::new();
        assert_eq!(array.capacity(), 0);
        assert_eq!(array.bytes(), 0);
        assert!(!array.any());
        assert!(!array.get(0));
        assert!(!array.get(usize::MAX));
        assert_eq!(array.first_unset(), None);
        assert_eq!(array, BitArray::default());
    }

    #[test]
    fn test_with_capacity() {
        let array = BitArray::with_capacity(65);
        assert_eq!(array.capacity(), 128);
        assert_eq!(array.bytes(), 16);
        assert_eq!(array.words(), &[0, 0]);
    }

    #[test]
    fn test_growth() {
        let mut array = BitArray::new();
        array.set(0);
        assert_eq!(array.capacity(), MIN_WORDS * BITS_PER_WORD);

        // 1000 / 64 + 1 = 16 words
        array.set(1000);
        assert_eq!(array.capacity(), 16 * BITS_PER_WORD);
        assert!(array.get(0));
        assert!(array.get(1000));
        assert!((1..1000).all(|i| !array.get(i)));

        // 1024 / 64 + 1 = 17 words, rounded to 32
        array.set(1024);
        assert_eq!(array.capacity(), 32 * BITS_PER_WORD);

        // Writes within capacity never grow.
        array.set(2047);
        assert_eq!(array.capacity(), 32 * BITS_PER_WORD);
    }

    #[test]
    fn test_reads_do_not_grow() {
        let mut array = BitArray::new();
        assert!(!array.get(5000));
        assert_eq!(array.test(5000), 0);
        assert!(!array[5000]);
        assert_eq!(array.capacity(), 0);

        // Resetting an unaddressable bit still grows the storage.
        array.reset(5000);
        assert!(array.capacity() > 5000);
        assert!(!array.any());
    }

    #[test]
    fn test_set_and_reset() {
        let mut array = BitArray::new();
        array.set_to(3, true);
        array.set(64);
        assert!(array[3]);
        assert!(array[64]);
        assert_eq!(array.count_ones(), 2);

        array.set_to(3, false);
        array.reset(64);
        assert!(!array[3]);
        assert!(!array[64]);
        assert!(!array.any());
    }

    #[test]
    fn test_test_returns_masked_word() {
        let mut array = BitArray::new();
        array.set(1);
        array.set(2);
        array.set(70);
        assert_eq!(array.test(1), 1 << 1);
        assert_eq!(array.test(2), 1 << 2);
        assert_eq!(array.test(3), 0);
        assert_eq!(array.test(70), 1 << 6);
    }

    #[test]
    fn test_clear() {
        let mut array = BitArray::new();
        array.set(10);
        array.set(300);
        let capacity = array.capacity();
        array.clear();
        assert!(!array.any());
        assert_eq!(array.capacity(), capacity);
    }

    #[test]
    fn test_first_unset() {
        let mut array = BitArray::new();
        array.resize(64);
        array.set(0);
        array.set(1);
        array.set(2);
        assert_eq!(array.capacity(), 64);
        assert_eq!(array.first_unset(), Some(3));

        for i in 0..64 {
            array.set(i);
        }
        assert_eq!(array.capacity(), 64);
        assert_eq!(array.first_unset(), None);

        // A hole in a later word.
        array.resize(192);
        for i in 64..192 {
            array.set(i);
        }
        array.reset(130);
        assert_eq!(array.first_unset(), Some(130));
    }

    #[test]
    fn test_first_unset_slot_allocation() {
        let mut array = BitArray::with_capacity(BITS_PER_WORD);
        let mut slots = Vec::new();
        for _ in 0..200 {
            let slot = array.first_unset().unwrap_or_else(|| array.capacity());
            array.set(slot);
            slots.push(slot);
        }
        assert_eq!(slots, (0..200).collect::<Vec<_>>());

        array.reset(42);
        assert_eq!(array.first_unset(), Some(42));
    }

    #[test]
    fn test_resize() {
        let mut array = BitArray::new();
        array.set(5);
        array.set(70);
        array.set(400);

        // Growing preserves bits.
        array.resize(1024);
        assert_eq!(array.capacity(), 1024);
        assert!(array.get(5) && array.get(70) && array.get(400));

        // Shrinking discards bits at or above the new length.
        array.resize(70);
        assert_eq!(array.capacity(), 128);
        assert!(array.get(5));
        assert!(!array.get(70));
        assert!(!array.get(400));
        assert_eq!(array.count_ones(), 1);

        // Resizing to zero frees the storage.
        array.resize(0);
        assert_eq!(array.capacity(), 0);
        assert_eq!(array.bytes(), 0);
        assert!(array.words().is_empty());
        assert_eq!(array.words.capacity(), 0);
    }

    #[test]
    fn test_reserve_never_shrinks() {
        let mut array = BitArray::with_capacity(512);
        array.reserve(64);
        assert_eq!(array.capacity(), 512);
        array.reserve(513);
        assert_eq!(array.capacity(), 576);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut original = BitArray::new();
        original.set(7);
        let mut copy = original.clone();
        copy.set(8);
        original.reset(7);
        assert!(copy.get(7));
        assert!(copy.get(8));
        assert!(!original.get(7));
        assert!(!original.get(8));
    }

    fn array_of(indices: &[usize]) -> BitArray {
        let mut array = BitArray::new();
        for &index in indices {
            array.set(index);
        }
        array
    }

    #[test]
    fn test_and_different_sizes() {
        let small = array_of(&[1, 2, 3]);
        let large = array_of(&[2, 3, 4, 2000]);

        for result in [&small & &large, &large & &small] {
            assert_eq!(result.capacity(), large.capacity());
            assert_eq!(result.iter_ones().collect::<Vec<_>>(), vec![2, 3]);
        }
    }

    #[test]
    fn test_or_different_sizes() {
        let small = array_of(&[1, 2]);
        let large = array_of(&[2, 2000]);

        for result in [&small | &large, &large | &small] {
            assert_eq!(result.capacity(), large.capacity());
            assert_eq!(result.iter_ones().collect::<Vec<_>>(), vec![1, 2, 2000]);
        }
    }

    #[test]
    fn test_xor_different_sizes() {
        let small = array_of(&[1, 2]);
        let large = array_of(&[2, 2000]);

        for result in [&small ^ &large, &large ^ &small] {
            assert_eq!(result.capacity(), large.capacity());
            assert_eq!(result.iter_ones().collect::<Vec<_>>(), vec![1, 2000]);
        }
    }

    #[test]
    fn test_assign_ops() {
        let mut array = array_of(&[1, 2, 3]);
        array |= &array_of(&[700]);
        array &= &array_of(&[2, 3, 700]);
        array ^= &array_of(&[3]);
        assert_eq!(array.iter_ones().collect::<Vec<_>>(), vec![2, 700]);

        // Operands are not modified by the non-assigning forms.
        let left = array_of(&[1]);
        let right = array_of(&[1]);
        let _ = &left ^ &right;
        assert!(left.get(1));
    }

    #[test]
    fn test_equality_ignores_capacity() {
        let mut small = array_of(&[3]);
        let mut large = BitArray::with_capacity(4096);
        large.set(3);
        assert_ne!(small.capacity(), large.capacity());
        assert_eq!(small, large);
        assert_eq!(large, small);

        large.set(4000);
        assert_ne!(small, large);
        small.set(4000);
        assert_eq!(small, large);
    }

    #[test]
    fn test_iter_ones() {
        assert_eq!(BitArray::new().iter_ones().next(), None);

        let indices = [0, 63, 64, 127, 500, 511];
        let array = array_of(&indices);
        assert_eq!(array.iter_ones().collect::<Vec<_>>(), indices);
        assert_eq!(array.count_ones(), indices.len());
    }

    #[test]
    fn test_from_bools() {
        let array = BitArray::from([true, false, true, true]);
        assert_eq!(array.capacity(), 64);
        assert_eq!(array.iter_ones().collect::<Vec<_>>(), vec![0, 2, 3]);

        let array = BitArray::from(vec![false; 100]);
        assert_eq!(array.capacity(), 128);
        assert!(!array.any());

        assert_eq!(BitArray::from(Vec::<bool>::new()).capacity(), 0);
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", BitArray::new()), "BitArray[]");

        let array = BitArray::from([true, false, true]);
        let expected = format!("BitArray[101{}]", "0".repeat(61));
        assert_eq!(format!("{array:?}"), expected);

        let mut array = BitArray::new();
        array.set(0);
        array.set(511);
        let expected = format!("BitArray[1{}...{}1]", "0".repeat(63), "0".repeat(63));
        assert_eq!(format!("{array:?}"), expected);
    }

    #[test]
    fn test_random_against_model() {
        const MAX_INDEX: usize = 3000;
        let mut rng = StdRng::seed_from_u64(7);
        let mut array = BitArray::new();
        let mut model = vec![false; MAX_INDEX];

        for _ in 0..10_000 {
            let index = rng.gen_range(0..MAX_INDEX);
            match rng.gen_range(0..4) {
                0 | 1 => {
                    array.set(index);
                    model[index] = true;
                }
                2 => {
                    array.reset(index);
                    model[index] = false;
                }
                _ => assert_eq!(array.get(index), model[index]),
            }
        }

        for (index, &bit) in model.iter().enumerate() {
            assert_eq!(array.get(index), bit, "index={index}");
        }
        assert_eq!(array.count_ones(), model.iter().filter(|&&bit| bit).count());
        assert_eq!(
            array.first_unset(),
            model.iter().position(|&bit| !bit),
            "first unset"
        );
        assert_eq!(array, BitArray::from(&model));
    }
}
