//! Compact storage for non-decreasing sequences of unsigned integers.
//!
//! Values are stored as deltas from their predecessor, each delta written as a
//! variable-length code: 7 payload bits per byte, least significant group
//! first, with the high bit set on every byte that has a successor. Small gaps
//! therefore cost a single byte regardless of the magnitude of the values.

use crate::core::constants::{
    VARINT_CONTINUATION_BIT, VARINT_MAX_BYTES, VARINT_PAYLOAD_BITS, VARINT_PAYLOAD_MASK,
};
use crate::core::error::Result;
use crate::{ensure, invalid_argument};

/// A non-decreasing list of non-negative integers, stored in a compressed
/// delta encoding and read back through a forward-only [`Iter`].
///
/// The list is move-only: it owns its buffer and is never implicitly copied.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CompressedIntegerList {
    mem: Vec<u8>,
    last: u64,
    size: u64,
}

impl CompressedIntegerList {
    /// Constructs an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from a non-decreasing sequence.
    pub fn from_sorted<I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut list = Self::new();
        for value in values {
            list.push_back(value)?;
        }
        Ok(list)
    }

    /// Number of entries in the list.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// True if nothing has been pushed since construction or the last reset.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of bytes used by the encoded entries.
    pub fn byte_len(&self) -> usize {
        self.mem.len()
    }

    /// Reserves byte capacity for roughly `size` more entries. Has no
    /// observable effect on the contents.
    pub fn reserve(&mut self, size: usize) {
        self.mem.reserve(size);
    }

    /// The largest integer in the list, which is always the last one pushed.
    pub fn max(&self) -> Result<u64> {
        ensure!(
            self.size > 0,
            invalid_argument!("max() called on an empty compressed integer list")
        );
        Ok(self.last)
    }

    /// Appends an integer to the end of the list.
    ///
    /// Fails with `InvalidArgument`, leaving the list untouched, if `value` is
    /// smaller than the current maximum.
    pub fn push_back(&mut self, value: u64) -> Result<()> {
        ensure!(
            self.size == 0 || value >= self.last,
            invalid_argument!(
                "compressed integer list requires non-decreasing values: {} pushed after {}",
                value,
                self.last
            )
        );

        encode_delta(value - self.last, &mut self.mem);
        self.last = value;
        self.size += 1;
        Ok(())
    }

    /// Deletes all of the list content and sets its size to zero.
    pub fn reset(&mut self) {
        self.mem.clear();
        self.last = 0;
        self.size = 0;
    }

    /// Returns an iterator positioned on the first entry, if any.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(&self.mem)
    }
}

impl<'a> IntoIterator for &'a CompressedIntegerList {
    type Item = u64;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A read-only forward iterator over a [`CompressedIntegerList`].
///
/// The iterator is a view: cloning it is cheap, and each clone advances
/// independently. It cannot be rewound; obtain a fresh one from
/// [`CompressedIntegerList::iter`] instead.
///
/// Besides the explicit `is_valid`/`get`/`advance` protocol it implements
/// [`Iterator`], yielding the current value and then advancing.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    mem: &'a [u8],
    pos: usize,
    value: u64,
    increment: usize,
}

impl<'a> Iter<'a> {
    fn new(mem: &'a [u8]) -> Self {
        let mut iter = Iter {
            mem,
            pos: 0,
            value: 0,
            increment: 0,
        };
        iter.decode_current();
        iter
    }

    /// True while the iterator points at an entry.
    pub fn is_valid(&self) -> bool {
        self.pos < self.mem.len()
    }

    /// Value of the current entry.
    pub fn get(&self) -> Result<u64> {
        ensure!(
            self.is_valid(),
            invalid_argument!("get() called on an exhausted compressed integer list iterator")
        );
        Ok(self.value)
    }

    /// Proceeds to the next entry.
    pub fn advance(&mut self) -> Result<()> {
        ensure!(
            self.is_valid(),
            invalid_argument!("advance() called on an exhausted compressed integer list iterator")
        );
        self.pos += self.increment;
        self.decode_current();
        Ok(())
    }

    fn decode_current(&mut self) {
        if !self.is_valid() {
            self.increment = 0;
            return;
        }
        let (delta, len) = decode_delta(&self.mem[self.pos..]);
        self.value += delta;
        self.increment = len;
    }
}

impl Iterator for Iter<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let value = self.get().ok()?;
        self.advance().ok()?;
        Some(value)
    }
}

fn encode_delta(mut delta: u64, out: &mut Vec<u8>) {
    while delta > VARINT_PAYLOAD_MASK as u64 {
        out.push((delta as u8 & VARINT_PAYLOAD_MASK) | VARINT_CONTINUATION_BIT);
        delta >>= VARINT_PAYLOAD_BITS;
    }
    out.push(delta as u8);
}

/// Decodes one code from the front of `bytes`, returning the delta and the
/// number of bytes it occupied. `bytes` always starts at a code boundary
/// written by `encode_delta`.
fn decode_delta(bytes: &[u8]) -> (u64, usize) {
    let mut delta = 0u64;
    let mut shift = 0u32;
    for (i, &byte) in bytes.iter().take(VARINT_MAX_BYTES).enumerate() {
        delta |= ((byte & VARINT_PAYLOAD_MASK) as u64) << shift;
        if byte & VARINT_CONTINUATION_BIT == 0 {
            return (delta, i + 1);
        }
        shift += VARINT_PAYLOAD_BITS;
    }
    (delta, bytes.len().min(VARINT_MAX_BYTES))
}
