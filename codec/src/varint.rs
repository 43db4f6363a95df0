//! Base-128 varints for archive integers and the archive header.
//!
//! A value is split into 7-bit groups, least significant group first. Every byte but the last
//! has its high bit set. A `u64` therefore takes between 1 and 10 bytes, and anything below 128
//! takes one.
//!
//! Signed values go through ZigZag first (`0, -1, 1, -2, ...` map to `0, 1, 2, 3, ...`), which
//! keeps small negative health deltas or coordinates as short as small positive ones.
//!
//! Only fixed-width integers are supported. An archive packed on one machine must unpack on any
//! other, so `usize` and `isize` have no encoding.

use crate::Error;
use bytes::{Buf, BufMut};
use std::ops::{BitOrAssign, Shl, ShrAssign};

const BITS_PER_BYTE: usize = 8;
const DATA_BITS_PER_BYTE: usize = 7;
const DATA_BITS_MASK: u8 = 0x7F;
const CONTINUATION_BIT_MASK: u8 = 0x80;

/// Unsigned integer widths with a varint encoding.
pub trait UInt:
    Copy
    + From<u8>
    + Sized
    + ShrAssign<usize>
    + Shl<usize, Output = Self>
    + BitOrAssign<Self>
    + PartialOrd
{
    /// Number of leading zero bits.
    fn leading_zeros(self) -> u32;

    /// Low byte, truncating the rest.
    fn as_u8(self) -> u8;
}

macro_rules! impl_uint {
    ($type:ty) => {
        impl UInt for $type {
            #[inline]
            fn leading_zeros(self) -> u32 {
                self.leading_zeros()
            }

            #[inline]
            fn as_u8(self) -> u8 {
                self as u8
            }
        }
    };
}
impl_uint!(u8);
impl_uint!(u16);
impl_uint!(u32);
impl_uint!(u64);

/// Signed integer widths, each paired with the unsigned width its ZigZag form fits in.
pub trait SInt: Copy {
    /// Unsigned partner of the same width.
    type Unsigned: UInt;

    /// Folds the sign into the lowest bit.
    fn as_zigzag(self) -> Self::Unsigned;

    /// Inverse of [SInt::as_zigzag].
    fn un_zigzag(value: Self::Unsigned) -> Self;
}

macro_rules! impl_sint {
    ($type:ty, $utype:ty) => {
        impl SInt for $type {
            type Unsigned = $utype;

            #[inline]
            fn as_zigzag(self) -> $utype {
                let shr = <$type>::BITS - 1;
                ((self << 1) ^ (self >> shr)) as $utype
            }

            #[inline]
            fn un_zigzag(value: $utype) -> Self {
                ((value >> 1) as $type) ^ (-((value & 1) as $type))
            }
        }
    };
}
impl_sint!(i16, u16);
impl_sint!(i32, u32);
impl_sint!(i64, u64);

/// Appends `value` to `buf` as a varint.
pub fn write<T: UInt>(mut value: T, buf: &mut impl BufMut) {
    let last_group = T::from(CONTINUATION_BIT_MASK);
    while value >= last_group {
        buf.put_u8(value.as_u8() | CONTINUATION_BIT_MASK);
        value >>= DATA_BITS_PER_BYTE;
    }
    // Below 128, so the low byte is the whole value.
    buf.put_u8(value.as_u8());
}

/// Reads a varint of width `T` from `buf`.
///
/// Fails with [Error::InvalidVarint] if the encoding sets bits beyond the width of `T`, and
/// with [Error::EndOfBuffer] if the buffer ends before the final byte.
pub fn read<T: UInt>(buf: &mut impl Buf) -> Result<T, Error> {
    let max_bits = std::mem::size_of::<T>() * BITS_PER_BYTE;
    let mut result: T = T::from(0);
    let mut shift = 0;

    loop {
        if !buf.has_remaining() {
            return Err(Error::EndOfBuffer);
        }
        let byte = buf.get_u8();

        // If this must be the last byte, reject any bits that do not fit in `T`. Because the
        // continuation bit is the most significant bit, this also rejects a continuation.
        let remaining_bits = max_bits - shift;
        if remaining_bits <= DATA_BITS_PER_BYTE {
            let relevant_bits = BITS_PER_BYTE - byte.leading_zeros() as usize;
            if relevant_bits > remaining_bits {
                return Err(Error::InvalidVarint);
            }
        }

        result |= T::from(byte & DATA_BITS_MASK) << shift;

        if byte & CONTINUATION_BIT_MASK == 0 {
            return Ok(result);
        }

        shift += DATA_BITS_PER_BYTE;
    }
}

/// Returns the encoded length of `value`, in bytes.
pub fn size<T: UInt>(value: T) -> usize {
    let total_bits = std::mem::size_of::<T>() * BITS_PER_BYTE;
    let leading_zeros = value.leading_zeros() as usize;
    let data_bits = total_bits - leading_zeros;
    usize::max(1, data_bits.div_ceil(DATA_BITS_PER_BYTE))
}

/// Appends `value` to `buf` as a ZigZag varint.
pub fn write_signed<S: SInt>(value: S, buf: &mut impl BufMut) {
    write(value.as_zigzag(), buf);
}

/// Reads a ZigZag varint of width `S` from `buf`.
pub fn read_signed<S: SInt>(buf: &mut impl Buf) -> Result<S, Error> {
    Ok(S::un_zigzag(read(buf)?))
}

/// Returns the encoded length of `value` as a ZigZag varint, in bytes.
pub fn size_signed<S: SInt>(value: S) -> usize {
    size(value.as_zigzag())
}
