//! Transfer implementations for Rust primitive types.
//!
//! # Encodings
//!
//! * Unsigned integers (`u16`, `u32`, `u64`) are written as varints, so small values take a
//!   single byte.
//! * Signed integers (`i16`, `i32`, `i64`) are ZigZag-mapped before the varint, so small
//!   negative values are as compact as small positive ones.
//! * `f32` is written as its 4-byte little-endian IEEE-754 representation and is lossless. Use
//!   [crate::Archive::transfer_float_fixed] for the lossy, compact encoding.
//! * `u8` is a single raw byte and `bool` a single `0`/`1` byte.
//! * `String` is a varint byte length followed by UTF-8 bytes.

use crate::{archive::at_least, varint, Archive, Error, Transfer};
use bytes::{Buf, BufMut};

macro_rules! impl_unsigned {
    ($type:ty) => {
        impl Transfer for $type {
            #[inline]
            fn transfer(&mut self, archive: &mut Archive) -> bool {
                archive.exchange(
                    self,
                    |value, buf, _| {
                        varint::write(*value, buf);
                        Ok(())
                    },
                    |buf, _| varint::read(buf),
                )
            }
        }
    };
}

impl_unsigned!(u16);
impl_unsigned!(u32);
impl_unsigned!(u64);

macro_rules! impl_signed {
    ($type:ty) => {
        impl Transfer for $type {
            #[inline]
            fn transfer(&mut self, archive: &mut Archive) -> bool {
                archive.exchange(
                    self,
                    |value, buf, _| {
                        varint::write_signed(*value, buf);
                        Ok(())
                    },
                    |buf, _| varint::read_signed(buf),
                )
            }
        }
    };
}

impl_signed!(i16);
impl_signed!(i32);
impl_signed!(i64);

impl Transfer for f32 {
    #[inline]
    fn transfer(&mut self, archive: &mut Archive) -> bool {
        archive.exchange(
            self,
            |value, buf, _| {
                buf.put_f32_le(*value);
                Ok(())
            },
            |buf, _| {
                at_least(buf, 4)?;
                Ok(buf.get_f32_le())
            },
        )
    }
}

impl Transfer for u8 {
    #[inline]
    fn transfer(&mut self, archive: &mut Archive) -> bool {
        archive.exchange(
            self,
            |value, buf, _| {
                buf.put_u8(*value);
                Ok(())
            },
            |buf, _| {
                at_least(buf, 1)?;
                Ok(buf.get_u8())
            },
        )
    }
}

impl Transfer for bool {
    #[inline]
    fn transfer(&mut self, archive: &mut Archive) -> bool {
        archive.exchange(
            self,
            |value, buf, _| {
                buf.put_u8(u8::from(*value));
                Ok(())
            },
            |buf, _| {
                at_least(buf, 1)?;
                match buf.get_u8() {
                    0 => Ok(false),
                    1 => Ok(true),
                    _ => Err(Error::InvalidBool),
                }
            },
        )
    }
}

impl Transfer for String {
    fn transfer(&mut self, archive: &mut Archive) -> bool {
        archive.exchange(
            self,
            |value, buf, limits| {
                let len = value.len();
                if len > limits.max_string_length {
                    return Err(Error::LengthExceeded(len, limits.max_string_length));
                }
                let prefix =
                    u32::try_from(len).map_err(|_| Error::LengthExceeded(len, u32::MAX as usize))?;
                varint::write(prefix, buf);
                buf.put_slice(value.as_bytes());
                Ok(())
            },
            |buf, limits| {
                let len = varint::read::<u32>(buf)? as usize;
                if len > limits.max_string_length {
                    return Err(Error::LengthExceeded(len, limits.max_string_length));
                }
                at_least(buf, len)?;
                let bytes = buf.copy_to_bytes(len);
                String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidUtf8)
            },
        )
    }
}
