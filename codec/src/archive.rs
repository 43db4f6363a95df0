//! Symmetric binary archive.
//!
//! An [Archive] is created for a single pass in one direction:
//! - [Archive::packing] builds a new buffer, starting with the replication policy header.
//! - [Archive::unpacking] wraps a received or stored buffer and reads the header back.
//!
//! # Format
//!
//! ```text
//! +----------------------------+---------+---------+-----+---------+
//! | Replication policy (varint)| Field 1 | Field 2 | ... | Field N |
//! +----------------------------+---------+---------+-----+---------+
//! ```
//!
//! Fields carry no tags or per-field length prefixes. A buffer can only be unpacked by the same
//! sequence of transfers (same order, same types, same precisions) that packed it.
//!
//! # Failure
//!
//! Every transfer returns a `bool`. The first failure is latched: [Archive::error] reports it and
//! every later transfer on the same archive returns `false` without touching its argument. Callers
//! AND the results of their transfers together and discard the object if the result is `false`.

use crate::{
    config::Limits,
    fixed,
    pool::{BufferPool, PooledBuffer},
    types::math::{Orientation, Vector3},
    varint, Error, ReplicationPolicy, Transfer,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;
use tracing::{debug, warn};

/// Direction of an [Archive]. Fixed for the archive's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Building a new buffer.
    Packing,
    /// Reading an existing buffer.
    Unpacking,
}

/// Reason an [Archive] exists. Serialize implementations use it to decide which optional fields
/// to include.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SerializeType {
    /// Sent over the network to clients.
    Replication,
    /// Written to or read from the database.
    Persistent,
    /// Moved between servers along with an account.
    Migration,
    /// Short-lived, never persisted.
    Transient,
}

/// Types that can be written as their full fixed-width little-endian representation.
pub trait Unencoded: Copy {
    /// Width of the encoding, in bytes.
    const SIZE: usize;

    /// Writes the value to `buf`.
    fn put(self, buf: &mut impl BufMut);

    /// Reads the value from `buf`. The caller must ensure `SIZE` bytes are remaining.
    fn get(buf: &mut impl Buf) -> Self;
}

macro_rules! impl_unencoded {
    ($type:ty, $get:ident, $put:ident) => {
        impl Unencoded for $type {
            const SIZE: usize = std::mem::size_of::<$type>();

            #[inline]
            fn put(self, buf: &mut impl BufMut) {
                buf.$put(self);
            }

            #[inline]
            fn get(buf: &mut impl Buf) -> Self {
                buf.$get()
            }
        }
    };
}

impl_unencoded!(u16, get_u16_le, put_u16_le);
impl_unencoded!(u32, get_u32_le, put_u32_le);
impl_unencoded!(u64, get_u64_le, put_u64_le);
impl_unencoded!(i32, get_i32_le, put_i32_le);
impl_unencoded!(i64, get_i64_le, put_i64_le);

/// Returns [Error::EndOfBuffer] if fewer than `len` bytes remain in `buf`.
#[inline]
pub(crate) fn at_least(buf: &mut impl Buf, len: usize) -> Result<(), Error> {
    if buf.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    Ok(())
}

enum Stream {
    Packing(PooledBuffer),
    Unpacking {
        /// The full buffer, header included.
        data: Bytes,
        /// The unread remainder of `data`.
        cursor: Bytes,
    },
}

/// A single-direction pass over a byte buffer.
pub struct Archive {
    serialize_type: SerializeType,
    replication_policy: ReplicationPolicy,
    limits: Limits,
    stream: Stream,
    error: Option<Error>,
}

impl Archive {
    /// Creates a packing archive over a new, unpooled buffer with default [Limits] and writes
    /// the header.
    pub fn packing(
        serialize_type: SerializeType,
        replication_policy: impl Into<ReplicationPolicy>,
    ) -> Self {
        Self::packing_with_limits(serialize_type, replication_policy, Limits::default())
    }

    /// Creates a packing archive that refuses length-prefixed values beyond `limits`.
    ///
    /// An archive packed under some limits can always be unpacked under the same limits.
    pub fn packing_with_limits(
        serialize_type: SerializeType,
        replication_policy: impl Into<ReplicationPolicy>,
        limits: Limits,
    ) -> Self {
        Self::packing_into(
            serialize_type,
            replication_policy.into(),
            limits,
            PooledBuffer::detached(),
        )
    }

    /// Creates a packing archive over a buffer checked out of `pool` and writes the header.
    ///
    /// The buffer returns to the pool when the archive is dropped, unless it is taken with
    /// [Archive::into_bytes].
    pub fn packing_pooled(
        serialize_type: SerializeType,
        replication_policy: impl Into<ReplicationPolicy>,
        pool: &BufferPool,
    ) -> Self {
        Self::packing_into(
            serialize_type,
            replication_policy.into(),
            Limits::default(),
            pool.checkout(),
        )
    }

    fn packing_into(
        serialize_type: SerializeType,
        replication_policy: ReplicationPolicy,
        limits: Limits,
        mut buffer: PooledBuffer,
    ) -> Self {
        varint::write(replication_policy.bits(), &mut *buffer);
        Self {
            serialize_type,
            replication_policy,
            limits,
            stream: Stream::Packing(buffer),
            error: None,
        }
    }

    /// Creates an unpacking archive over `buf` with default [Limits] and reads the header.
    ///
    /// Fails with [Error::MalformedHeader] if `buf` does not start with a valid replication
    /// policy.
    pub fn unpacking(serialize_type: SerializeType, buf: impl Into<Bytes>) -> Result<Self, Error> {
        Self::unpacking_with_limits(serialize_type, buf, Limits::default())
    }

    /// Creates an unpacking archive over `buf` that enforces `limits` on length-prefixed values.
    pub fn unpacking_with_limits(
        serialize_type: SerializeType,
        buf: impl Into<Bytes>,
        limits: Limits,
    ) -> Result<Self, Error> {
        let data = buf.into();
        let mut cursor = data.clone();
        let replication_policy = match varint::read::<u64>(&mut cursor) {
            Ok(bits) => ReplicationPolicy::from_bits(bits),
            Err(err) => {
                warn!(?err, len = data.len(), ?serialize_type, "malformed archive header");
                return Err(Error::MalformedHeader);
            }
        };

        Ok(Self {
            serialize_type,
            replication_policy,
            limits,
            stream: Stream::Unpacking { data, cursor },
            error: None,
        })
    }

    /// Returns the direction of the archive.
    #[inline]
    pub fn mode(&self) -> Mode {
        match self.stream {
            Stream::Packing(_) => Mode::Packing,
            Stream::Unpacking { .. } => Mode::Unpacking,
        }
    }

    /// Returns true if the archive is building a buffer.
    #[inline]
    pub fn is_packing(&self) -> bool {
        self.mode() == Mode::Packing
    }

    /// Returns true if the archive is reading a buffer.
    #[inline]
    pub fn is_unpacking(&self) -> bool {
        self.mode() == Mode::Unpacking
    }

    /// Returns the reason the archive exists.
    #[inline]
    pub fn serialize_type(&self) -> SerializeType {
        self.serialize_type
    }

    #[inline]
    pub fn is_replication(&self) -> bool {
        self.serialize_type == SerializeType::Replication
    }

    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.serialize_type == SerializeType::Persistent
    }

    #[inline]
    pub fn is_migration(&self) -> bool {
        self.serialize_type == SerializeType::Migration
    }

    #[inline]
    pub fn is_transient(&self) -> bool {
        self.serialize_type == SerializeType::Transient
    }

    /// Returns the replication policy written to (or read from) the header.
    #[inline]
    pub fn replication_policy(&self) -> ReplicationPolicy {
        self.replication_policy
    }

    /// Returns the limits enforced on length-prefixed values.
    #[inline]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Returns the current offset into the buffer, header included.
    pub fn position(&self) -> usize {
        match &self.stream {
            Stream::Packing(buffer) => buffer.len(),
            Stream::Unpacking { data, cursor } => data.len() - cursor.remaining(),
        }
    }

    /// Returns the number of unread bytes. Always zero for a packing archive.
    pub fn remaining(&self) -> usize {
        match &self.stream {
            Stream::Packing(_) => 0,
            Stream::Unpacking { cursor, .. } => cursor.remaining(),
        }
    }

    /// Returns true if every transfer so far has succeeded.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Returns the first error encountered, if any.
    #[inline]
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Returns the first error encountered as a `Result`.
    pub fn status(&self) -> Result<(), Error> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Returns the buffer contents, header included.
    ///
    /// For a packing archive this is only complete once every transfer has been made.
    pub fn access_buffer(&self) -> &[u8] {
        match &self.stream {
            Stream::Packing(buffer) => &buffer[..],
            Stream::Unpacking { data, .. } => &data[..],
        }
    }

    /// Consumes the archive and returns its buffer. A pooled buffer is not returned to its pool.
    pub fn into_bytes(self) -> Bytes {
        match self.stream {
            Stream::Packing(buffer) => buffer.detach().freeze(),
            Stream::Unpacking { data, .. } => data,
        }
    }

    /// Packs or unpacks `value`.
    #[inline]
    pub fn transfer<T: Transfer + ?Sized>(&mut self, value: &mut T) -> bool {
        value.transfer(self)
    }

    /// Packs or unpacks `value` as a fixed-precision number with `precision` fractional bits.
    ///
    /// Lossy: values that are not multiples of `2^-precision` come back rounded to the nearest
    /// multiple.
    pub fn transfer_float_fixed(&mut self, value: &mut f32, precision: u8) -> bool {
        self.exchange(
            value,
            |value, buf, _| {
                varint::write_signed(fixed::to_fixed(*value, precision), buf);
                Ok(())
            },
            |buf, _| Ok(fixed::from_fixed(varint::read_signed(buf)?, precision)),
        )
    }

    /// Packs or unpacks each component of `vector` with [Archive::transfer_float_fixed].
    pub fn transfer_vector_fixed(&mut self, vector: &mut Vector3, precision: u8) -> bool {
        let mut success = true;
        success &= self.transfer_float_fixed(&mut vector.x, precision);
        success &= self.transfer_float_fixed(&mut vector.y, precision);
        success &= self.transfer_float_fixed(&mut vector.z, precision);
        success
    }

    /// Packs or unpacks `orientation` with [Archive::transfer_float_fixed].
    ///
    /// With `yaw_only`, only the yaw is transferred and an unpacked orientation has its pitch and
    /// roll set to zero.
    pub fn transfer_orientation_fixed(
        &mut self,
        orientation: &mut Orientation,
        yaw_only: bool,
        precision: u8,
    ) -> bool {
        if yaw_only {
            let success = self.transfer_float_fixed(&mut orientation.yaw, precision);
            if success && self.is_unpacking() {
                orientation.pitch = 0.0;
                orientation.roll = 0.0;
            }
            return success;
        }

        let mut success = true;
        success &= self.transfer_float_fixed(&mut orientation.yaw, precision);
        success &= self.transfer_float_fixed(&mut orientation.pitch, precision);
        success &= self.transfer_float_fixed(&mut orientation.roll, precision);
        success
    }

    /// Packs or unpacks a list as a varint element count followed by each element.
    ///
    /// The count must not exceed [Limits::max_list_length] in either direction. When unpacking,
    /// `list` is replaced only if every element decodes.
    pub fn transfer_list<T: Transfer + Default>(&mut self, list: &mut Vec<T>) -> bool {
        if self.error.is_some() {
            return false;
        }
        let max = self.limits.max_list_length;
        if self.is_packing() && list.len() > max {
            return self.fail(Error::LengthExceeded(list.len(), max));
        }

        let mut count = match u32::try_from(list.len()) {
            Ok(count) => count,
            Err(_) => return self.fail(Error::LengthExceeded(list.len(), u32::MAX as usize)),
        };
        if !self.transfer(&mut count) {
            return false;
        }
        if self.is_packing() {
            return list.iter_mut().all(|item| self.transfer(item));
        }

        let count = count as usize;
        if count > max {
            return self.fail(Error::LengthExceeded(count, max));
        }
        let mut decoded: Vec<T> = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            let mut item = T::default();
            if !self.transfer(&mut item) {
                return false;
            }
            decoded.push(item);
        }
        *list = decoded;
        true
    }

    /// Writes a single raw byte.
    pub fn write_single_byte(&mut self, byte: u8) -> bool {
        self.write_raw("write_single_byte", |buf| buf.put_u8(byte))
    }

    /// Reads a single raw byte.
    pub fn read_single_byte(&mut self, byte: &mut u8) -> bool {
        self.read_raw("read_single_byte", byte, |buf| {
            at_least(buf, 1)?;
            Ok(buf.get_u8())
        })
    }

    /// Writes `value` at its full fixed width, without varint compression.
    pub fn write_unencoded_stream<T: Unencoded>(&mut self, value: T) -> bool {
        self.write_raw("write_unencoded_stream", |buf| value.put(buf))
    }

    /// Reads a value written with [Archive::write_unencoded_stream].
    pub fn read_unencoded_stream<T: Unencoded>(&mut self, value: &mut T) -> bool {
        self.read_raw("read_unencoded_stream", value, |buf| {
            at_least(buf, T::SIZE)?;
            Ok(T::get(buf))
        })
    }

    /// Runs `write` when packing or `read` when unpacking, storing the decoded value in `value`.
    ///
    /// This is the only place where a transfer depends on the archive's mode.
    pub(crate) fn exchange<T>(
        &mut self,
        value: &mut T,
        write: impl FnOnce(&T, &mut BytesMut, &Limits) -> Result<(), Error>,
        read: impl FnOnce(&mut Bytes, &Limits) -> Result<T, Error>,
    ) -> bool {
        if self.error.is_some() {
            return false;
        }
        let result = match &mut self.stream {
            Stream::Packing(buffer) => write(value, &mut **buffer, &self.limits),
            Stream::Unpacking { cursor, .. } => {
                read(cursor, &self.limits).map(|decoded| *value = decoded)
            }
        };
        self.record(result)
    }

    fn write_raw(&mut self, operation: &'static str, write: impl FnOnce(&mut BytesMut)) -> bool {
        if self.error.is_some() {
            return false;
        }
        let result = match &mut self.stream {
            Stream::Packing(buffer) => {
                write(&mut **buffer);
                Ok(())
            }
            Stream::Unpacking { .. } => Err(Error::WrongMode(operation)),
        };
        self.record(result)
    }

    fn read_raw<T>(
        &mut self,
        operation: &'static str,
        value: &mut T,
        read: impl FnOnce(&mut Bytes) -> Result<T, Error>,
    ) -> bool {
        if self.error.is_some() {
            return false;
        }
        let result = match &mut self.stream {
            Stream::Packing(_) => Err(Error::WrongMode(operation)),
            Stream::Unpacking { cursor, .. } => read(cursor).map(|decoded| *value = decoded),
        };
        self.record(result)
    }

    fn record(&mut self, result: Result<(), Error>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => self.fail(err),
        }
    }

    fn fail(&mut self, err: Error) -> bool {
        debug!(
            ?err,
            mode = ?self.mode(),
            serialize_type = ?self.serialize_type,
            position = self.position(),
            "archive transfer failed"
        );
        if self.error.is_none() {
            self.error = Some(err);
        }
        false
    }
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("mode", &self.mode())
            .field("serialize_type", &self.serialize_type)
            .field("replication_policy", &self.replication_policy)
            .field("position", &self.position())
            .field("len", &self.access_buffer().len())
            .field("error", &self.error)
            .finish()
    }
}
