//! Core transfer traits.
//!
//! An [Archive] runs in exactly one direction, but the code that describes an object's layout
//! does not need to know which. [Transfer::transfer] encodes the value when the archive is packing
//! and overwrites it with the decoded value when the archive is unpacking, so a single
//! [Serialize::serialize] body serves both directions.

use crate::Archive;

/// Trait for values that can be moved through an [Archive] in either direction.
///
/// Returns `true` on success. On failure the archive latches the error. A primitive is left
/// untouched, but a composite keeps whichever fields were decoded before the failure, so a
/// caller must discard any value whose transfer returned `false`. [Archive::transfer_list] is
/// the exception and only replaces the list once every element has decoded.
pub trait Transfer {
    /// Packs `self` into, or unpacks `self` from, `archive`.
    fn transfer(&mut self, archive: &mut Archive) -> bool;
}

/// Trait for composite objects that describe their layout as a sequence of transfers.
///
/// Implementations call [Archive::transfer] (or one of the fixed-precision variants) for every
/// field they own, in a fixed order, and AND the results together. The body must not branch on
/// the archive's mode. It may branch on the archive's [crate::SerializeType] or
/// [crate::ReplicationPolicy], which are identical on both ends.
///
/// Changing the order or set of transferred fields changes the wire format.
pub trait Serialize {
    /// Transfers every field of `self` through `archive`.
    fn serialize(&mut self, archive: &mut Archive) -> bool;
}

impl<T: Serialize + ?Sized> Transfer for T {
    #[inline]
    fn transfer(&mut self, archive: &mut Archive) -> bool {
        self.serialize(archive)
    }
}

impl<T: Serialize + ?Sized> Serialize for Box<T> {
    #[inline]
    fn serialize(&mut self, archive: &mut Archive) -> bool {
        (**self).serialize(archive)
    }
}
