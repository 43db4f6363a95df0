//! Limits on length-prefixed values.

/// Bounds on length-prefixed values written to or read from an archive.
///
/// Archives are routinely unpacked from untrusted network buffers. A length prefix is checked
/// against these limits before anything is allocated for it. Packing archives enforce the same
/// limits, so a value that packs successfully also unpacks under those limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Limits {
    /// Maximum length, in bytes, of a transferred string.
    pub max_string_length: usize,

    /// Maximum number of elements in a transferred list.
    pub max_list_length: usize,
}

impl Limits {
    /// Limits that accept any length representable on the wire.
    pub const fn unbounded() -> Self {
        Self {
            max_string_length: u32::MAX as usize,
            max_list_length: u32::MAX as usize,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_string_length: 64 * 1024,
            max_list_length: 65_536,
        }
    }
}
