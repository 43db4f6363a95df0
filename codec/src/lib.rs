//! Pack and unpack replicated and persisted objects.
//!
//! # Overview
//!
//! Every object the server sends to a client or writes to the database passes through an
//! [Archive]. An archive runs in one of two modes, fixed when it is created:
//! - **Packing** appends encoded values to a growable buffer.
//! - **Unpacking** decodes values from an existing buffer.
//!
//! Transfers are symmetric. [Archive::transfer] encodes its argument when packing and overwrites
//! it when unpacking, so an object describes its layout once, in a [Serialize] implementation,
//! and that same code both writes and reads it.
//!
//! Each archive carries a [ReplicationPolicy] in its header and a [SerializeType] describing
//! why it exists. Both are identical on the packing and unpacking side, so a [Serialize]
//! implementation may use them to include audience-specific or persistence-only fields.
//!
//! # Supported Types
//!
//! Natively supports:
//! - Integers: `u16`, `u32`, `u64` (varint), `i16`, `i32`, `i64` (ZigZag varint)
//! - `f32` (lossless), `u8`, `bool`, `String`
//! - [Vector3] and [Orientation], either lossless or with a fixed number of fractional bits
//! - Lists via [Archive::transfer_list]
//! - Any [Serialize] implementor, including `Box<dyn Serialize>`
//!
//! Raw, unencoded bytes and fixed-width integers can be written with
//! [Archive::write_single_byte] and [Archive::write_unencoded_stream].
//!
//! # Example
//!
//! ```
//! use keystone_codec::{Archive, ReplicationPolicy, Serialize, SerializeType};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Health {
//!     current: i32,
//!     max: i32,
//!     regeneration: f32,
//! }
//!
//! impl Serialize for Health {
//!     fn serialize(&mut self, archive: &mut Archive) -> bool {
//!         let mut success = true;
//!         success &= archive.transfer(&mut self.current);
//!         success &= archive.transfer(&mut self.max);
//!         success &= archive.transfer_float_fixed(&mut self.regeneration, 4);
//!         success
//!     }
//! }
//!
//! // Pack
//! let mut health = Health { current: 350, max: 400, regeneration: 1.5 };
//! let mut archive = Archive::packing(SerializeType::Replication, ReplicationPolicy::PROXIMITY);
//! assert!(archive.transfer(&mut health));
//! let bytes = archive.into_bytes();
//!
//! // Unpack
//! let mut archive = Archive::unpacking(SerializeType::Replication, bytes).unwrap();
//! assert_eq!(archive.replication_policy(), ReplicationPolicy::PROXIMITY);
//! let mut decoded = Health::default();
//! assert!(archive.transfer(&mut decoded));
//! assert_eq!(decoded, health);
//! ```

pub mod archive;
pub mod codec;
pub mod config;
pub mod error;
pub mod fixed;
pub mod policy;
pub mod pool;
pub mod types;
pub mod varint;

// Re-export main types and traits
pub use archive::{Archive, Mode, SerializeType, Unencoded};
pub use codec::{Serialize, Transfer};
pub use config::Limits;
pub use error::Error;
pub use policy::ReplicationPolicy;
pub use pool::BufferPool;
pub use types::math::{Orientation, Vector3};
