//! Implementations of [crate::Transfer] for common types

pub mod math;
pub mod primitives;
