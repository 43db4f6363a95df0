//! Fixed-precision conversion of floats.
//!
//! A value is scaled by `2^precision`, rounded to the nearest integer and stored as an `i32`.
//! Values that are exact multiples of `2^-precision` survive the conversion unchanged; for any
//! other value the error is at most `2^-(precision + 1)`. Scaled values outside the `i32` range
//! saturate.

/// Returns `2^precision` as an `f32`.
#[inline]
pub fn scale(precision: u8) -> f32 {
    2f32.powi(precision as i32)
}

/// Converts `value` to its scaled integer representation.
#[inline]
pub fn to_fixed(value: f32, precision: u8) -> i32 {
    // `as` saturates out-of-range values and maps NaN to zero.
    (value * scale(precision)).round() as i32
}

/// Converts a scaled integer back to a float.
#[inline]
pub fn from_fixed(scaled: i32, precision: u8) -> f32 {
    scaled as f32 / scale(precision)
}
