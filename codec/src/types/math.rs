//! Vector math types that replicated objects carry.

use crate::{Archive, Serialize};

/// A point or direction in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Transfers each component at full precision.
impl Serialize for Vector3 {
    fn serialize(&mut self, archive: &mut Archive) -> bool {
        let mut success = true;
        success &= archive.transfer(&mut self.x);
        success &= archive.transfer(&mut self.y);
        success &= archive.transfer(&mut self.z);
        success
    }
}

/// Facing of an object, in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl Orientation {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(yaw: f32, pitch: f32, roll: f32) -> Self {
        Self { yaw, pitch, roll }
    }
}

/// Transfers yaw, pitch and roll at full precision.
impl Serialize for Orientation {
    fn serialize(&mut self, archive: &mut Archive) -> bool {
        let mut success = true;
        success &= archive.transfer(&mut self.yaw);
        success &= archive.transfer(&mut self.pitch);
        success &= archive.transfer(&mut self.roll);
        success
    }
}
