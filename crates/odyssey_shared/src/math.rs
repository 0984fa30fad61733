//! Mathematical types carried in player and cap packets.
//!
//! Both types are `#[repr(C)]` runs of `f32` so they can be copied into a
//! packet buffer as-is.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// 3D Vector - position
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Size in bytes.
    pub const SIZE: usize = 12;

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Rotation quaternion, wire order `x, y, z, w`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quat {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Quat {
    /// Size in bytes.
    pub const SIZE: usize = 16;

    /// Identity rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// All-zero quaternion, what an uninitialized sender transmits.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Components below this magnitude count as zero.
    pub const EPSILON: f32 = 1.0e-6;

    /// Creates a new quaternion
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// True if every component is (near) zero.
    #[must_use]
    pub fn is_degenerate(self) -> bool {
        self.to_array().iter().all(|c| c.abs() < Self::EPSILON)
    }

    /// True if the quaternion may overwrite a stored orientation.
    ///
    /// Rejects all-zero values, NaNs, and any component outside `[-1, 1]`.
    #[must_use]
    pub fn is_acceptable(self) -> bool {
        !self.is_degenerate() && self.to_array().iter().all(|c| c.abs() <= 1.0)
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}
