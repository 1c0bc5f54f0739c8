//! Minimal vector-math primitives.
//!
//! Spec §1 treats vector arithmetic as "a given `Vec3` module" supplied by
//! the surrounding engine. This crate is meant to be usable standalone, so
//! we provide a small, `Pod`-castable `Vec3` and axis-aligned bounding box
//! rather than pulling in a full math crate — the clustering core only ever
//! needs addition, scaling and squared distance.

use bytemuck::{Pod, Zeroable};

/// A 3D single-precision position or direction.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Bitwise-equal comparison after normalizing `-0.0` to `+0.0`, matching
    /// the edge-matching contract in spec §3 ("positions compared bitwise
    /// equal... must produce equal hashes").
    pub fn bitwise_eq(self, other: Vec3) -> bool {
        normalize_zero(self.x) == normalize_zero(other.x)
            && normalize_zero(self.y) == normalize_zero(other.y)
            && normalize_zero(self.z) == normalize_zero(other.z)
    }

    pub fn distance_squared(self, other: Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Div for Vec3 {
    type Output = Vec3;
    fn div(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x / rhs.x, self.y / rhs.y, self.z / rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// `-0.0` collapses to `+0.0` so `HashPosition` (spec §3) is consistent for
/// both signed-zero encodings of the same point.
fn normalize_zero(f: f32) -> f32 {
    if f == 0.0 {
        0.0
    } else {
        f
    }
}

/// An axis-aligned bounding box enclosing a mesh or a set of centroids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds3 {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Vec3::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    pub fn grow(&mut self, p: Vec3) {
        self.min = Vec3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Vec3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.grow(p);
        }
        bounds
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}
