use bytemuck::{Pod, Zeroable};
use std::mem::size_of;
use std::ops::{Add, AddAssign, Mul, Sub};

/// 2 component vector as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Default, Zeroable, Pod)]
#[repr(C)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

/// 3 component vector as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Default, Zeroable, Pod)]
#[repr(C)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 4 component vector as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Default, Zeroable, Pod)]
#[repr(C)]
pub struct Vector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// Quaternion as stored on disk, (x, y, z, w) order.
#[derive(Debug, Clone, Copy, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

static_assertions::const_assert_eq!(size_of::<Vector2>(), 8);
static_assertions::const_assert_eq!(size_of::<Vector3>(), 12);
static_assertions::const_assert_eq!(size_of::<Vector4>(), 16);
static_assertions::const_assert_eq!(size_of::<Quaternion>(), 16);

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vector3 { x, y, z }
    }
}

impl Vector4 {
    pub const ZERO: Vector4 = Vector4 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 0.0,
    };

    pub const fn splat(value: f32) -> Self {
        Vector4 {
            x: value,
            y: value,
            z: value,
            w: value,
        }
    }

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Vector4 { x, y, z, w }
    }
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

impl Default for Quaternion {
    fn default() -> Self {
        Quaternion::IDENTITY
    }
}

impl From<Vector2> for [f32; 2] {
    fn from(vector: Vector2) -> Self {
        [vector.x, vector.y]
    }
}

impl From<[f32; 2]> for Vector2 {
    fn from(values: [f32; 2]) -> Self {
        Vector2 {
            x: values[0],
            y: values[1],
        }
    }
}

impl From<Vector3> for [f32; 3] {
    fn from(vector: Vector3) -> Self {
        [vector.x, vector.y, vector.z]
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from(values: [f32; 3]) -> Self {
        Vector3 {
            x: values[0],
            y: values[1],
            z: values[2],
        }
    }
}

impl From<Vector4> for [f32; 4] {
    fn from(vector: Vector4) -> Self {
        [vector.x, vector.y, vector.z, vector.w]
    }
}

impl From<[f32; 4]> for Vector4 {
    fn from(values: [f32; 4]) -> Self {
        Vector4 {
            x: values[0],
            y: values[1],
            z: values[2],
            w: values[3],
        }
    }
}

impl From<Vector3> for cgmath::Vector3<f32> {
    fn from(vector: Vector3) -> Self {
        cgmath::Vector3::new(vector.x, vector.y, vector.z)
    }
}

impl From<cgmath::Vector3<f32>> for Vector3 {
    fn from(vector: cgmath::Vector3<f32>) -> Self {
        Vector3 {
            x: vector.x,
            y: vector.y,
            z: vector.z,
        }
    }
}

impl From<Vector4> for cgmath::Vector4<f32> {
    fn from(vector: Vector4) -> Self {
        cgmath::Vector4::new(vector.x, vector.y, vector.z, vector.w)
    }
}

impl From<Quaternion> for cgmath::Quaternion<f32> {
    fn from(quaternion: Quaternion) -> Self {
        cgmath::Quaternion::new(quaternion.w, quaternion.x, quaternion.y, quaternion.z)
    }
}

impl From<cgmath::Quaternion<f32>> for Quaternion {
    fn from(quaternion: cgmath::Quaternion<f32>) -> Self {
        Quaternion {
            x: quaternion.v.x,
            y: quaternion.v.y,
            z: quaternion.v.z,
            w: quaternion.s,
        }
    }
}

impl Add<Vector2> for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Vector2) -> Self::Output {
        Vector2 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Add<Vector3> for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Self::Output {
        Vector3 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub<Vector3> for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Self::Output {
        Vector3 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Add<Vector4> for Vector4 {
    type Output = Vector4;

    fn add(self, rhs: Vector4) -> Self::Output {
        Vector4 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
            w: self.w + rhs.w,
        }
    }
}

impl AddAssign<Vector2> for Vector2 {
    fn add_assign(&mut self, rhs: Vector2) {
        *self = *self + rhs;
    }
}

impl AddAssign<Vector3> for Vector3 {
    fn add_assign(&mut self, rhs: Vector3) {
        *self = *self + rhs;
    }
}

impl AddAssign<Vector4> for Vector4 {
    fn add_assign(&mut self, rhs: Vector4) {
        *self = *self + rhs;
    }
}

impl Mul<f32> for Vector3 {
    type Output = Vector3;

    fn mul(self, rhs: f32) -> Self::Output {
        Vector3 {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl Mul<f32> for Vector4 {
    type Output = Vector4;

    fn mul(self, rhs: f32) -> Self::Output {
        Vector4 {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
            w: self.w * rhs,
        }
    }
}
