//! Quaternion and Euler-angle conversions used by the camera pipeline

use glam::{Quat, Vec3};
use std::f64::consts::FRAC_PI_2;

/// Dot product above which two quaternions are treated as parallel in `slerp`
pub const SLERP_PARALLEL_THRESHOLD: f32 = 0.9995;

/// A rotation stored as (x, y, z, w).
///
/// Unit norm is a convention, not an invariant: sensor data and linear
/// blends can drift, so callers normalize where it matters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Inverse rotation for unit quaternions
    pub fn conjugate(self) -> Self {
        Quat::from(self).conjugate().into()
    }

    pub fn dot(self, other: Self) -> f32 {
        Quat::from(self).dot(other.into())
    }

    pub fn length(self) -> f32 {
        Quat::from(self).length()
    }

    /// Scale to unit length. A zero quaternion maps to identity.
    pub fn normalize(self) -> Self {
        if self.length() <= f32::EPSILON {
            return Self::IDENTITY;
        }
        Quat::from(self).normalize().into()
    }

    pub fn negate(self) -> Self {
        (-Quat::from(self)).into()
    }

    /// Rotate a vector by this (unit) quaternion: q * v * q⁻¹
    pub fn rotate(self, v: Vec3) -> Vec3 {
        Quat::from(self) * v
    }

    /// Rotation equality that treats q and -q as the same rotation
    pub fn same_rotation(self, other: Self, epsilon: f32) -> bool {
        self.dot(other).abs() >= 1.0 - epsilon
    }
}

impl From<Quaternion> for Quat {
    fn from(q: Quaternion) -> Self {
        Quat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}

impl From<Quat> for Quaternion {
    fn from(q: Quat) -> Self {
        Self::new(q.x, q.y, q.z, q.w)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Roll, pitch and yaw in radians
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl EulerAngles {
    pub const fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self { roll, pitch, yaw }
    }

    pub fn to_quaternion(self) -> Quaternion {
        euler_to_quaternion(self.roll, self.pitch, self.yaw)
    }

    /// Sum of absolute per-axis differences
    pub fn manhattan_distance(self, other: Self) -> f32 {
        (self.roll - other.roll).abs() + (self.pitch - other.pitch).abs() + (self.yaw - other.yaw).abs()
    }
}

/// Aerospace sequence (yaw, then pitch, then roll) built from half-angle products
pub fn euler_to_quaternion(roll: f32, pitch: f32, yaw: f32) -> Quaternion {
    let (sy, cy) = (f64::from(yaw) * 0.5).sin_cos();
    let (sp, cp) = (f64::from(pitch) * 0.5).sin_cos();
    let (sr, cr) = (f64::from(roll) * 0.5).sin_cos();

    let w = cr * cp * cy + sr * sp * sy;
    let x = sr * cp * cy - cr * sp * sy;
    let y = cr * sp * cy + sr * cp * sy;
    let z = cr * cp * sy - sr * sp * cy;

    Quaternion::new(x as f32, y as f32, z as f32, w as f32)
}

/// Inverse of [`euler_to_quaternion`].
///
/// Near gimbal lock the pitch sine can leave [-1, 1] through rounding; pitch
/// is then pinned to ±π/2 instead of producing NaN from `asin`.
pub fn quaternion_to_euler(q: Quaternion) -> EulerAngles {
    let (qx, qy, qz, qw) = (
        f64::from(q.x),
        f64::from(q.y),
        f64::from(q.z),
        f64::from(q.w),
    );

    let sinr_cosp = 2.0 * (qw * qx + qy * qz);
    let cosr_cosp = 1.0 - 2.0 * (qx * qx + qy * qy);
    let roll = sinr_cosp.atan2(cosr_cosp);

    let sinp = 2.0 * (qw * qy - qz * qx);
    let pitch = if sinp.abs() >= 1.0 {
        FRAC_PI_2.copysign(sinp)
    } else {
        sinp.asin()
    };

    let siny_cosp = 2.0 * (qw * qz + qx * qy);
    let cosy_cosp = 1.0 - 2.0 * (qy * qy + qz * qz);
    let yaw = siny_cosp.atan2(cosy_cosp);

    EulerAngles::new(roll as f32, pitch as f32, yaw as f32)
}

/// Hamilton product q1 * q2 (q2 applied first, then q1)
pub fn multiply(q1: Quaternion, q2: Quaternion) -> Quaternion {
    (Quat::from(q1) * Quat::from(q2)).into()
}

/// Shortest-path spherical interpolation, `t` in [0, 1].
///
/// `slerp(a, b, 0.0)` is exactly `a`. When the inputs lie in opposite
/// hemispheres `b` is negated, so `t = 1.0` yields `-b` (the same rotation).
pub fn slerp(q1: Quaternion, q2: Quaternion, t: f32) -> Quaternion {
    let mut q2 = q2;
    let mut dot = q1.dot(q2);

    if dot < 0.0 {
        q2 = q2.negate();
        dot = -dot;
    }

    if dot > SLERP_PARALLEL_THRESHOLD {
        if t == 0.0 {
            return q1;
        }
        return Quaternion::new(
            q1.x + t * (q2.x - q1.x),
            q1.y + t * (q2.y - q1.y),
            q1.z + t * (q2.z - q1.z),
            q1.w + t * (q2.w - q1.w),
        )
        .normalize();
    }

    let theta = dot.min(1.0).acos() * t;

    // Component of q2 orthogonal to q1
    let ortho = Quaternion::new(
        q2.x - q1.x * dot,
        q2.y - q1.y * dot,
        q2.z - q1.z * dot,
        q2.w - q1.w * dot,
    )
    .normalize();

    let (s, c) = theta.sin_cos();
    Quaternion::new(
        q1.x * c + ortho.x * s,
        q1.y * c + ortho.y * s,
        q1.z * c + ortho.z * s,
        q1.w * c + ortho.w * s,
    )
}
