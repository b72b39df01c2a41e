//! Rotation math shared by the orientation and camera modules

pub mod quaternion;

pub use quaternion::{
    euler_to_quaternion, multiply, quaternion_to_euler, slerp, EulerAngles, Quaternion,
};
