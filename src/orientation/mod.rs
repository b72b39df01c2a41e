//! Device orientation: sensor calibration and camera smoothing

pub mod calibrator;
pub mod interpolator;

pub use calibrator::{raw_quaternion, CalibratedOrientation, OrientationCalibrator, SampleError};
pub use interpolator::{CameraInterpolator, INTERPOLATION_TICKS};
