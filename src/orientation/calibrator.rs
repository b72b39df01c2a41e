//! Sensor calibration: raw rotation-vector samples to camera orientation

use crate::math::{multiply, quaternion_to_euler, EulerAngles, Quaternion};

/// Errors raised while decoding a raw rotation-vector sample
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleError {
    #[error("Rotation vector needs at least 3 components, got {0}")]
    TooShort(usize),

    #[error("Rotation vector contains a non-finite component")]
    NonFinite,
}

/// Build a quaternion from a rotation-vector reading.
///
/// Devices report either (x, y, z) or (x, y, z, w, ..). When only the vector
/// part is present the scalar is rebuilt from the unit-norm constraint; noisy
/// readings with |v| > 1 get w = 0.
pub fn raw_quaternion(values: &[f32]) -> Result<Quaternion, SampleError> {
    if values.len() < 3 {
        return Err(SampleError::TooShort(values.len()));
    }
    let used = &values[..values.len().min(4)];
    if used.iter().any(|v| !v.is_finite()) {
        return Err(SampleError::NonFinite);
    }

    let (x, y, z) = (values[0], values[1], values[2]);
    let w = match values.get(3) {
        Some(&w) => w,
        None => {
            let remainder = 1.0 - (x * x + y * y + z * z);
            if remainder > 0.0 {
                remainder.sqrt()
            } else {
                0.0
            }
        }
    };

    Ok(Quaternion::new(x, y, z, w))
}

/// Output of a calibration pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratedOrientation {
    /// Raw orientation relative to the calibration zero point
    pub calibrated: Quaternion,
    /// Angles for `player_rotation_updated`, yaw already inverted for the server
    pub rotation_update: EulerAngles,
    /// Final camera orientation; absent until the match supplies an initial rotation
    pub camera: Option<Quaternion>,
}

/// Tracks the calibration zero point and the match's initial facing
#[derive(Debug, Clone)]
pub struct OrientationCalibrator {
    calibration: Quaternion,
    current_raw: Quaternion,
    last_raw_euler: EulerAngles,
    initial_rotation: Option<Quaternion>,
    change_threshold: f32,
}

impl OrientationCalibrator {
    /// `change_threshold` is the summed absolute Euler change a new sample must
    /// exceed before it is recomputed; 0 recomputes every sample.
    pub fn new(change_threshold: f32) -> Self {
        Self {
            calibration: Quaternion::IDENTITY,
            current_raw: Quaternion::IDENTITY,
            last_raw_euler: EulerAngles::default(),
            initial_rotation: None,
            change_threshold: change_threshold.max(0.0),
        }
    }

    /// Capture the match's initial facing (from `game_started`)
    pub fn set_initial_rotation(&mut self, rotation: EulerAngles) {
        self.initial_rotation = Some(rotation.to_quaternion());
    }

    pub fn calibration(&self) -> Quaternion {
        self.calibration
    }

    pub fn current_raw(&self) -> Quaternion {
        self.current_raw
    }

    /// Feed a raw sample. Returns `None` when the change is below the threshold.
    pub fn ingest(&mut self, values: &[f32]) -> Result<Option<CalibratedOrientation>, SampleError> {
        let raw = raw_quaternion(values)?;
        self.current_raw = raw;

        let euler = quaternion_to_euler(raw);
        let difference = euler.manhattan_distance(self.last_raw_euler);
        self.last_raw_euler = euler;

        if self.change_threshold > 0.0 && difference <= self.change_threshold {
            return Ok(None);
        }

        Ok(Some(self.recompute()))
    }

    /// Make the current raw orientation the new zero point
    pub fn calibrate(&mut self) -> CalibratedOrientation {
        self.calibration = self.current_raw.conjugate();
        self.recompute()
    }

    /// Derive calibrated, outgoing and camera orientations from current state
    pub fn recompute(&self) -> CalibratedOrientation {
        let calibrated = multiply(self.calibration, self.current_raw);
        let angles = quaternion_to_euler(calibrated);

        // Server yaw runs opposite to the device sensor's
        let rotation_update = EulerAngles::new(angles.roll, angles.pitch, -angles.yaw);

        let camera = self
            .initial_rotation
            .map(|initial| multiply(calibrated, initial));

        CalibratedOrientation {
            calibrated,
            rotation_update,
            camera,
        }
    }
}

impl Default for OrientationCalibrator {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::euler_to_quaternion;
    use std::f32::consts::PI;

    const EPS: f32 = 1e-4;

    fn sample(q: Quaternion) -> [f32; 4] {
        [q.x, q.y, q.z, q.w]
    }

    #[test]
    fn test_raw_quaternion_rebuilds_scalar() {
        let q = raw_quaternion(&[0.0, 0.6, 0.0]).unwrap();
        assert!((q.w - 0.8).abs() < EPS);
    }

    #[test]
    fn test_raw_quaternion_clamps_noisy_vector() {
        let q = raw_quaternion(&[0.8, 0.7, 0.0]).unwrap();
        assert_eq!(q.w, 0.0);
    }

    #[test]
    fn test_raw_quaternion_ignores_accuracy_component() {
        let q = raw_quaternion(&[0.1, 0.2, 0.3, 0.9, -1.0]).unwrap();
        assert_eq!(q, Quaternion::new(0.1, 0.2, 0.3, 0.9));
    }

    #[test]
    fn test_raw_quaternion_rejects_short_or_nan() {
        assert_eq!(raw_quaternion(&[0.1, 0.2]), Err(SampleError::TooShort(2)));
        assert_eq!(
            raw_quaternion(&[0.1, f32::NAN, 0.0]),
            Err(SampleError::NonFinite)
        );
    }

    #[test]
    fn test_uncalibrated_passthrough() {
        let mut calibrator = OrientationCalibrator::default();
        let raw = euler_to_quaternion(0.2, 0.1, 0.5);
        let out = calibrator.ingest(&sample(raw)).unwrap().unwrap();

        assert!(out.calibrated.same_rotation(raw, EPS));
        assert!((out.rotation_update.roll - 0.2).abs() < EPS);
        assert!((out.rotation_update.pitch - 0.1).abs() < EPS);
        assert!((out.rotation_update.yaw + 0.5).abs() < EPS);
        assert!(out.camera.is_none());
    }

    #[test]
    fn test_calibrate_zeroes_current_orientation() {
        let mut calibrator = OrientationCalibrator::default();
        calibrator
            .ingest(&sample(euler_to_quaternion(0.4, -0.3, 1.2)))
            .unwrap();

        let out = calibrator.calibrate();
        assert!(out.calibrated.same_rotation(Quaternion::IDENTITY, EPS));
        assert!(out.rotation_update.roll.abs() < EPS);
        assert!(out.rotation_update.pitch.abs() < EPS);
        assert!(out.rotation_update.yaw.abs() < EPS);
    }

    #[test]
    fn test_rotation_after_calibration_is_relative() {
        let mut calibrator = OrientationCalibrator::default();
        let zero = euler_to_quaternion(0.0, 0.0, 0.7);
        calibrator.ingest(&sample(zero)).unwrap();
        calibrator.calibrate();

        // Turn a further 0.3 rad of yaw
        let turned = crate::math::multiply(euler_to_quaternion(0.0, 0.0, 0.3), zero);
        let out = calibrator.ingest(&sample(turned)).unwrap().unwrap();
        assert!((out.rotation_update.yaw + 0.3).abs() < EPS);
    }

    #[test]
    fn test_camera_combines_initial_rotation() {
        let mut calibrator = OrientationCalibrator::default();
        calibrator.set_initial_rotation(EulerAngles::new(0.0, PI, 0.0));

        let out = calibrator.recompute();
        let camera = out.camera.unwrap();
        assert!(camera.same_rotation(euler_to_quaternion(0.0, PI, 0.0), EPS));
    }

    #[test]
    fn test_threshold_skips_small_changes() {
        let mut calibrator = OrientationCalibrator::new(0.02);
        let first = calibrator
            .ingest(&sample(euler_to_quaternion(0.0, 0.0, 0.5)))
            .unwrap();
        assert!(first.is_some());

        let jitter = calibrator
            .ingest(&sample(euler_to_quaternion(0.0, 0.0, 0.505)))
            .unwrap();
        assert!(jitter.is_none());
        // The raw reading is still tracked for the next calibration
        assert!(calibrator
            .current_raw()
            .same_rotation(euler_to_quaternion(0.0, 0.0, 0.505), EPS));
    }
}
