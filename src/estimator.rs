//! Complementary attitude estimator with gyro bias learning

use nalgebra::{UnitQuaternion, Vector3};

use crate::math::{QuaternionExt, Vector3Ext};
use crate::pipeline::Module;
use crate::state::StateRecord;
use crate::types::EstimatorSettings;

/// Accelerometer magnitudes at or below this (m/s²) carry no usable gravity direction
const ACCEL_DEGENERATE_THRESHOLD: f64 = 1e-3;

/// Complementary (Mahony-style) attitude estimator
///
/// Fuses the synthetic gyro and accelerometer from the sensor frame into an
/// independent attitude estimate. Gravity is the only absolute reference, so
/// roll, pitch and the X/Y bias components are observable while yaw and the
/// Z bias drift with the gyro.
///
/// Per tick:
/// 1. subtract the bias estimate from the gyro reading
/// 2. predict by integrating the estimate with the corrected rate
/// 3. when the accelerometer reading is usable, compute the error between the
///    predicted and measured gravity directions, integrate again from the
///    start-of-tick estimate with the proportionally corrected rate, and feed
///    the error into the bias integrator
#[derive(Debug, Clone)]
pub struct ComplementaryEstimator {
    /// Gain settings
    settings: EstimatorSettings,
    /// Estimated body-to-world attitude
    quaternion: UnitQuaternion<f64>,
    /// Estimated gyro bias in rad/s
    bias: Vector3<f64>,
    /// Gravity-direction error of the last corrected tick
    error: Vector3<f64>,
    /// Whether the last tick skipped the accelerometer correction
    accelerometer_skipped: bool,
    /// Degenerate integrations since construction
    quaternion_resets: u64,
}

impl ComplementaryEstimator {
    /// Create an estimator with default gains
    pub fn new() -> Self {
        Self::with_settings(EstimatorSettings::default())
    }

    /// Create an estimator with the given gains
    pub fn with_settings(settings: EstimatorSettings) -> Self {
        Self {
            settings,
            quaternion: UnitQuaternion::identity(),
            bias: Vector3::zeros(),
            error: Vector3::zeros(),
            accelerometer_skipped: false,
            quaternion_resets: 0,
        }
    }

    /// Reset the estimate to `quaternion` and forget the learnt bias
    pub fn reset(&mut self, quaternion: UnitQuaternion<f64>) {
        self.quaternion = quaternion;
        self.bias = Vector3::zeros();
        self.error = Vector3::zeros();
        self.accelerometer_skipped = false;
    }

    pub fn settings(&self) -> EstimatorSettings {
        self.settings
    }

    /// Retune the proportional and integral gains. Takes effect next tick.
    pub fn set_gains(&mut self, kp: f64, ki: f64) {
        self.settings = EstimatorSettings { kp, ki };
    }

    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        self.quaternion
    }

    /// Current gyro bias estimate in rad/s
    pub fn bias(&self) -> Vector3<f64> {
        self.bias
    }

    /// Gravity-direction error applied on the last corrected tick
    pub fn error(&self) -> Vector3<f64> {
        self.error
    }

    /// Whether the last tick ran on gyro prediction only
    pub fn accelerometer_skipped(&self) -> bool {
        self.accelerometer_skipped
    }

    /// Advance the estimate by `dt` seconds from raw sensor readings.
    ///
    /// Returns false when the accelerometer reading was degenerate and only
    /// the gyro prediction was applied.
    pub fn step(&mut self, gyroscope: Vector3<f64>, accelerometer: Vector3<f64>, dt: f64) -> bool {
        let start = self.quaternion;
        let rate = gyroscope - self.bias;

        self.quaternion = self.integrate(&start, &rate, dt);

        if accelerometer.norm() <= ACCEL_DEGENERATE_THRESHOLD {
            return false;
        }

        let measured_down = accelerometer.safe_normalize();
        let predicted_down = self.quaternion.inverse_transform_vector(&-Vector3::z());
        let error = predicted_down.cross(&-measured_down);

        let corrected_rate = rate + error * self.settings.kp;
        self.quaternion = self.integrate(&start, &corrected_rate, dt);

        // Bias moves against the error so that it converges on the true offset
        self.bias -= error * (self.settings.ki * dt);
        self.error = error;
        true
    }

    fn integrate(&mut self, quaternion: &UnitQuaternion<f64>, rate: &Vector3<f64>, dt: f64) -> UnitQuaternion<f64> {
        match quaternion.integrate_body_rate(rate, dt) {
            Some(integrated) => integrated,
            None => {
                tracing::warn!(?rate, dt, "degenerate estimate quaternion reset to identity");
                self.quaternion_resets += 1;
                UnitQuaternion::identity()
            }
        }
    }

    fn publish(&self, state: &mut StateRecord) {
        state.estimator.quaternion = self.quaternion;
        state.estimator.euler = self.quaternion.to_euler_zyx();
        state.estimator.gyro_bias = self.bias;
    }
}

impl Default for ComplementaryEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for ComplementaryEstimator {
    fn initialize(&mut self, state: &mut StateRecord) {
        self.reset(state.attitude.quaternion);
        self.publish(state);
        tracing::debug!(
            kp = self.settings.kp,
            ki = self.settings.ki,
            "complementary estimator initialised"
        );
    }

    fn update(&mut self, dt: f64, state: &mut StateRecord) {
        if dt <= 0.0 {
            return;
        }

        let resets_before = self.quaternion_resets;
        let corrected = self.step(state.sensor.gyro_rad_s, state.sensor.accel_mps2, dt);
        state.diagnostics.quaternion_resets += self.quaternion_resets - resets_before;

        if !corrected {
            state.diagnostics.accel_skips += 1;
            if !self.accelerometer_skipped {
                tracing::debug!("accelerometer reading degenerate; estimator running on gyro only");
            }
        } else if self.accelerometer_skipped {
            tracing::debug!("accelerometer reading usable again; correction resumed");
        }
        self.accelerometer_skipped = !corrected;

        self.publish(state);
    }
}
