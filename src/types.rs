//! Core types and settings for the attitude rig

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::math::{DEG_TO_RAD, RAD_TO_DEG};

/// ZYX (yaw-pitch-roll) Euler angles in radians
///
/// Produced from quaternions with every angle wrapped to (-π, π].
///
/// # Example
/// ```
/// use attitude_rig::EulerAngles;
///
/// let euler = EulerAngles::from_degrees(10.0, 0.0, 90.0);
/// assert!((euler.yaw - core::f64::consts::FRAC_PI_2).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerAngles {
    /// Rotation about body X
    pub roll: f64,
    /// Rotation about body Y
    pub pitch: f64,
    /// Rotation about body Z
    pub yaw: f64,
}

impl EulerAngles {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    pub fn from_degrees(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self::new(roll * DEG_TO_RAD, pitch * DEG_TO_RAD, yaw * DEG_TO_RAD)
    }

    /// Angles in degrees as (roll, pitch, yaw)
    pub fn to_degrees(&self) -> Vector3<f64> {
        Vector3::new(self.roll, self.pitch, self.yaw) * RAD_TO_DEG
    }
}

/// Complementary estimator settings
///
/// Gains of the proportional-integral correction that pulls the estimated
/// attitude toward the accelerometer's gravity direction.
///
/// # Example
/// ```
/// use attitude_rig::EstimatorSettings;
///
/// let settings = EstimatorSettings {
///     kp: 1.0,   // slower attitude correction
///     ..Default::default()
/// };
/// assert_eq!(settings.ki, 0.05);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorSettings {
    /// Proportional gain on the gravity-direction error (1/s)
    ///
    /// Higher values trust the accelerometer more and converge faster but
    /// pass more accelerometer disturbance into the estimate.
    pub kp: f64,
    /// Integral gain driving the gyro bias estimate (1/s²)
    ///
    /// Zero disables bias learning.
    pub ki: f64,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self { kp: 2.0, ki: 0.05 }
    }
}

/// Synthetic IMU settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    /// Gravitational acceleration in m/s²
    pub gravity: f64,
    /// Constant bias added to every synthetic gyro reading (rad/s)
    ///
    /// Zero reproduces the ideal sensor. This is the injection point for
    /// sensor error models.
    pub gyro_bias: Vector3<f64>,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            gravity: 9.80665,
            gyro_bias: Vector3::zeros(),
        }
    }
}

/// Telemetry history settings
///
/// # Example
/// ```
/// use attitude_rig::{HistoryBuffer, HistorySettings, DynamicsSample};
///
/// let settings = HistorySettings {
///     window_seconds: 30.0,
///     sample_interval: 0.1,   // 10 Hz
/// };
/// let buffer: HistoryBuffer<DynamicsSample> = HistoryBuffer::with_settings(settings);
/// assert!(buffer.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Age in seconds beyond which samples are evicted
    pub window_seconds: f64,
    /// Minimum spacing in seconds between rate-limited samples
    pub sample_interval: f64,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            window_seconds: 15.0,
            sample_interval: 0.05,
        }
    }
}

/// Pipeline stages, one per computational module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKind {
    AttitudeKinematics,
    TestDynamics,
    SensorModel,
    ComplementaryEstimator,
    RotorAerodynamics,
}
