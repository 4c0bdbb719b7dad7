//! Synthetic inertial measurement unit

use nalgebra::Vector3;

use crate::math::{Vector3Ext, dcm_from_euler};
use crate::pipeline::Module;
use crate::state::StateRecord;
use crate::types::SensorSettings;

/// Derives gyro and accelerometer readings from the current true attitude
///
/// The reading is a pure function of the state at the time of the call:
/// - gyro: commanded body rate in rad/s, plus the configured bias
/// - accel: world gravity `[0, 0, -g]` rotated into the body frame through the
///   world-to-body DCM of the current Euler angles
///
/// No noise is modelled.
#[derive(Debug, Clone, Default)]
pub struct SensorModel {
    settings: SensorSettings,
}

impl SensorModel {
    pub fn new() -> Self {
        Self::with_settings(SensorSettings::default())
    }

    pub fn with_settings(settings: SensorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> SensorSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: SensorSettings) {
        self.settings = settings;
    }

    fn gravity_world(&self) -> Vector3<f64> {
        Vector3::new(0.0, 0.0, -self.settings.gravity)
    }
}

impl Module for SensorModel {
    fn initialize(&mut self, state: &mut StateRecord) {
        state.sensor.gyro_rad_s = Vector3::zeros();
        state.sensor.accel_mps2 = self.gravity_world();
        tracing::debug!(gravity = self.settings.gravity, "sensor model initialised");
    }

    fn update(&mut self, _dt: f64, state: &mut StateRecord) {
        state.sensor.gyro_rad_s = state.attitude.angular_rate_deg_s.deg_to_rad() + self.settings.gyro_bias;
        state.sensor.accel_mps2 = dcm_from_euler(&state.attitude.euler) * self.gravity_world();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EulerAngles;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_level_reads_gravity_down() {
        let mut sensor = SensorModel::new();
        let mut state = StateRecord::default();
        sensor.initialize(&mut state);
        sensor.update(0.01, &mut state);

        let accel = state.sensor.accel_mps2;
        assert!(accel.x.abs() < EPSILON);
        assert!(accel.y.abs() < EPSILON);
        assert!((accel.z + 9.80665).abs() < EPSILON);
    }

    #[test]
    fn test_gyro_is_commanded_rate_in_radians() {
        let mut sensor = SensorModel::new();
        let mut state = StateRecord::default();
        state.attitude.angular_rate_deg_s = Vector3::new(90.0, -45.0, 180.0);
        sensor.update(0.01, &mut state);

        let expected = Vector3::new(
            core::f64::consts::FRAC_PI_2,
            -core::f64::consts::FRAC_PI_4,
            core::f64::consts::PI,
        );
        assert!((state.sensor.gyro_rad_s - expected).norm() < EPSILON);
    }

    #[test]
    fn test_rolled_body_sees_gravity_on_y() {
        let mut sensor = SensorModel::new();
        let mut state = StateRecord::default();
        state.attitude.euler = EulerAngles::from_degrees(90.0, 0.0, 0.0);
        sensor.update(0.01, &mut state);

        let accel = state.sensor.accel_mps2;
        assert!((accel.y + 9.80665).abs() < 1e-9);
        assert!(accel.z.abs() < 1e-9);
    }

    #[test]
    fn test_yaw_does_not_change_accel() {
        let mut sensor = SensorModel::new();
        let mut state = StateRecord::default();
        state.attitude.euler = EulerAngles::from_degrees(0.0, 0.0, 123.0);
        sensor.update(0.01, &mut state);

        assert!((state.sensor.accel_mps2 - Vector3::new(0.0, 0.0, -9.80665)).norm() < 1e-9);
    }

    #[test]
    fn test_gyro_bias_injection() {
        let bias = Vector3::new(0.01, -0.02, 0.0);
        let mut sensor = SensorModel::with_settings(SensorSettings {
            gyro_bias: bias,
            ..Default::default()
        });
        let mut state = StateRecord::default();
        sensor.update(0.01, &mut state);

        assert_eq!(state.sensor.gyro_rad_s, bias);
    }
}
