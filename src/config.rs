//! Simulation configuration loaded from RON
//!
//! Every field carries a default, so a document only needs to name what it
//! changes:
//!
//! ```
//! use attitude_rig::SimConfig;
//!
//! let config = SimConfig::from_ron_str("(estimator: (kp: 1.0), bus_voltage: 22.2)").unwrap();
//! assert_eq!(config.estimator.kp, 1.0);
//! assert_eq!(config.estimator.ki, 0.05);
//! assert_eq!(config.bus_voltage, 22.2);
//! ```

use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{
    ControlState, DynamicsConfig, MAX_FIXED_DT, MIN_FIXED_DT, PowerState, RotorConfig, StateRecord, VehicleConfig,
};
use crate::types::{EstimatorSettings, HistorySettings, SensorSettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialise configuration: {0}")]
    Serialize(#[from] ron::Error),
    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

/// Every tunable of the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub estimator: EstimatorSettings,
    pub sensor: SensorSettings,
    pub dynamics: DynamicsConfig,
    pub rotor: RotorConfig,
    pub vehicle: VehicleConfig,
    pub control: ControlState,
    pub history: HistorySettings,
    /// Initial bus voltage in volts
    pub bus_voltage: f64,
    /// Commanded body rate at start-up in deg/s
    pub initial_rate_deg_s: Vector3<f64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorSettings::default(),
            sensor: SensorSettings::default(),
            dynamics: DynamicsConfig::default(),
            rotor: RotorConfig::default(),
            vehicle: VehicleConfig::default(),
            control: ControlState::default(),
            history: HistorySettings::default(),
            bus_voltage: PowerState::default().bus_voltage,
            initial_rate_deg_s: Vector3::zeros(),
        }
    }
}

impl SimConfig {
    /// Parse a RON document. The result is not validated.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    /// Read and parse a RON file. The result is not validated.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Check every parameter against its physical range
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("estimator.kp", self.estimator.kp)?;
        non_negative("estimator.ki", self.estimator.ki)?;

        positive("sensor.gravity", self.sensor.gravity)?;
        for component in self.sensor.gyro_bias.iter() {
            finite("sensor.gyro_bias", *component)?;
        }

        finite("dynamics.input_target", self.dynamics.input_target)?;
        finite("dynamics.gain", self.dynamics.gain)?;
        non_negative("dynamics.sine_frequency_hz", self.dynamics.sine_frequency_hz)?;
        non_negative("dynamics.time_constant", self.dynamics.time_constant)?;

        non_negative("rotor.thrust_coefficient", self.rotor.thrust_coefficient)?;
        non_negative("rotor.torque_coefficient", self.rotor.torque_coefficient)?;
        non_negative("rotor.base_rpm", self.rotor.base_rpm)?;
        finite("rotor.rpm_amplitude", self.rotor.rpm_amplitude)?;
        finite("rotor.phase_rate", self.rotor.phase_rate)?;

        positive("vehicle.mass", self.vehicle.mass)?;
        for moment in self.vehicle.inertia.iter() {
            positive("vehicle.inertia", *moment)?;
        }
        non_negative("vehicle.arm_length", self.vehicle.arm_length)?;
        non_negative("vehicle.drag_coefficient", self.vehicle.drag_coefficient)?;
        non_negative("vehicle.max_rotor_omega", self.vehicle.max_rotor_omega)?;

        let fixed_dt = self.control.fixed_dt;
        if !(MIN_FIXED_DT..=MAX_FIXED_DT).contains(&fixed_dt) {
            return Err(invalid("control.fixed_dt", fixed_dt, "must lie in [1e-5, 0.5] seconds"));
        }
        non_negative("control.time_scale", self.control.time_scale)?;

        positive("history.window_seconds", self.history.window_seconds)?;
        non_negative("history.sample_interval", self.history.sample_interval)?;

        positive("bus_voltage", self.bus_voltage)?;
        for component in self.initial_rate_deg_s.iter() {
            finite("initial_rate_deg_s", *component)?;
        }

        Ok(())
    }

    /// State record with every host-owned field taken from this configuration
    pub fn initial_state(&self) -> StateRecord {
        let mut state = StateRecord {
            dynamics_config: self.dynamics,
            rotor_config: self.rotor,
            vehicle_config: self.vehicle,
            control: self.control,
            ..Default::default()
        };
        state.attitude.angular_rate_deg_s = self.initial_rate_deg_s;
        state.power.bus_voltage = self.bus_voltage;
        state
    }
}

fn invalid(name: &'static str, value: f64, reason: &'static str) -> ConfigError {
    ConfigError::InvalidParameter { name, value, reason }
}

fn finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(name, value, "must be finite"))
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, value, "must not be negative"))
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, value, "must be positive"))
    }
}
