//! The shared state record passed through every pipeline stage
//!
//! A single [`StateRecord`] is owned by the host loop for the lifetime of the
//! process (see [`Simulation`](crate::Simulation)). Each stage owns a subset of
//! the fields and writes only those; later stages in a tick read what earlier
//! stages wrote in the same tick.
//!
//! | Field | Written by |
//! |-------|-----------|
//! | `attitude.quaternion`, `attitude.euler` | `AttitudeKinematics` |
//! | `timing` | `Pipeline` |
//! | `dynamics_state` | `TestDynamics` |
//! | `sensor` | `SensorModel` |
//! | `estimator` | `ComplementaryEstimator` only |
//! | `rotor`, `power.bus_current`, `power.energy_joule`, `vehicle` | `RotorAerodynamics` |
//! | `control`, `attitude.angular_rate_deg_s`, `dynamics_config`, `motor_commands`, `power.bus_voltage` | host / UI |

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::types::EulerAngles;

/// Fixed rotor count of the airframe
pub const ROTOR_COUNT: usize = 4;

/// Bounds applied by [`ControlState::set_fixed_dt`]
pub const MIN_FIXED_DT: f64 = 1e-5;
pub const MAX_FIXED_DT: f64 = 0.5;

/// True attitude of the simulated body
#[derive(Debug, Clone, PartialEq)]
pub struct AttitudeState {
    /// Body-to-world unit quaternion
    pub quaternion: UnitQuaternion<f64>,
    /// ZYX Euler angles derived from `quaternion`
    pub euler: EulerAngles,
    /// Commanded body angular rate in deg/s
    pub angular_rate_deg_s: Vector3<f64>,
}

impl Default for AttitudeState {
    fn default() -> Self {
        Self {
            quaternion: UnitQuaternion::identity(),
            euler: EulerAngles::default(),
            angular_rate_deg_s: Vector3::zeros(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timing {
    /// Accumulated simulation time in seconds
    pub elapsed: f64,
    /// Effective step of the most recent tick, zero when the tick was skipped
    pub last_dt: f64,
}

/// Parameters of the first-order reference system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsConfig {
    /// Constant input used when `use_sine` is false
    pub input_target: f64,
    /// Drive the system with `gain * sin(2π f t)` instead of `input_target`
    pub use_sine: bool,
    pub sine_frequency_hz: f64,
    /// Time constant τ in seconds, clamped to 1e-3 before use
    pub time_constant: f64,
    pub gain: f64,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            input_target: 1.0,
            use_sine: false,
            sine_frequency_hz: 0.5,
            time_constant: 1.0,
            gain: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DynamicsState {
    pub input: f64,
    pub output: f64,
    pub internal_state: f64,
}

/// Instantaneous synthetic IMU reading, recomputed every tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorFrame {
    pub gyro_rad_s: Vector3<f64>,
    pub accel_mps2: Vector3<f64>,
}

/// Published output of the complementary estimator
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorState {
    pub quaternion: UnitQuaternion<f64>,
    pub euler: EulerAngles,
    /// Current gyro bias estimate in rad/s
    pub gyro_bias: Vector3<f64>,
}

impl Default for EstimatorState {
    fn default() -> Self {
        Self {
            quaternion: UnitQuaternion::identity(),
            euler: EulerAngles::default(),
            gyro_bias: Vector3::zeros(),
        }
    }
}

/// Source of rotor speeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotorModel {
    /// Base RPM plus a slow phase-offset sinusoid per rotor
    #[default]
    Synthetic,
    /// Rotor speeds from motor commands, coupled into the 6-DOF vehicle body
    Physics,
}

/// Rotor aerodynamic coefficients and speed-generator parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotorConfig {
    /// Thrust coefficient kT in N/(rad/s)²
    pub thrust_coefficient: f64,
    /// Torque coefficient kQ in N·m/(rad/s)²
    pub torque_coefficient: f64,
    pub model: RotorModel,
    /// Synthetic generator centre speed (RPM)
    pub base_rpm: f64,
    /// Synthetic generator oscillation amplitude (RPM)
    pub rpm_amplitude: f64,
    /// Synthetic generator phase advance (rad/s)
    pub phase_rate: f64,
}

impl Default for RotorConfig {
    fn default() -> Self {
        Self {
            thrust_coefficient: 1.6e-4,
            torque_coefficient: 2.0e-5,
            model: RotorModel::Synthetic,
            base_rpm: 1500.0,
            rpm_amplitude: 50.0,
            phase_rate: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotorTelemetry {
    pub rpm: [f64; ROTOR_COUNT],
    pub thrust_newton: [f64; ROTOR_COUNT],
    pub torque_newton_metre: [f64; ROTOR_COUNT],
    pub power_watt: [f64; ROTOR_COUNT],
    pub total_thrust_newton: f64,
    pub total_power_watt: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerState {
    /// Bus voltage, supplied externally
    pub bus_voltage: f64,
    pub bus_current: f64,
    /// Energy drawn since the last explicit reset, never decremented by the core
    pub energy_joule: f64,
}

impl Default for PowerState {
    fn default() -> Self {
        Self {
            bus_voltage: 14.8,
            bus_current: 0.0,
            energy_joule: 0.0,
        }
    }
}

/// Host-side stepping controls
///
/// # Example
/// ```
/// use attitude_rig::ControlState;
///
/// let mut control = ControlState::default();
/// control.use_fixed_dt = true;
/// control.set_fixed_dt(2.0);
/// assert_eq!(control.fixed_dt, 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlState {
    pub paused: bool,
    pub use_fixed_dt: bool,
    pub fixed_dt: f64,
    /// Multiplier applied to the real frame delta when `use_fixed_dt` is false
    pub time_scale: f64,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            paused: false,
            use_fixed_dt: false,
            fixed_dt: 0.01,
            time_scale: 1.0,
        }
    }
}

impl ControlState {
    /// Set the fixed step, clamped to [1e-5, 0.5] seconds
    pub fn set_fixed_dt(&mut self, fixed_dt: f64) {
        let clamped = if fixed_dt.is_nan() {
            MIN_FIXED_DT
        } else {
            fixed_dt.clamp(MIN_FIXED_DT, MAX_FIXED_DT)
        };
        if clamped != fixed_dt {
            tracing::debug!(requested = fixed_dt, applied = clamped, "fixed dt clamped");
        }
        self.fixed_dt = clamped;
    }

    /// Set the time scale, clamped to be non-negative
    pub fn set_time_scale(&mut self, time_scale: f64) {
        let clamped = if time_scale.is_nan() { 0.0 } else { time_scale.max(0.0) };
        if clamped != time_scale {
            tracing::debug!(requested = time_scale, applied = clamped, "time scale clamped");
        }
        self.time_scale = clamped;
    }

    /// Step the pipeline should use for a real frame delta.
    ///
    /// Returns zero for paused or non-positive input, which callers treat as
    /// a skipped tick.
    pub fn effective_dt(&self, real_dt: f64) -> f64 {
        if self.paused || !(real_dt > 0.0) {
            return 0.0;
        }
        let dt = if self.use_fixed_dt {
            self.fixed_dt
        } else {
            real_dt * self.time_scale
        };
        if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
    }
}

/// How rotor speeds are commanded in the physics variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MotorCommandMode {
    /// Use `omega_rad_s` directly
    #[default]
    Omega,
    /// Map `throttle` in [0, 1] to rotor speed
    Throttle,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorCommands {
    pub mode: MotorCommandMode,
    pub omega_rad_s: [f64; ROTOR_COUNT],
    pub throttle: [f64; ROTOR_COUNT],
}

/// Physical parameters of the quadcopter airframe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Mass in kg
    pub mass: f64,
    /// Principal moments of inertia (Ixx, Iyy, Izz) in kg·m²
    pub inertia: Vector3<f64>,
    /// Distance from centre of mass to each rotor hub in metres
    pub arm_length: f64,
    /// Linear translational drag in N/(m/s)
    pub drag_coefficient: f64,
    /// Rotor speed at full throttle in rad/s
    pub max_rotor_omega: f64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            mass: 1.5,
            inertia: Vector3::new(0.0347, 0.0458, 0.0977),
            arm_length: 0.225,
            drag_coefficient: 0.1,
            max_rotor_omega: 1000.0,
        }
    }
}

/// Rigid-body state of the physics variant (world frame z-up)
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub quaternion: UnitQuaternion<f64>,
    /// Body angular rate in rad/s
    pub angular_rate_rad_s: Vector3<f64>,
    pub euler: EulerAngles,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            quaternion: UnitQuaternion::identity(),
            angular_rate_rad_s: Vector3::zeros(),
            euler: EulerAngles::default(),
        }
    }
}

/// Counters for the silent-recovery policies
///
/// Every time a stage substitutes a safe value for a degenerate input it logs
/// the event and bumps the matching counter here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Diagnostics {
    /// Ticks skipped because of pause or a non-positive step
    pub skipped_ticks: u64,
    /// Quaternions reset to identity after a degenerate norm
    pub quaternion_resets: u64,
    /// Time constants raised to the minimum
    pub time_constant_clamps: u64,
    /// Estimator corrections skipped for a degenerate accelerometer reading
    pub accel_skips: u64,
    /// Bus current updates skipped for a non-positive bus voltage
    pub bus_voltage_faults: u64,
}

/// Shared mutable data bus of the simulation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateRecord {
    pub attitude: AttitudeState,
    pub timing: Timing,
    pub dynamics_config: DynamicsConfig,
    pub dynamics_state: DynamicsState,
    pub sensor: SensorFrame,
    pub estimator: EstimatorState,
    pub rotor_config: RotorConfig,
    pub rotor: RotorTelemetry,
    pub power: PowerState,
    pub control: ControlState,
    pub motor_commands: MotorCommands,
    pub vehicle_config: VehicleConfig,
    pub vehicle: VehicleState,
    pub diagnostics: Diagnostics,
}
