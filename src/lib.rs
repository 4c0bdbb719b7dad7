//! Attitude Rig - a real-time attitude simulator and complementary-filter estimator
//!
//! This library steps a rigid-body attitude simulation through a fixed
//! sequence of stages that share one state record: it integrates a commanded
//! body rate into the true attitude, synthesises gyroscope and accelerometer
//! readings, fuses them back into an independent attitude estimate with gyro
//! bias learning, runs a first-order reference system, and computes rotor
//! thrust, torque and power telemetry.
//!
//! # Features
//!
//! - Quaternion kinematics with renormalisation and gimbal-safe ZYX Euler angles
//! - Mahony-style complementary estimator with proportional-integral correction
//! - Time-windowed, rate-limited telemetry history
//! - Synthetic or physics-based rotor model, the latter driving a 6-DOF rigid body
//! - RON configuration with validation
//! - Silent recovery from degenerate inputs, counted in [`Diagnostics`]
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use attitude_rig::{SimConfig, Simulation};
//!
//! let mut sim = Simulation::new(SimConfig::default()).unwrap();
//!
//! // Roll at 30 deg/s
//! sim.command_rate_deg_s(Vector3::new(30.0, 0.0, 0.0));
//!
//! // One second at 100 Hz
//! for _ in 0..100 {
//!     sim.step(0.01);
//! }
//!
//! let truth = sim.state().attitude.euler.to_degrees();
//! let estimate = sim.state().estimator.euler.to_degrees();
//! assert!((truth.x - 30.0).abs() < 0.01);
//! assert!((estimate.x - truth.x).abs() < 0.01);
//! ```
//!
//! # Stepping without the facade
//!
//! [`Pipeline`] and [`StateRecord`] can be driven directly when the host
//! wants to own the state itself:
//!
//! ```rust
//! use attitude_rig::{Pipeline, StateRecord};
//!
//! let mut pipeline = Pipeline::new();
//! let mut state = StateRecord::default();
//! pipeline.initialize(&mut state);
//!
//! state.control.use_fixed_dt = true;
//! assert!(pipeline.run_tick(0.016, &mut state));
//! assert_eq!(state.timing.last_dt, 0.01);
//! ```

pub mod config;
pub mod dynamics;
pub mod estimator;
pub mod history;
pub mod kinematics;
mod math;
pub mod pipeline;
pub mod rotor;
pub mod sensor;
pub mod simulation;
pub mod state;
mod types;
pub mod vehicle;

// Re-export all public types and functions
pub use config::{ConfigError, SimConfig};
pub use dynamics::TestDynamics;
pub use estimator::ComplementaryEstimator;
pub use history::{
    AttitudeSample, DynamicsSample, HistoryBuffer, PowerSample, RotorSample, SensorSample, TelemetryHistory,
    Timestamped,
};
pub use kinematics::AttitudeKinematics;
pub use math::{DEG_TO_RAD, QuaternionExt, RAD_TO_DEG, Vector3Ext, dcm_from_euler, wrap_angle};
pub use pipeline::{Module, Pipeline, STAGE_ORDER};
pub use rotor::RotorAerodynamics;
pub use sensor::SensorModel;
pub use simulation::Simulation;
pub use state::*;
pub use types::*;
