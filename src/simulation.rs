//! Host-loop owner of the pipeline, state record and telemetry history

use nalgebra::Vector3;

use crate::config::{ConfigError, SimConfig};
use crate::history::TelemetryHistory;
use crate::pipeline::Pipeline;
use crate::state::{ControlState, DynamicsConfig, MotorCommands, StateRecord};
use crate::types::SensorSettings;

/// A running simulation
///
/// Owns exactly one [`Pipeline`], one [`StateRecord`] and one
/// [`TelemetryHistory`]. All mutation goes through `&mut self`, so a tick can
/// never overlap with another writer. UI-side code reads through
/// [`state`](Self::state) and [`history`](Self::history) and writes only the
/// host-owned fields exposed by the setters below.
///
/// # Example
/// ```
/// use attitude_rig::{SimConfig, Simulation};
///
/// let mut sim = Simulation::new(SimConfig::default()).unwrap();
/// sim.command_rate_deg_s([0.0, 0.0, 90.0].into());
///
/// for _ in 0..400 {
///     sim.step(0.01);
/// }
/// assert!((sim.state().timing.elapsed - 4.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    pipeline: Pipeline,
    state: StateRecord,
    history: TelemetryHistory,
}

impl Simulation {
    /// Validate `config` and initialise every stage from it
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut pipeline = Pipeline::with_config(&config);
        let mut state = config.initial_state();
        pipeline.initialize(&mut state);
        let history = TelemetryHistory::new(config.history);

        tracing::debug!(?config, "simulation created");
        Ok(Self {
            config,
            pipeline,
            state,
            history,
        })
    }

    /// Run one tick for a wall-clock frame delta of `real_dt` seconds.
    ///
    /// Samples telemetry history when the tick ran. Returns whether it ran.
    pub fn step(&mut self, real_dt: f64) -> bool {
        let ran = self.pipeline.run_tick(real_dt, &mut self.state);
        if ran {
            self.history.sample(&self.state);
        }
        ran
    }

    pub fn state(&self) -> &StateRecord {
        &self.state
    }

    pub fn history(&self) -> &TelemetryHistory {
        &self.history
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn control_mut(&mut self) -> &mut ControlState {
        &mut self.state.control
    }

    /// Command a body angular rate in deg/s
    pub fn command_rate_deg_s(&mut self, rate: Vector3<f64>) {
        self.state.attitude.angular_rate_deg_s = rate;
    }

    pub fn dynamics_config_mut(&mut self) -> &mut DynamicsConfig {
        &mut self.state.dynamics_config
    }

    pub fn motor_commands_mut(&mut self) -> &mut MotorCommands {
        &mut self.state.motor_commands
    }

    pub fn set_bus_voltage(&mut self, volts: f64) {
        self.state.power.bus_voltage = volts;
    }

    /// Change the constant gyro bias injected by the sensor model (rad/s)
    pub fn set_gyro_bias(&mut self, bias: Vector3<f64>) {
        let sensor = self.pipeline.sensor_mut();
        let settings = sensor.settings();
        sensor.set_settings(SensorSettings {
            gyro_bias: bias,
            ..settings
        });
    }

    /// Retune the estimator. Takes effect next tick.
    pub fn estimator_gains(&mut self, kp: f64, ki: f64) {
        self.pipeline.estimator_mut().set_gains(kp, ki);
    }

    /// Zero the accumulated energy counter
    pub fn reset_energy(&mut self) {
        self.state.power.energy_joule = 0.0;
    }

    /// Restart from the configured initial state.
    ///
    /// Re-initialises every stage, returns simulation time to zero and clears
    /// the history, which would otherwise hold samples from the future. Host
    /// controls, estimator gains and the sensor settings are kept.
    pub fn reset(&mut self) {
        let gains = self.pipeline.estimator().settings();
        let sensor = self.pipeline.sensor().settings();
        self.pipeline = Pipeline::with_config(&self.config);
        self.pipeline.estimator_mut().set_gains(gains.kp, gains.ki);
        self.pipeline.sensor_mut().set_settings(sensor);

        let control = self.state.control;
        self.state = self.config.initial_state();
        self.state.control = control;
        self.pipeline.initialize(&mut self.state);
        self.history.clear();

        tracing::debug!("simulation reset");
    }
}
