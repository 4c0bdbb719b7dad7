//! Fixed-order stepping of the simulation stages
//!
//! The stage order is part of the correctness contract: each stage reads
//! fields that earlier stages wrote in the same tick. In particular the
//! estimator must observe the sensor frame produced this tick, and the sensor
//! model must observe the attitude integrated this tick. The order is
//! therefore a constant ([`STAGE_ORDER`]) rather than a registration list.

use crate::config::SimConfig;
use crate::dynamics::TestDynamics;
use crate::estimator::ComplementaryEstimator;
use crate::kinematics::AttitudeKinematics;
use crate::rotor::RotorAerodynamics;
use crate::sensor::SensorModel;
use crate::state::StateRecord;
use crate::types::StageKind;

/// Two-operation capability shared by every stage
pub trait Module {
    /// Set the state fields owned by this stage to their initial values.
    fn initialize(&mut self, state: &mut StateRecord);

    /// Advance by `dt` seconds. A non-positive `dt` is a no-op.
    fn update(&mut self, dt: f64, state: &mut StateRecord);
}

/// Execution order of the stages within one tick
pub const STAGE_ORDER: [StageKind; 5] = [
    StageKind::AttitudeKinematics,
    StageKind::TestDynamics,
    StageKind::SensorModel,
    StageKind::ComplementaryEstimator,
    StageKind::RotorAerodynamics,
];

/// The ordered set of simulation stages
#[derive(Debug, Clone)]
pub struct Pipeline {
    kinematics: AttitudeKinematics,
    dynamics: TestDynamics,
    sensor: SensorModel,
    estimator: ComplementaryEstimator,
    rotor: RotorAerodynamics,
}

impl Pipeline {
    /// Create a pipeline with default settings
    pub fn new() -> Self {
        Self::with_config(&SimConfig::default())
    }

    pub fn with_config(config: &SimConfig) -> Self {
        Self {
            kinematics: AttitudeKinematics::new(),
            dynamics: TestDynamics::new(),
            sensor: SensorModel::with_settings(config.sensor),
            estimator: ComplementaryEstimator::with_settings(config.estimator),
            rotor: RotorAerodynamics::with_gravity(config.sensor.gravity),
        }
    }

    /// The order in which stages run
    pub fn stage_order(&self) -> &'static [StageKind] {
        &STAGE_ORDER
    }

    /// Initialise every stage, in stage order.
    pub fn initialize(&mut self, state: &mut StateRecord) {
        for kind in STAGE_ORDER {
            self.initialize_stage(kind, state);
        }
        state.timing.last_dt = 0.0;
    }

    /// Run one tick.
    ///
    /// `real_dt` is the wall-clock frame delta. When paused, or when the
    /// effective step is not positive, the tick is skipped and only
    /// `timing.last_dt` is reset. Otherwise simulation time advances by the
    /// effective step before the stages run, so every stage sees the
    /// end-of-step time. Returns whether the stages ran.
    pub fn run_tick(&mut self, real_dt: f64, state: &mut StateRecord) -> bool {
        if real_dt < 0.0 || real_dt.is_nan() {
            tracing::warn!(real_dt, "invalid frame delta; tick skipped");
        }

        let dt = state.control.effective_dt(real_dt);
        if dt <= 0.0 {
            state.timing.last_dt = 0.0;
            state.diagnostics.skipped_ticks += 1;
            return false;
        }

        tracing::trace!(dt, elapsed = state.timing.elapsed, "tick");
        state.timing.last_dt = dt;
        state.timing.elapsed += dt;

        for kind in STAGE_ORDER {
            self.update_stage(kind, dt, state);
        }
        true
    }

    pub fn estimator(&self) -> &ComplementaryEstimator {
        &self.estimator
    }

    pub fn estimator_mut(&mut self) -> &mut ComplementaryEstimator {
        &mut self.estimator
    }

    pub fn sensor(&self) -> &SensorModel {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut SensorModel {
        &mut self.sensor
    }

    fn initialize_stage(&mut self, kind: StageKind, state: &mut StateRecord) {
        match kind {
            StageKind::AttitudeKinematics => self.kinematics.initialize(state),
            StageKind::TestDynamics => self.dynamics.initialize(state),
            StageKind::SensorModel => self.sensor.initialize(state),
            StageKind::ComplementaryEstimator => self.estimator.initialize(state),
            StageKind::RotorAerodynamics => self.rotor.initialize(state),
        }
    }

    fn update_stage(&mut self, kind: StageKind, dt: f64, state: &mut StateRecord) {
        match kind {
            StageKind::AttitudeKinematics => self.kinematics.update(dt, state),
            StageKind::TestDynamics => self.dynamics.update(dt, state),
            StageKind::SensorModel => self.sensor.update(dt, state),
            StageKind::ComplementaryEstimator => self.estimator.update(dt, state),
            StageKind::RotorAerodynamics => self.rotor.update(dt, state),
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initialised() -> (Pipeline, StateRecord) {
        let mut pipeline = Pipeline::new();
        let mut state = StateRecord::default();
        pipeline.initialize(&mut state);
        (pipeline, state)
    }

    #[test]
    fn test_stage_order() {
        let pipeline = Pipeline::new();
        let order = pipeline.stage_order();
        let position = |kind| order.iter().position(|k| *k == kind).unwrap();

        assert_eq!(order.len(), 5);
        assert!(position(StageKind::AttitudeKinematics) < position(StageKind::SensorModel));
        assert!(position(StageKind::SensorModel) < position(StageKind::ComplementaryEstimator));
        assert_eq!(order[4], StageKind::RotorAerodynamics);
    }

    #[test]
    fn test_paused_tick_is_no_op() {
        let (mut pipeline, mut state) = initialised();
        state.attitude.angular_rate_deg_s.z = 45.0;
        assert!(pipeline.run_tick(0.01, &mut state));

        state.control.paused = true;
        let before = state.clone();
        assert!(!pipeline.run_tick(0.01, &mut state));

        assert_eq!(state.timing.last_dt, 0.0);
        assert_eq!(state.attitude, before.attitude);
        assert_eq!(state.estimator, before.estimator);
        assert_eq!(state.rotor, before.rotor);
        assert_eq!(state.power, before.power);
        assert_eq!(state.timing.elapsed, before.timing.elapsed);
        assert_eq!(state.diagnostics.skipped_ticks, 1);
    }

    #[test]
    fn test_zero_dt_tick_is_no_op() {
        let (mut pipeline, mut state) = initialised();
        state.attitude.angular_rate_deg_s.x = 10.0;
        let before = state.clone();

        assert!(!pipeline.run_tick(0.0, &mut state));

        assert_eq!(state.attitude, before.attitude);
        assert_eq!(state.sensor, before.sensor);
        assert_eq!(state.dynamics_state, before.dynamics_state);
        assert_eq!(state.timing.last_dt, 0.0);
    }

    #[test]
    fn test_time_scale_and_fixed_dt() {
        let (mut pipeline, mut state) = initialised();

        state.control.set_time_scale(2.0);
        pipeline.run_tick(0.01, &mut state);
        assert!((state.timing.last_dt - 0.02).abs() < 1e-15);

        state.control.use_fixed_dt = true;
        state.control.set_fixed_dt(0.005);
        pipeline.run_tick(0.1, &mut state);
        assert_eq!(state.timing.last_dt, 0.005);
        assert!((state.timing.elapsed - 0.025).abs() < 1e-15);
    }

    #[test]
    fn test_estimator_sees_same_tick_sensor_frame() {
        let (mut pipeline, mut state) = initialised();
        state.attitude.angular_rate_deg_s.x = 30.0;

        pipeline.run_tick(0.01, &mut state);

        // The sensor frame is computed from the attitude of this tick, and
        // the estimator, which integrates that gyro, tracks the truth.
        let expected_gyro = 30.0_f64.to_radians();
        assert!((state.sensor.gyro_rad_s.x - expected_gyro).abs() < 1e-12);
        let error = state.estimator.quaternion.angle_to(&state.attitude.quaternion);
        assert!(error < 1e-6, "estimator lagged the truth by {error} rad");
    }
}
