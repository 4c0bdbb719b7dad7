//! First-order reference system used to validate the stepping machinery

use crate::math::TWO_PI;
use crate::pipeline::Module;
use crate::state::{DynamicsConfig, StateRecord};

/// Smallest time constant the integrator will divide by
pub const MIN_TIME_CONSTANT: f64 = 1e-3;

/// Euler-integrated `dx/dt = (-x + K·u) / τ`, `y = x`
///
/// Decoupled from the attitude. The input `u` is either
/// `dynamics_config.input_target` or `K·sin(2π·f·t)` with `t` the elapsed
/// simulation time.
///
/// # Example
/// ```
/// use attitude_rig::{Module, StateRecord, TestDynamics};
///
/// let mut dynamics = TestDynamics::new();
/// let mut state = StateRecord::default();
/// dynamics.initialize(&mut state);
///
/// for _ in 0..100 {
///     dynamics.update(0.01, &mut state);
/// }
/// assert!((state.dynamics_state.output - 0.634).abs() < 0.005);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TestDynamics;

impl TestDynamics {
    pub fn new() -> Self {
        Self
    }

    /// Input to the system at simulation time `t`
    pub fn input(config: &DynamicsConfig, t: f64) -> f64 {
        if config.use_sine {
            config.gain * (TWO_PI * config.sine_frequency_hz * t).sin()
        } else {
            config.input_target
        }
    }
}

impl Module for TestDynamics {
    fn initialize(&mut self, state: &mut StateRecord) {
        state.dynamics_state.internal_state = 0.0;
        state.dynamics_state.output = 0.0;
        state.dynamics_state.input = Self::input(&state.dynamics_config, state.timing.elapsed);
        tracing::debug!(config = ?state.dynamics_config, "test dynamics initialised");
    }

    fn update(&mut self, dt: f64, state: &mut StateRecord) {
        if dt <= 0.0 {
            return;
        }

        let config = state.dynamics_config;
        let tau = if config.time_constant < MIN_TIME_CONSTANT || config.time_constant.is_nan() {
            tracing::debug!(
                requested = config.time_constant,
                applied = MIN_TIME_CONSTANT,
                "time constant clamped"
            );
            state.diagnostics.time_constant_clamps += 1;
            MIN_TIME_CONSTANT
        } else {
            config.time_constant
        };

        let u = Self::input(&config, state.timing.elapsed);
        let x = state.dynamics_state.internal_state;
        let dx = (-x + config.gain * u) / tau;
        let x = x + dx * dt;

        state.dynamics_state.input = u;
        state.dynamics_state.internal_state = x;
        state.dynamics_state.output = x;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initialised(config: DynamicsConfig) -> (TestDynamics, StateRecord) {
        let mut dynamics = TestDynamics::new();
        let mut state = StateRecord {
            dynamics_config: config,
            ..Default::default()
        };
        dynamics.initialize(&mut state);
        (dynamics, state)
    }

    #[test]
    fn test_step_response_at_one_time_constant() {
        let (mut dynamics, mut state) = initialised(DynamicsConfig::default());

        for _ in 0..100 {
            dynamics.update(0.01, &mut state);
        }

        // Forward Euler gives 1 - 0.99^100 against the analytic 1 - e^-1
        let output = state.dynamics_state.output;
        assert!((output - (1.0 - 0.99_f64.powi(100))).abs() < 1e-12);
        assert!((output - 0.632).abs() < 0.005);
    }

    #[test]
    fn test_settles_to_gain_times_target() {
        let (mut dynamics, mut state) = initialised(DynamicsConfig {
            input_target: 2.0,
            gain: 1.5,
            time_constant: 0.2,
            ..Default::default()
        });

        for _ in 0..1000 {
            dynamics.update(0.01, &mut state);
        }

        assert!((state.dynamics_state.output - 3.0).abs() < 1e-9);
        assert_eq!(state.dynamics_state.input, 2.0);
    }

    #[test]
    fn test_tiny_time_constant_is_clamped() {
        let (mut dynamics, mut state) = initialised(DynamicsConfig {
            time_constant: 0.0,
            ..Default::default()
        });

        dynamics.update(1e-4, &mut state);

        // τ = 1e-3 and dt = 1e-4 moves a tenth of the way to the target
        assert!((state.dynamics_state.output - 0.1).abs() < 1e-12);
        assert!(state.dynamics_state.output.is_finite());
        assert_eq!(state.diagnostics.time_constant_clamps, 1);
    }

    #[test]
    fn test_sine_input_follows_elapsed_time() {
        let (mut dynamics, mut state) = initialised(DynamicsConfig {
            use_sine: true,
            sine_frequency_hz: 1.0,
            gain: 2.0,
            ..Default::default()
        });
        state.timing.elapsed = 0.25;

        dynamics.update(0.01, &mut state);

        assert!((state.dynamics_state.input - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_dt_is_no_op() {
        let (mut dynamics, mut state) = initialised(DynamicsConfig::default());
        dynamics.update(0.01, &mut state);
        let before = state.dynamics_state;

        dynamics.update(0.0, &mut state);

        assert_eq!(state.dynamics_state, before);
    }
}
