//! Rotor aerodynamics, bus power and the optional rigid-body coupling

use core::f64::consts::FRAC_PI_2;

use crate::math::TWO_PI;
use crate::pipeline::Module;
use crate::state::{MotorCommandMode, ROTOR_COUNT, RotorModel, StateRecord, VehicleState};
use crate::types::SensorSettings;
use crate::vehicle::{VehicleModel, hover_omega, throttle_to_omega};

const RPM_TO_RAD_S: f64 = TWO_PI / 60.0;

/// Thrust, drag torque and shaft power of one rotor at `omega` rad/s
///
/// `thrust = kT·ω²`, `torque = kQ·ω²`, `power = torque·ω`.
pub fn rotor_loads(omega: f64, thrust_coefficient: f64, torque_coefficient: f64) -> (f64, f64, f64) {
    let omega_sq = omega * omega;
    let thrust = thrust_coefficient * omega_sq;
    let torque = torque_coefficient * omega_sq;
    (thrust, torque, torque * omega)
}

/// Converts rotor speed into thrust, torque and power telemetry
///
/// Rotor speeds come from the variant selected by `rotor_config.model`:
/// - [`RotorModel::Synthetic`]: a base RPM plus a slow sinusoid, each rotor a
///   quarter period behind the previous one
/// - [`RotorModel::Physics`]: the motor commands, with the resulting forces
///   and torques driving the rigid body in `state.vehicle`
///
/// The rigid-body attitude stays in `state.vehicle`. The sensor model and
/// estimator keep following the commanded attitude in `state.attitude`, so
/// the estimate does not track the vehicle.
///
/// Both variants aggregate total thrust and power, derive the bus current
/// from the bus voltage, and accumulate drawn energy. Energy is never
/// decremented here.
#[derive(Debug, Clone)]
pub struct RotorAerodynamics {
    /// Phase of the synthetic RPM generator (rad)
    phase: f64,
    gravity: f64,
    vehicle: Option<VehicleModel>,
}

impl RotorAerodynamics {
    pub fn new() -> Self {
        Self::with_gravity(SensorSettings::default().gravity)
    }

    /// Create a rotor stage whose physics variant uses `gravity` (m/s²)
    pub fn with_gravity(gravity: f64) -> Self {
        Self {
            phase: 0.0,
            gravity,
            vehicle: None,
        }
    }

    /// Current phase of the synthetic RPM generator
    pub fn phase(&self) -> f64 {
        self.phase
    }

    fn synthetic_omega(&mut self, dt: f64, state: &StateRecord) -> [f64; ROTOR_COUNT] {
        let config = &state.rotor_config;
        self.phase += config.phase_rate * dt;
        core::array::from_fn(|i| {
            let rpm = config.base_rpm + config.rpm_amplitude * (self.phase + i as f64 * FRAC_PI_2).sin();
            rpm * RPM_TO_RAD_S
        })
    }

    fn commanded_omega(state: &StateRecord) -> [f64; ROTOR_COUNT] {
        let commands = &state.motor_commands;
        let max_omega = state.vehicle_config.max_rotor_omega;
        match commands.mode {
            MotorCommandMode::Omega => commands
                .omega_rad_s
                .map(|omega| if omega.is_finite() { omega.clamp(0.0, max_omega) } else { 0.0 }),
            MotorCommandMode::Throttle => commands.throttle.map(|throttle| throttle_to_omega(throttle, max_omega)),
        }
    }

    fn publish(omega: &[f64; ROTOR_COUNT], dt: f64, state: &mut StateRecord) {
        let config = state.rotor_config;
        let telemetry = &mut state.rotor;

        for (i, &w) in omega.iter().enumerate() {
            let (thrust, torque, power) = rotor_loads(w, config.thrust_coefficient, config.torque_coefficient);
            telemetry.rpm[i] = w / RPM_TO_RAD_S;
            telemetry.thrust_newton[i] = thrust;
            telemetry.torque_newton_metre[i] = torque;
            telemetry.power_watt[i] = power;
        }
        telemetry.total_thrust_newton = telemetry.thrust_newton.iter().sum();
        telemetry.total_power_watt = telemetry.power_watt.iter().sum();

        let total_power = telemetry.total_power_watt;
        let power = &mut state.power;
        if power.bus_voltage > 0.0 {
            power.bus_current = total_power / power.bus_voltage;
        } else {
            tracing::warn!(bus_voltage = power.bus_voltage, "non-positive bus voltage; bus current not computed");
            power.bus_current = 0.0;
            state.diagnostics.bus_voltage_faults += 1;
        }
        power.energy_joule += total_power * dt;
    }

    /// Advance the rigid body, building it on first use when the physics
    /// variant was selected after `initialize`
    fn step_vehicle(&mut self, dt: f64, state: &mut StateRecord) {
        let gravity = self.gravity;
        let vehicle = self.vehicle.get_or_insert_with(|| {
            tracing::debug!("physics variant selected at runtime; building vehicle model");
            VehicleModel::new(state.vehicle_config, gravity)
        });
        let wrench = vehicle.wrench(&state.rotor.thrust_newton, &state.rotor.torque_newton_metre);
        if !vehicle.step(&mut state.vehicle, &wrench, dt) {
            tracing::warn!("degenerate vehicle quaternion reset to identity");
            state.diagnostics.quaternion_resets += 1;
        }
    }
}

impl Default for RotorAerodynamics {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for RotorAerodynamics {
    fn initialize(&mut self, state: &mut StateRecord) {
        self.phase = 0.0;
        state.rotor = Default::default();
        state.vehicle = VehicleState::default();

        match state.rotor_config.model {
            RotorModel::Synthetic => {
                self.vehicle = None;
            }
            RotorModel::Physics => {
                let config = state.vehicle_config;
                let omega = hover_omega(config.mass, self.gravity, state.rotor_config.thrust_coefficient);
                let throttle = if config.max_rotor_omega > 0.0 {
                    (omega / config.max_rotor_omega).powi(2).min(1.0)
                } else {
                    0.0
                };
                state.motor_commands.omega_rad_s = [omega; ROTOR_COUNT];
                state.motor_commands.throttle = [throttle; ROTOR_COUNT];
                self.vehicle = Some(VehicleModel::new(config, self.gravity));
            }
        }

        tracing::debug!(
            model = ?state.rotor_config.model,
            gravity = self.gravity,
            "rotor aerodynamics initialised"
        );
    }

    fn update(&mut self, dt: f64, state: &mut StateRecord) {
        if dt <= 0.0 {
            return;
        }

        let omega = match state.rotor_config.model {
            RotorModel::Synthetic => self.synthetic_omega(dt, state),
            RotorModel::Physics => Self::commanded_omega(state),
        };
        Self::publish(&omega, dt, state);

        if state.rotor_config.model == RotorModel::Physics {
            self.step_vehicle(dt, state);
        }
    }
}
