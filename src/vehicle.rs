//! Rigid-body quadcopter model driven by rotor forces
//!
//! The body frame is x forward, y left, z up; rotors sit on an X-frame at 45°
//! to the body axes and thrust along body +z.
//!
//! | Rotor | Position | Spin |
//! |-------|----------|------|
//! | 0 | (+d, +d) | +1 |
//! | 1 | (+d, -d) | -1 |
//! | 2 | (-d, -d) | +1 |
//! | 3 | (-d, +d) | -1 |
//!
//! with `d = arm_length / √2`.

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

use crate::math::QuaternionExt;
use crate::state::{ROTOR_COUNT, VehicleConfig, VehicleState};

/// Placement and spin direction of one rotor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotorGeometry {
    /// Hub position in body axes (m)
    pub position: Vector3<f64>,
    /// +1 or -1; sign of the reaction torque about body z
    pub direction: f64,
}

/// Rotor layout of an X-frame quadcopter with the given arm length
pub fn x_frame_layout(arm_length: f64) -> [RotorGeometry; ROTOR_COUNT] {
    let d = arm_length / 2.0_f64.sqrt();
    let rotor = |x: f64, y: f64, direction: f64| RotorGeometry {
        position: Vector3::new(x, y, 0.0),
        direction,
    };
    [
        rotor(d, d, 1.0),
        rotor(d, -d, -1.0),
        rotor(-d, -d, 1.0),
        rotor(-d, d, -1.0),
    ]
}

/// Rotor speed (rad/s) at which four rotors together carry the vehicle weight
pub fn hover_omega(mass: f64, gravity: f64, thrust_coefficient: f64) -> f64 {
    if thrust_coefficient <= 0.0 {
        return 0.0;
    }
    let thrust_per_rotor = mass * gravity / ROTOR_COUNT as f64;
    (thrust_per_rotor / thrust_coefficient).max(0.0).sqrt()
}

/// Map a throttle in [0, 1] to rotor speed, thrust being linear in throttle
pub fn throttle_to_omega(throttle: f64, max_omega: f64) -> f64 {
    if !throttle.is_finite() {
        return 0.0;
    }
    max_omega * throttle.clamp(0.0, 1.0).sqrt()
}

/// Net body-frame force and torque from the rotors
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Wrench {
    pub force: Vector3<f64>,
    pub torque: Vector3<f64>,
}

/// Newton-Euler rigid body with linear drag and gyroscopic coupling
#[derive(Debug, Clone)]
pub struct VehicleModel {
    config: VehicleConfig,
    gravity: f64,
    layout: [RotorGeometry; ROTOR_COUNT],
    inertia: Matrix3<f64>,
    inertia_inv: Matrix3<f64>,
}

impl VehicleModel {
    pub fn new(config: VehicleConfig, gravity: f64) -> Self {
        let inertia = Matrix3::from_diagonal(&config.inertia);
        // Zero moments are rejected by config validation; treat them as rigid here
        let inertia_inv = Matrix3::from_diagonal(&config.inertia.map(|i| if i > 0.0 { 1.0 / i } else { 0.0 }));
        Self {
            config,
            gravity,
            layout: x_frame_layout(config.arm_length),
            inertia,
            inertia_inv,
        }
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    pub fn layout(&self) -> &[RotorGeometry; ROTOR_COUNT] {
        &self.layout
    }

    /// Combine per-rotor thrust and drag torque into a body wrench
    pub fn wrench(&self, thrust: &[f64; ROTOR_COUNT], torque: &[f64; ROTOR_COUNT]) -> Wrench {
        self.layout
            .iter()
            .zip(thrust.iter().zip(torque))
            .fold(Wrench::default(), |acc, (rotor, (&t, &q))| {
                let force = Vector3::new(0.0, 0.0, t);
                Wrench {
                    force: acc.force + force,
                    torque: acc.torque + rotor.position.cross(&force) + Vector3::new(0.0, 0.0, rotor.direction * q),
                }
            })
    }

    /// Linear acceleration in the world frame
    pub fn linear_acceleration(&self, state: &VehicleState, wrench: &Wrench) -> Vector3<f64> {
        let mass = self.config.mass;
        state.quaternion.transform_vector(&wrench.force) / mass + Vector3::new(0.0, 0.0, -self.gravity)
            - state.velocity * (self.config.drag_coefficient / mass)
    }

    /// Angular acceleration in body axes, `I⁻¹(τ - ω × Iω)`
    pub fn angular_acceleration(&self, state: &VehicleState, wrench: &Wrench) -> Vector3<f64> {
        let omega = state.angular_rate_rad_s;
        self.inertia_inv * (wrench.torque - omega.cross(&(self.inertia * omega)))
    }

    /// Advance the body by one explicit Euler step.
    ///
    /// Returns false when the attitude went degenerate and was reset to
    /// identity.
    pub fn step(&self, state: &mut VehicleState, wrench: &Wrench, dt: f64) -> bool {
        let acceleration = self.linear_acceleration(state, wrench);
        let angular_acceleration = self.angular_acceleration(state, wrench);

        state.position += state.velocity * dt;
        state.velocity += acceleration * dt;

        let integrated = state.quaternion.integrate_body_rate(&state.angular_rate_rad_s, dt);
        let healthy = integrated.is_some();
        state.quaternion = integrated.unwrap_or_else(UnitQuaternion::identity);
        if !healthy {
            state.angular_rate_rad_s = Vector3::zeros();
        } else {
            state.angular_rate_rad_s += angular_acceleration * dt;
        }
        state.euler = state.quaternion.to_euler_zyx();
        healthy
    }
}
