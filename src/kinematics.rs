//! Attitude kinematics: commanded body rate into the true attitude

use nalgebra::UnitQuaternion;

use crate::math::{QuaternionExt, Vector3Ext};
use crate::pipeline::Module;
use crate::state::StateRecord;

/// Integrates `attitude.angular_rate_deg_s` into `attitude.quaternion`
///
/// First-order integration of `q̇ = ½ q ⊗ [0, ω]` followed by
/// renormalisation. A degenerate result resets the attitude to identity.
#[derive(Debug, Clone, Default)]
pub struct AttitudeKinematics;

impl AttitudeKinematics {
    pub fn new() -> Self {
        Self
    }
}

impl Module for AttitudeKinematics {
    fn initialize(&mut self, state: &mut StateRecord) {
        let attitude = &mut state.attitude;
        if !attitude.quaternion.as_ref().norm().is_finite() {
            attitude.quaternion = UnitQuaternion::identity();
        }
        attitude.euler = attitude.quaternion.to_euler_zyx();
        tracing::debug!(euler = ?attitude.euler, "attitude kinematics initialised");
    }

    fn update(&mut self, dt: f64, state: &mut StateRecord) {
        if dt <= 0.0 {
            return;
        }

        let omega = state.attitude.angular_rate_deg_s.deg_to_rad();
        state.attitude.quaternion = match state.attitude.quaternion.integrate_body_rate(&omega, dt) {
            Some(quaternion) => quaternion,
            None => {
                tracing::warn!(?omega, dt, "degenerate attitude quaternion reset to identity");
                state.diagnostics.quaternion_resets += 1;
                UnitQuaternion::identity()
            }
        };
        state.attitude.euler = state.attitude.quaternion.to_euler_zyx();
    }
}
