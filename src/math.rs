//! Mathematical utilities and nalgebra extensions for the attitude rig

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

use crate::types::EulerAngles;

/// Mathematical constants
pub const DEG_TO_RAD: f64 = core::f64::consts::PI / 180.0;
pub const RAD_TO_DEG: f64 = 180.0 / core::f64::consts::PI;
pub const TWO_PI: f64 = 2.0 * core::f64::consts::PI;

/// Quaternion norms at or below this are treated as degenerate.
pub const DEGENERATE_NORM: f64 = 1e-12;

/// Wrap an angle into (-π, π].
pub fn wrap_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    let pi = core::f64::consts::PI;
    let mut wrapped = angle % TWO_PI;
    if wrapped > pi {
        wrapped -= TWO_PI;
    } else if wrapped <= -pi {
        wrapped += TWO_PI;
    }
    wrapped
}

/// World-to-body direction cosine matrix for ZYX (yaw-pitch-roll) Euler angles.
///
/// The result is the transpose of the body-to-world rotation produced by
/// [`QuaternionExt::from_euler_zyx`] for the same angles.
pub fn dcm_from_euler(euler: &EulerAngles) -> Matrix3<f64> {
    let (sr, cr) = euler.roll.sin_cos();
    let (sp, cp) = euler.pitch.sin_cos();
    let (sy, cy) = euler.yaw.sin_cos();

    Matrix3::new(
        cp * cy,
        cp * sy,
        -sp,
        sr * sp * cy - cr * sy,
        sr * sp * sy + cr * cy,
        sr * cp,
        cr * sp * cy + sr * sy,
        cr * sp * sy - sr * cy,
        cr * cp,
    )
}

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Normalize the vector, returning zero vector if magnitude is zero
    fn safe_normalize(&self) -> Vector3<f64>;

    /// Convert degrees to radians
    fn deg_to_rad(&self) -> Vector3<f64>;

    /// Convert radians to degrees
    fn rad_to_deg(&self) -> Vector3<f64>;
}

impl Vector3Ext for Vector3<f64> {
    fn safe_normalize(&self) -> Vector3<f64> {
        let mag = self.norm();
        if mag > 0.0 {
            *self / mag
        } else {
            Vector3::zeros()
        }
    }

    fn deg_to_rad(&self) -> Vector3<f64> {
        *self * DEG_TO_RAD
    }

    fn rad_to_deg(&self) -> Vector3<f64> {
        *self * RAD_TO_DEG
    }
}

/// Extension trait for UnitQuaternion operations
pub trait QuaternionExt: Sized {
    /// ZYX Euler angles in radians, each wrapped to (-π, π].
    ///
    /// The pitch `asin` argument is clamped to [-1, 1] so the gimbal-lock
    /// boundary yields ±π/2 instead of NaN.
    fn to_euler_zyx(&self) -> EulerAngles;

    /// Create a body-to-world quaternion from ZYX Euler angles in radians
    fn from_euler_zyx(euler: &EulerAngles) -> Self;

    /// World-to-body direction cosine matrix
    fn world_to_body(&self) -> Matrix3<f64>;

    /// First-order integration of a body angular rate (rad/s).
    ///
    /// Applies `q += ½ q ⊗ [0, ω] · dt` and renormalises. Returns `None` when
    /// the integrated quaternion has (near) zero or non-finite norm.
    fn integrate_body_rate(&self, omega: &Vector3<f64>, dt: f64) -> Option<Self>;
}

impl QuaternionExt for UnitQuaternion<f64> {
    fn to_euler_zyx(&self) -> EulerAngles {
        let q = self.as_ref();
        let (w, x, y, z) = (q.w, q.i, q.j, q.k);

        let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
        let sin_pitch = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0);
        let pitch = sin_pitch.asin();
        let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));

        EulerAngles {
            roll: wrap_angle(roll),
            pitch: wrap_angle(pitch),
            yaw: wrap_angle(yaw),
        }
    }

    fn from_euler_zyx(euler: &EulerAngles) -> Self {
        UnitQuaternion::from_euler_angles(euler.roll, euler.pitch, euler.yaw)
    }

    fn world_to_body(&self) -> Matrix3<f64> {
        self.to_rotation_matrix().matrix().transpose()
    }

    fn integrate_body_rate(&self, omega: &Vector3<f64>, dt: f64) -> Option<Self> {
        let rate_quat = Quaternion::from_parts(0.0, *omega);

        // Quaternion derivative: dq/dt = 0.5 * q * ω
        let derivative = (self.as_ref() * rate_quat) * 0.5;
        let integrated = self.as_ref() + derivative * dt;

        let norm = integrated.norm();
        if !norm.is_finite() || norm <= DEGENERATE_NORM {
            return None;
        }
        Some(UnitQuaternion::new_unchecked(integrated / norm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-12);
        assert!((wrap_angle(-PI) - PI).abs() < 1e-12);
        assert!((wrap_angle(PI) - PI).abs() < 1e-12);
        assert!((wrap_angle(-3.0 * FRAC_PI_2) - FRAC_PI_2).abs() < 1e-12);
        assert!(wrap_angle(TWO_PI).abs() < 1e-12);
        assert!((wrap_angle(0.25) - 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_vector_extensions() {
        let v = Vector3::new(3.0, 4.0, 0.0);
        let normalized = v.safe_normalize();
        assert!((normalized.norm() - 1.0).abs() < 1e-12);
        assert_eq!(Vector3::<f64>::zeros().safe_normalize(), Vector3::zeros());

        let deg = Vector3::new(180.0, 90.0, -45.0);
        let back = deg.deg_to_rad().rad_to_deg();
        assert!((back - deg).norm() < 1e-12);
    }

    #[test]
    fn test_quaternion_euler_conversion() {
        let euler = EulerAngles::from_degrees(30.0, 45.0, 60.0);
        let quat = UnitQuaternion::from_euler_zyx(&euler);
        let recovered = quat.to_euler_zyx();

        assert!((recovered.roll - euler.roll).abs() < 1e-12);
        assert!((recovered.pitch - euler.pitch).abs() < 1e-12);
        assert!((recovered.yaw - euler.yaw).abs() < 1e-12);
    }

    #[test]
    fn test_gimbal_lock_pitch_is_finite() {
        let euler = EulerAngles::new(0.0, FRAC_PI_2, 0.0);
        let quat = UnitQuaternion::from_euler_zyx(&euler);
        let recovered = quat.to_euler_zyx();

        assert!(recovered.roll.is_finite());
        assert!(recovered.yaw.is_finite());
        assert!((recovered.pitch - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_dcm_matches_quaternion_transpose() {
        let euler = EulerAngles::from_degrees(-20.0, 35.0, 170.0);
        let quat = UnitQuaternion::from_euler_zyx(&euler);
        let difference = dcm_from_euler(&euler) - quat.world_to_body();
        assert!(difference.norm() < 1e-12);
    }

    #[test]
    fn test_integration_preserves_norm() {
        let q = UnitQuaternion::identity();
        let omega = Vector3::new(1.0, -2.0, 0.5);
        let integrated = q.integrate_body_rate(&omega, 0.01).unwrap();
        assert!((integrated.as_ref().norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_integration_about_z_advances_yaw() {
        let q = UnitQuaternion::identity();
        let omega = Vector3::new(0.0, 0.0, 0.1);
        let integrated = q.integrate_body_rate(&omega, 0.01).unwrap();
        let euler = integrated.to_euler_zyx();
        assert!((euler.yaw - 0.001).abs() < 1e-9);
        assert!(euler.roll.abs() < 1e-12);
        assert!(euler.pitch.abs() < 1e-12);
    }

    #[test]
    fn test_integration_rejects_non_finite() {
        let q = UnitQuaternion::identity();
        let omega = Vector3::new(f64::NAN, 0.0, 0.0);
        assert!(q.integrate_body_rate(&omega, 0.01).is_none());
    }
}
