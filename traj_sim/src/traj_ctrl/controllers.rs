//! # Trajectory controllers module
//!
//! This module provides the PID controllers used for TrajCtrl, and the combination of their
//! outputs into a chassis velocity correction.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::Params;
use crate::{geometry::Twist, loco::ChassisVelocity};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this feedforward speed the robot is treated as stationary, so lateral error can't be
/// steered out.
const STATIONARY_IPS: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

/// The trajectory controllers
#[derive(Debug, Serialize, Clone)]
pub struct TrajControllers {
    /// Along-track error controller
    along_ctrl: PidController,

    /// Lateral error controller
    lat_ctrl: PidController,

    /// Heading error controller
    head_ctrl: PidController,
}

/// Errors and controller outputs from the latest update.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    pub along_error_in: f64,
    pub lat_error_in: f64,
    pub head_error_rad: f64,

    /// The velocity given by the setpoint
    pub feedforward: ChassisVelocity,

    /// The feedback added to the feedforward velocity
    pub correction: ChassisVelocity,

    /// True if the wheel command had to be scaled down to the wheel speed limit
    pub saturated: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            integral: 0f64,
            prev_error: None,
        }
    }

    /// Get the value of the controller for the given error after `dt_s` seconds.
    ///
    /// On the first call there is no previous error, so no derivative is applied.
    pub fn get(&mut self, dt_s: f64, error: f64) -> f64 {
        self.integral += error * dt_s;

        let deriv = match self.prev_error {
            Some(e) if dt_s > 0f64 => (error - e) / dt_s,
            _ => 0f64,
        };

        let out = self.k_p * error + self.k_i * self.integral + self.k_d * deriv;

        self.prev_error = Some(error);

        out
    }

    /// Clear the integral and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error = None;
    }
}

impl TrajControllers {
    /// Create a new instance of the controllers from the parameters
    pub fn new(params: &Params) -> Self {
        Self {
            along_ctrl: PidController::new(params.along_k_p, params.along_k_i, params.along_k_d),
            lat_ctrl: PidController::new(params.lat_k_p, params.lat_k_i, params.lat_k_d),
            head_ctrl: PidController::new(params.head_k_p, params.head_k_i, params.head_k_d),
        }
    }

    pub fn reset(&mut self) {
        self.along_ctrl.reset();
        self.lat_ctrl.reset();
        self.head_ctrl.reset();
    }

    /// Get the correction to the feedforward velocity for the given robot frame error.
    ///
    /// Lateral error is steered out in the sense of travel, so it has no effect when the
    /// feedforward velocity is zero.
    pub fn get_correction(
        &mut self,
        dt_s: f64,
        error: &Twist,
        feedforward: &ChassisVelocity,
        report: &mut StatusReport,
        params: &Params,
    ) -> ChassisVelocity {
        report.along_error_in = error.dx_in;
        report.lat_error_in = error.dy_in;
        report.head_error_rad = error.dtheta_rad;
        report.feedforward = *feedforward;

        let direction = if feedforward.linear_ips.abs() < STATIONARY_IPS {
            0f64
        } else {
            feedforward.linear_ips.signum()
        };

        let linear_ips = self.along_ctrl.get(dt_s, error.dx_in);
        let angular_rads =
            direction * self.lat_ctrl.get(dt_s, error.dy_in) + self.head_ctrl.get(dt_s, error.dtheta_rad);

        let correction = ChassisVelocity {
            linear_ips: clamp_abs(linear_ips, params.max_linear_correction_ips),
            angular_rads: clamp_abs(angular_rads, params.max_angular_correction_rads),
        };
        report.correction = correction;

        correction
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn clamp_abs(value: f64, limit: f64) -> f64 {
    value.max(-limit.abs()).min(limit.abs())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn params() -> Params {
        Params {
            along_k_p: 2.0,
            along_k_i: 0.0,
            along_k_d: 0.0,
            lat_k_p: 0.05,
            lat_k_i: 0.0,
            lat_k_d: 0.0,
            head_k_p: 4.0,
            head_k_i: 0.0,
            head_k_d: 0.0,
            max_linear_correction_ips: 30.0,
            max_angular_correction_rads: 2.0,
            linear_threshold_in: 1.0,
            angular_threshold_rad: 0.02,
        }
    }

    #[test]
    fn test_pid() {
        let mut pid = PidController::new(1.0, 0.5, 0.1);

        // First call has no derivative
        assert!((pid.get(0.1, 2.0) - (2.0 + 0.5 * 0.2)).abs() < 1e-12);

        // Error falls by 1 over 0.1 s
        let out = pid.get(0.1, 1.0);
        assert!((out - (1.0 + 0.5 * 0.3 - 0.1 * 10.0)).abs() < 1e-12);

        pid.reset();
        assert!((pid.get(0.1, 0.0)).abs() < 1e-12);
    }

    #[test]
    fn test_lateral_follows_direction() {
        let p = params();
        let error = Twist {
            dx_in: 0.0,
            dy_in: 4.0,
            dtheta_rad: 0.0,
        };
        let mut report = StatusReport::default();

        // Target to the left, driving forwards: turn left
        let fwd = ChassisVelocity {
            linear_ips: 50.0,
            angular_rads: 0.0,
        };
        let mut ctrls = TrajControllers::new(&p);
        assert!(ctrls.get_correction(0.01, &error, &fwd, &mut report, &p).angular_rads > 0.0);

        // Driving backwards: turn right
        let rev = ChassisVelocity {
            linear_ips: -50.0,
            angular_rads: 0.0,
        };
        let mut ctrls = TrajControllers::new(&p);
        assert!(ctrls.get_correction(0.01, &error, &rev, &mut report, &p).angular_rads < 0.0);

        // Stationary: no steering
        let mut ctrls = TrajControllers::new(&p);
        let c = ctrls.get_correction(0.01, &error, &ChassisVelocity::default(), &mut report, &p);
        assert_eq!(c.angular_rads, 0.0);
    }

    #[test]
    fn test_correction_is_clamped() {
        let p = params();
        let mut ctrls = TrajControllers::new(&p);
        let mut report = StatusReport::default();

        let c = ctrls.get_correction(
            0.01,
            &Twist {
                dx_in: 100.0,
                dy_in: 0.0,
                dtheta_rad: -3.0,
            },
            &ChassisVelocity::default(),
            &mut report,
            &p,
        );

        assert_eq!(c.linear_ips, 30.0);
        assert_eq!(c.angular_rads, -2.0);
        assert_eq!(report.along_error_in, 100.0);
    }
}
