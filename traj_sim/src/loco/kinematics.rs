//! Differential drive kinematics

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::{ChassisVelocity, DriveParams, WheelCommand, WheelDisplacement};
use crate::geometry::Twist;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematic model of a differential (skid steer) drive.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Kinematics {
    /// Track width including the scrub factor.
    ///
    /// Units: inches
    effective_track_width_in: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Kinematics {
    pub fn new(params: &DriveParams) -> Self {
        Self {
            effective_track_width_in: params.track_width_in * params.track_scrub_factor,
        }
    }

    /// Distance of each wheel side from the centre of rotation during a turn in place.
    ///
    /// Units: inches
    pub fn turn_radius_in(&self) -> f64 {
        0.5 * self.effective_track_width_in
    }

    /// Motion of the chassis caused by the given wheel displacements.
    pub fn forward(&self, displacement: &WheelDisplacement) -> Twist {
        Twist {
            dx_in: 0.5 * (displacement.left_in + displacement.right_in),
            dy_in: 0.0,
            dtheta_rad: (displacement.right_in - displacement.left_in)
                / self.effective_track_width_in,
        }
    }

    /// Wheel speeds needed to achieve the given chassis velocity.
    pub fn inverse(&self, velocity: &ChassisVelocity) -> WheelCommand {
        let delta_ips = velocity.angular_rads * self.turn_radius_in();

        WheelCommand {
            left_ips: velocity.linear_ips - delta_ips,
            right_ips: velocity.linear_ips + delta_ips,
        }
    }
}
