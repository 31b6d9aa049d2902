//! # Locomotion module
//!
//! Differential drive kinematics, used to convert between chassis motion and wheel motion, and
//! the drive voltage model, used to bound what the drive train can achieve at a given voltage.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod kinematics;
mod model;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use kinematics::*;
pub use model::*;
pub use params::*;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Velocity of the robot body.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChassisVelocity {
    /// Forward speed, negative when driving backwards.
    ///
    /// Units: inches/second
    pub linear_ips: f64,

    /// Turn rate, anticlockwise positive.
    ///
    /// Units: radians/second
    pub angular_rads: f64,
}

/// A commanded wheel motion, the linear speed of each side of the drive at the wheel surface.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelCommand {
    pub left_ips: f64,
    pub right_ips: f64,
}

/// Distance travelled by each side's wheels over one step, as measured by the encoders.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelDisplacement {
    pub left_in: f64,
    pub right_in: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WheelCommand {
    pub fn stop() -> Self {
        Self::default()
    }

    /// Scale both sides down so that neither exceeds `max_ips`, preserving the ratio between them.
    pub fn saturate(&self, max_ips: f64) -> Self {
        let largest = self.left_ips.abs().max(self.right_ips.abs());

        if largest > max_ips && largest > 0.0 {
            let scale = max_ips / largest;
            Self {
                left_ips: self.left_ips * scale,
                right_ips: self.right_ips * scale,
            }
        } else {
            *self
        }
    }

    /// Displacement of the wheels after running this command for `dt_s`.
    pub fn integrate(&self, dt_s: f64) -> WheelDisplacement {
        WheelDisplacement {
            left_in: self.left_ips * dt_s,
            right_in: self.right_ips * dt_s,
        }
    }
}
