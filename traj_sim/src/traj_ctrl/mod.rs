//! # Trajectory control module
//!
//! Trajectory control is responsible for keeping the robot on the target trajectory. The
//! simulation engine samples the trajectory at the current progress and passes the resulting
//! [`Setpoint`] to the controller along with the current pose estimate. The controller returns
//! the wheel speeds to command for the next step.
//!
//! The provided controller, [`TrajCtrl`], combines the feedforward chassis velocity of the
//! setpoint with feedback from three PID controllers. The error between the robot and the target
//! is expressed in the robot's frame:
//!
//! - The along-track error is how far the target is ahead of the robot, and corrects the linear
//!   velocity.
//! - The lateral error is how far the target is to the left of the robot, and corrects the turn
//!   rate in the sense which steers the robot back onto the path.
//! - The heading error is the angle the robot must turn through to face the same way as the
//!   target, and also corrects the turn rate.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod controllers;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use controllers::*;
pub use params::Params;
pub use state::*;

use crate::{
    geometry::Pose2,
    loco::WheelCommand,
    trajectory::{DriveTrajectory, Setpoint},
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A controller which drives the robot along a trajectory.
pub trait DriveController {
    /// Prepare to follow a new trajectory, discarding any previous one.
    fn load(&mut self, trajectory: &DriveTrajectory) -> Result<(), ControlError>;

    /// True once the loaded trajectory has been completed.
    fn is_finished(&self) -> bool;

    /// Calculate the wheel command for one step of `dt_s` seconds towards `target`.
    fn update(
        &mut self,
        dt_s: f64,
        target: &Setpoint,
        pose: &Pose2,
    ) -> Result<WheelCommand, ControlError>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during trajectory control.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ControlError {
    /// Attempted to control the robot before a trajectory was loaded.
    #[error("No trajectory has been loaded")]
    NoTrajectory,

    /// The loaded trajectory has no states.
    #[error("Attempted to load an empty trajectory")]
    EmptyTrajectory,

    /// The pose passed to the controller is not usable.
    #[error("The pose estimate is not finite: {0:?}")]
    NonFinitePose(Pose2),

    /// The step length must be positive for the controllers to integrate.
    #[error("Invalid step length {0} s")]
    InvalidStep(f64),
}
