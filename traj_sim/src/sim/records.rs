//! Records logged by the simulation
//!
//! Every step produces one [`SimulationSample`], kept in memory by the engine. When archiving is
//! enabled each sample is also flattened into a [`PoseRecord`] and a [`PlannerRecord`] and
//! appended to the tracking and trajectory CSV files of the session.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use serde::Serialize;

use crate::{
    geometry::{Pose2, Twist},
    loco::{ChassisVelocity, WheelCommand},
};
use util::{
    archive::{ArchiveError, Archiver},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Archive of the true and estimated poses, relative to the session archive root.
pub const POSE_ARCHIVE_PATH: &str = "tracking.csv";

/// Archive of the targets and tracking errors, relative to the session archive root.
pub const PLANNER_ARCHIVE_PATH: &str = "trajectory.csv";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single step of the simulation.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct SimulationSample {
    /// Index of the move within the simulation run
    pub move_index: usize,

    /// Index of the step within the move
    pub step: usize,

    /// Time since the start of the move, at the end of this step
    pub t_s: f64,

    pub true_pose: Pose2,
    pub estimated_pose: Pose2,
    pub target_pose: Pose2,
    pub target_velocity: ChassisVelocity,

    /// Error from the estimated pose to the target, in the frame of the estimate
    pub error: Twist,

    pub command: WheelCommand,
}

/// Flat record of the poses at one step.
#[derive(Debug, Serialize)]
pub struct PoseRecord {
    pub move_index: usize,
    pub step: usize,
    pub t_s: f64,
    pub true_x_in: f64,
    pub true_y_in: f64,
    pub true_heading_rad: f64,
    pub est_x_in: f64,
    pub est_y_in: f64,
    pub est_heading_rad: f64,
}

/// Flat record of the target and tracking at one step.
#[derive(Debug, Serialize)]
pub struct PlannerRecord {
    pub move_index: usize,
    pub step: usize,
    pub t_s: f64,
    pub target_x_in: f64,
    pub target_y_in: f64,
    pub target_heading_rad: f64,
    pub target_linear_ips: f64,
    pub target_angular_rads: f64,
    pub along_error_in: f64,
    pub lat_error_in: f64,
    pub head_error_rad: f64,
    pub left_cmd_ips: f64,
    pub right_cmd_ips: f64,
}

/// The CSV archives of a simulation run.
pub struct SimArchive {
    poses: Archiver,
    planner: Archiver,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl From<&SimulationSample> for PoseRecord {
    fn from(s: &SimulationSample) -> Self {
        Self {
            move_index: s.move_index,
            step: s.step,
            t_s: s.t_s,
            true_x_in: s.true_pose.position_in[0],
            true_y_in: s.true_pose.position_in[1],
            true_heading_rad: s.true_pose.heading_rad,
            est_x_in: s.estimated_pose.position_in[0],
            est_y_in: s.estimated_pose.position_in[1],
            est_heading_rad: s.estimated_pose.heading_rad,
        }
    }
}

impl From<&SimulationSample> for PlannerRecord {
    fn from(s: &SimulationSample) -> Self {
        Self {
            move_index: s.move_index,
            step: s.step,
            t_s: s.t_s,
            target_x_in: s.target_pose.position_in[0],
            target_y_in: s.target_pose.position_in[1],
            target_heading_rad: s.target_pose.heading_rad,
            target_linear_ips: s.target_velocity.linear_ips,
            target_angular_rads: s.target_velocity.angular_rads,
            along_error_in: s.error.dx_in,
            lat_error_in: s.error.dy_in,
            head_error_rad: s.error.dtheta_rad,
            left_cmd_ips: s.command.left_ips,
            right_cmd_ips: s.command.right_ips,
        }
    }
}

impl SimArchive {
    /// Create the archives in the session's archive directory.
    pub fn new(session: &Session) -> Result<Self, ArchiveError> {
        Ok(Self::from_archivers(
            Archiver::from_path(session, POSE_ARCHIVE_PATH)?,
            Archiver::from_path(session, PLANNER_ARCHIVE_PATH)?,
        ))
    }

    /// Create the archives in an arbitrary directory.
    pub fn in_dir<P: AsRef<std::path::Path>>(dir: P) -> Result<Self, ArchiveError> {
        Ok(Self::from_archivers(
            Archiver::new(dir.as_ref().join(POSE_ARCHIVE_PATH))?,
            Archiver::new(dir.as_ref().join(PLANNER_ARCHIVE_PATH))?,
        ))
    }

    fn from_archivers(poses: Archiver, planner: Archiver) -> Self {
        debug!(
            "Archiving poses to {:?} and targets to {:?}",
            poses.path(),
            planner.path()
        );

        Self { poses, planner }
    }

    pub fn append(&mut self, sample: &SimulationSample) -> Result<(), ArchiveError> {
        self.poses.append(&PoseRecord::from(sample))?;
        self.planner.append(&PlannerRecord::from(sample))
    }

    pub fn flush(&mut self) -> Result<(), ArchiveError> {
        self.poses.flush()?;
        self.planner.flush()
    }

    /// Number of steps archived
    pub fn num_records(&self) -> usize {
        self.poses.num_records()
    }
}
