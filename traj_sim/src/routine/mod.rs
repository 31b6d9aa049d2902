//! # Routine module
//!
//! A routine is a static, ordered plan of moves. The [`RoutineRunner`] works through the plan one
//! move at a time:
//!
//! - `Generate` - The move's trajectory is built by the [`TrajectoryGenerator`].
//! - `Drive` - The trajectory is driven to completion by the [`DriveSimulation`].
//!
//! The simulated time each move takes is added to a running total. A move which stalls still
//! counts the time it took and the routine carries on with the next move, but a move which can't
//! be generated aborts the routine.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod autos;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    geometry::{Rotation, Waypoint},
    loc::StateEstimator,
    sim::{DriveSimulation, SimError},
    timing::Constraint,
    traj_ctrl::DriveController,
    traj_gen::{GenError, GenLimits, TrajectoryGenerator},
    trajectory::DriveTrajectory,
};
use util::{params::LoadError, session::Session};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Directory within the session in which generated trajectories are saved.
pub const TRAJECTORY_SAVE_DIR: &str = "trajectories";

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A named plan of moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub name: String,

    pub moves: Vec<Move>,
}

/// Generates and drives the moves of a routine.
pub struct RoutineRunner {
    generator: TrajectoryGenerator,

    /// Extra constraints applied to every move
    constraints: Vec<Constraint>,

    limits: GenLimits,
}

/// Outcome of one move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveReport {
    pub index: usize,

    /// `"linear"` or `"turn"`
    pub kind: &'static str,

    pub elapsed_s: f64,
    pub steps: usize,
    pub stalled: bool,
}

/// Outcome of a whole routine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutineReport {
    pub name: String,

    /// Sum of the elapsed time of every move, in order.
    pub total_elapsed_s: f64,

    pub moves: Vec<MoveReport>,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// A single step of a routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Move {
    /// Drive along a path through the waypoints, backwards if `reversed`.
    LinearMove {
        waypoints: Vec<Waypoint>,

        #[serde(default)]
        reversed: bool,
    },

    /// Turn on the spot, taking the shorter direction.
    RotateInPlace {
        from_heading_deg: f64,
        to_heading_deg: f64,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RoutineError {
    #[error("Routine {0:?} has no moves")]
    NoMoves(String),

    #[error("Could not generate move {0}: {1}")]
    GenError(usize, GenError),

    #[error("Could not drive move {0}: {1}")]
    SimError(usize, SimError),

    #[error("Could not load the routine: {0}")]
    LoadError(#[from] LoadError),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Routine {
    /// Load a routine from a file relative to the params directory.
    pub fn load(path: &str) -> Result<Self, RoutineError> {
        Ok(util::params::load(path)?)
    }

    /// Load a routine from an explicit path.
    pub fn load_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, RoutineError> {
        Ok(util::params::load_path(path)?)
    }
}

impl Move {
    pub fn kind(&self) -> &'static str {
        match self {
            Move::LinearMove { .. } => "linear",
            Move::RotateInPlace { .. } => "turn",
        }
    }
}

impl RoutineRunner {
    pub fn new(
        generator: TrajectoryGenerator,
        constraints: Vec<Constraint>,
        limits: GenLimits,
    ) -> Self {
        Self {
            generator,
            constraints,
            limits,
        }
    }

    /// Build the trajectory of a single move.
    pub fn generate(&self, mv: &Move) -> Result<DriveTrajectory, GenError> {
        match mv {
            Move::LinearMove {
                waypoints,
                reversed,
            } => self
                .generator
                .generate_trajectory(*reversed, waypoints, &self.constraints, self.limits)
                .map(DriveTrajectory::Linear),
            Move::RotateInPlace {
                from_heading_deg,
                to_heading_deg,
            } => self
                .generator
                .generate_turn_in_place_trajectory(
                    Rotation::from_degrees(*from_heading_deg),
                    Rotation::from_degrees(*to_heading_deg),
                    &self.constraints,
                    0.0,
                    self.limits,
                )
                .map(DriveTrajectory::Turn),
        }
    }

    /// Run every move of the routine in order.
    ///
    /// Only the first move resets the pose of the simulation, later moves start wherever the
    /// previous one ended. If a session is given each generated trajectory is saved into it.
    pub fn run<C, E>(
        &self,
        routine: &Routine,
        sim: &mut DriveSimulation<C, E>,
        session: Option<&Session>,
    ) -> Result<RoutineReport, RoutineError>
    where
        C: DriveController,
        E: StateEstimator,
    {
        if routine.moves.is_empty() {
            return Err(RoutineError::NoMoves(routine.name.clone()));
        }

        info!(
            "Running routine {:?} ({} moves)",
            routine.name,
            routine.moves.len()
        );

        let mut report = RoutineReport {
            name: routine.name.clone(),
            total_elapsed_s: 0.0,
            moves: Vec::with_capacity(routine.moves.len()),
        };

        for (index, mv) in routine.moves.iter().enumerate() {
            let trajectory = self
                .generate(mv)
                .map_err(|e| RoutineError::GenError(index, e))?;

            if let Some(s) = session {
                s.save(
                    format!("{}/move_{:02}_{}.json", TRAJECTORY_SAVE_DIR, index, mv.kind()),
                    trajectory.clone(),
                );
            }

            let drive = sim
                .drive_trajectory(&trajectory, index == 0)
                .map_err(|e| RoutineError::SimError(index, e))?;

            if drive.stalled {
                warn!("Move {} stalled, continuing with the next move", index);
            }

            report.total_elapsed_s += drive.elapsed_s;
            report.moves.push(MoveReport {
                index,
                kind: mv.kind(),
                elapsed_s: drive.elapsed_s,
                steps: drive.steps,
                stalled: drive.stalled,
            });

            info!(
                "Move {} ({}) took {:.3} s, {:.3} s so far",
                index,
                mv.kind(),
                drive.elapsed_s,
                report.total_elapsed_s
            );
        }

        info!(
            "Routine {:?} complete in {:.3} s",
            routine.name, report.total_elapsed_s
        );

        Ok(report)
    }
}

impl RoutineReport {
    pub fn num_stalled(&self) -> usize {
        self.moves.iter().filter(|m| m.stalled).count()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
