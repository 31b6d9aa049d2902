//! # Simulation module
//!
//! The simulated execution engine drives a trajectory through a [`DriveController`] and a
//! [`StateEstimator`] in fixed steps, in place of the real robot. Each step:
//!
//! 1. The trajectory is sampled at the current progress to get the target.
//! 2. The controller turns the target and the pose estimate into a wheel command.
//! 3. The command is integrated over the step to move the simulated "true" pose. A fraction of
//!    the wheel motion is lost to slip, but the encoders still measure the commanded motion.
//! 4. The encoder displacement, and the true heading as a gyro measurement, update the estimate.
//! 5. A [`SimulationSample`] is logged.
//!
//! A move ends when the controller reports it is finished, or is abandoned once the configured
//! number of steps has been run. An abandoned move still reports the time it took.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod records;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::SimParams;
pub use records::*;

use log::{debug, error, info};
use serde::Serialize;

use crate::{
    geometry::Pose2,
    loc::{EstimatorInput, StateEstimator},
    loco::{Kinematics, WheelDisplacement},
    traj_ctrl::{ControlError, DriveController},
    trajectory::{DriveTrajectory, Setpoint},
};
use util::archive::ArchiveError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulates driving trajectories with an injected controller and estimator.
pub struct DriveSimulation<C, E> {
    params: SimParams,
    kinematics: Kinematics,
    controller: C,
    estimator: E,

    state: SimState,

    /// The pose the robot is actually in
    true_pose: Pose2,

    /// Number of moves started so far
    num_moves: usize,

    samples: Vec<SimulationSample>,
    archive: Option<SimArchive>,
}

/// The outcome of driving one trajectory.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct DriveReport {
    /// Simulated time taken, the number of steps times the step length.
    pub elapsed_s: f64,

    pub steps: usize,

    /// True if the move was abandoned before the controller finished.
    pub stalled: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub enum SimState {
    NotStarted,
    Running,
    Completed,
}

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("The controller did not finish within {0} steps")]
    ExecutionStall(usize),

    #[error("Invalid simulation parameters: {0}")]
    InvalidParams(String),

    #[error("Attempted to drive a trajectory with no states")]
    EmptyTrajectory,

    #[error("Controller error: {0}")]
    ControlError(#[from] ControlError),

    #[error("Could not archive a simulation step: {0}")]
    ArchiveError(#[from] ArchiveError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C, E> DriveSimulation<C, E>
where
    C: DriveController,
    E: StateEstimator,
{
    pub fn new(
        params: SimParams,
        kinematics: Kinematics,
        controller: C,
        estimator: E,
    ) -> Result<Self, SimError> {
        if !(params.dt_s.is_finite() && params.dt_s > 0.0) {
            return Err(SimError::InvalidParams(format!(
                "dt_s must be positive, got {}",
                params.dt_s
            )));
        }
        if params.max_iterations == 0 {
            return Err(SimError::InvalidParams(
                "max_iterations must be at least 1".into(),
            ));
        }
        if !(0.0..1.0).contains(&params.wheel_slip) {
            return Err(SimError::InvalidParams(format!(
                "wheel_slip must be in [0, 1), got {}",
                params.wheel_slip
            )));
        }

        let true_pose = estimator.current_pose();

        Ok(Self {
            params,
            kinematics,
            controller,
            estimator,
            state: SimState::NotStarted,
            true_pose,
            num_moves: 0,
            samples: Vec::new(),
            archive: None,
        })
    }

    /// Write every step to the given archive.
    pub fn with_archive(mut self, archive: SimArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn true_pose(&self) -> Pose2 {
        self.true_pose
    }

    pub fn estimated_pose(&self) -> Pose2 {
        self.estimator.current_pose()
    }

    /// All samples logged so far, across every move.
    pub fn samples(&self) -> &[SimulationSample] {
        &self.samples
    }

    /// Drive a trajectory to completion.
    ///
    /// If `reset_pose` both the estimate and the true pose are first set to the start of the
    /// trajectory. A turn in place only has a heading, so the position is kept.
    ///
    /// A move abandoned after `max_iterations` steps is not an error, the returned report is
    /// marked as stalled instead.
    pub fn drive_trajectory(
        &mut self,
        trajectory: &DriveTrajectory,
        reset_pose: bool,
    ) -> Result<DriveReport, SimError> {
        if trajectory.is_empty() {
            return Err(SimError::EmptyTrajectory);
        }

        self.state = SimState::Running;
        let move_index = self.num_moves;
        self.num_moves += 1;

        if reset_pose {
            let start = match trajectory.initial_pose() {
                Some(p) => p,
                None => Pose2 {
                    position_in: self.true_pose.position_in,
                    heading_rad: trajectory
                        .initial_heading_rad()
                        .unwrap_or(self.true_pose.heading_rad),
                },
            };
            self.true_pose = start;
            self.estimator.reset(start);
        }

        self.controller.load(trajectory)?;

        info!(
            "Move {}: driving {} trajectory of {:.3} s ({} states)",
            move_index,
            trajectory.kind(),
            trajectory.duration_s(),
            trajectory.num_states()
        );

        let result = self.run(trajectory, move_index);

        self.state = SimState::Completed;

        if let Some(ref mut archive) = self.archive {
            archive.flush()?;
            debug!("{} steps archived so far", archive.num_records());
        }

        let report = match result {
            Ok(steps) => {
                let report = self.report(steps, false);
                info!(
                    "Move {}: finished in {:.3} s ({} steps)",
                    move_index, report.elapsed_s, report.steps
                );
                report
            }
            Err(SimError::ExecutionStall(steps)) => {
                let report = self.report(steps, true);
                error!(
                    "Move {}: abandoned after {} steps ({:.3} s) without the controller finishing",
                    move_index, report.steps, report.elapsed_s
                );
                report
            }
            Err(e) => return Err(e),
        };

        Ok(report)
    }

    /// Run steps until the controller finishes, returning the number of steps.
    fn run(&mut self, trajectory: &DriveTrajectory, move_index: usize) -> Result<usize, SimError> {
        let dt_s = self.params.dt_s;
        let mut steps = 0usize;
        let mut sampler = trajectory.sampler();

        while !self.controller.is_finished() {
            if steps >= self.params.max_iterations {
                return Err(SimError::ExecutionStall(steps));
            }

            let target = sampler.sample().ok_or(SimError::EmptyTrajectory)?;

            let estimate = self.estimator.current_pose();
            let command = self.controller.update(dt_s, &target, &estimate)?;

            // Slip loses some of the motion but the encoders count the wheel turning anyway
            let measured = command.integrate(dt_s);
            let slip_factor = 1.0 - self.params.wheel_slip;
            let actual = WheelDisplacement {
                left_in: measured.left_in * slip_factor,
                right_in: measured.right_in * slip_factor,
            };
            self.true_pose = self.true_pose.exp(&self.kinematics.forward(&actual));

            let estimated_pose = self.estimator.update(&EstimatorInput {
                displacement: measured,
                gyro_heading_rad: if self.params.gyro_enabled {
                    Some(self.true_pose.heading_rad)
                } else {
                    None
                },
            });

            let target_pose = setpoint_pose(&target, &estimated_pose);
            let sample = SimulationSample {
                move_index,
                step: steps,
                t_s: (steps + 1) as f64 * dt_s,
                true_pose: self.true_pose,
                estimated_pose,
                target_pose,
                target_velocity: target.chassis_velocity(),
                error: estimate.error_to(&target_pose),
                command,
            };

            if let Some(ref mut archive) = self.archive {
                archive.append(&sample)?;
            }
            self.samples.push(sample);

            sampler.advance(dt_s);
            steps += 1;
        }

        Ok(steps)
    }

    fn report(&self, steps: usize, stalled: bool) -> DriveReport {
        DriveReport {
            elapsed_s: steps as f64 * self.params.dt_s,
            steps,
            stalled,
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Pose described by a setpoint, a turn in place takes its position from `pose`.
fn setpoint_pose(target: &Setpoint, pose: &Pose2) -> Pose2 {
    match target {
        Setpoint::Linear(s) => s.state.pose,
        Setpoint::Turn(s) => Pose2 {
            position_in: pose.position_in,
            heading_rad: s.state.heading_rad,
        },
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        geometry::{Rotation, Waypoint},
        loc::OdometryEstimator,
        loco::{DifferentialDrive, DriveParams, WheelCommand},
        traj_ctrl::{Params, TrajCtrl},
        traj_gen::{GenLimits, TrajectoryGenerator},
    };

    /// A controller which drives forward forever.
    struct NeverFinished {
        loaded: bool,
    }

    impl DriveController for NeverFinished {
        fn load(&mut self, _trajectory: &DriveTrajectory) -> Result<(), ControlError> {
            self.loaded = true;
            Ok(())
        }

        fn is_finished(&self) -> bool {
            false
        }

        fn update(
            &mut self,
            _dt_s: f64,
            _target: &Setpoint,
            _pose: &Pose2,
        ) -> Result<WheelCommand, ControlError> {
            Ok(WheelCommand {
                left_ips: 10.0,
                right_ips: 10.0,
            })
        }
    }

    fn drive_params() -> DriveParams {
        DriveParams {
            track_width_in: 26.0,
            track_scrub_factor: 1.0,
            max_wheel_speed_ips: 170.0,
            kv_v_per_ips: 0.05,
            ka_v_per_ips2: 0.005,
            ks_v: 0.5,
        }
    }

    fn sim_params(wheel_slip: f64) -> SimParams {
        SimParams {
            dt_s: 0.01,
            max_iterations: 1000,
            wheel_slip,
            gyro_enabled: true,
            archive_enabled: false,
        }
    }

    fn ctrl_params() -> Params {
        Params {
            along_k_p: 3.0,
            along_k_i: 0.0,
            along_k_d: 0.0,
            lat_k_p: 0.05,
            lat_k_i: 0.0,
            lat_k_d: 0.0,
            head_k_p: 5.0,
            head_k_i: 0.0,
            head_k_d: 0.0,
            max_linear_correction_ips: 30.0,
            max_angular_correction_rads: 2.0,
            linear_threshold_in: 1.0,
            angular_threshold_rad: 0.02,
        }
    }

    fn simulation(wheel_slip: f64) -> DriveSimulation<TrajCtrl, OdometryEstimator> {
        let kinematics = Kinematics::new(&drive_params());
        DriveSimulation::new(
            sim_params(wheel_slip),
            kinematics,
            TrajCtrl::new(ctrl_params(), kinematics, 170.0),
            OdometryEstimator::new(kinematics),
        )
        .unwrap()
    }

    fn generator() -> TrajectoryGenerator {
        TrajectoryGenerator::new(DifferentialDrive::new(&drive_params()), 2.0, 0.05)
    }

    const LIMITS: GenLimits = GenLimits {
        max_vel_ips: 130.0,
        max_accel_ips2: 130.0,
        max_voltage_v: 9.0,
    };

    fn straight() -> DriveTrajectory {
        DriveTrajectory::Linear(
            generator()
                .generate_trajectory(
                    false,
                    &[Waypoint::new(10.0, 20.0, 0.0), Waypoint::new(130.0, 20.0, 0.0)],
                    &[],
                    LIMITS,
                )
                .unwrap(),
        )
    }

    #[test]
    fn test_stall_ends_move() {
        let kinematics = Kinematics::new(&drive_params());
        let mut sim = DriveSimulation::new(
            SimParams {
                max_iterations: 250,
                ..sim_params(0.0)
            },
            kinematics,
            NeverFinished { loaded: false },
            OdometryEstimator::new(kinematics),
        )
        .unwrap();
        assert_eq!(sim.state(), SimState::NotStarted);

        let report = sim.drive_trajectory(&straight(), true).unwrap();

        assert!(sim.controller.loaded);
        assert!(report.stalled);
        assert_eq!(report.steps, 250);
        assert!((report.elapsed_s - 2.5).abs() < 1e-9);
        assert_eq!(sim.samples().len(), 250);
        assert_eq!(sim.state(), SimState::Completed);

        // 10 in/s for 2.5 s from the start of the trajectory
        assert!((sim.true_pose().position_in[0] - 35.0).abs() < 1e-6);
    }

    #[test]
    fn test_drive_straight() {
        let mut sim = simulation(0.0);
        let traj = straight();
        let report = sim.drive_trajectory(&traj, true).unwrap();

        assert!(!report.stalled);
        assert!(report.elapsed_s >= traj.duration_s() - 0.01);
        assert!(report.elapsed_s < traj.duration_s() + 1.0);
        assert_eq!(report.steps, sim.samples().len());

        // Progress advances by one step each iteration
        for s in sim.samples().iter() {
            match traj.sample(s.step as f64 * 0.01) {
                Some(Setpoint::Linear(e)) => {
                    assert!(s.target_pose.distance(&e.state.pose) < 1e-6)
                }
                other => panic!("Unexpected setpoint {:?}", other),
            }
        }

        let end = sim.true_pose();
        assert!((end.position_in[0] - 130.0).abs() < 1.5);
        assert!((end.position_in[1] - 20.0).abs() < 0.5);
    }

    #[test]
    fn test_slip_is_seen_by_gyro_but_not_encoders() {
        let mut sim = simulation(0.1);
        let report = sim.drive_trajectory(&straight(), true).unwrap();
        assert!(!report.stalled);

        // The estimate believes the move was completed, the robot fell short
        let true_x = sim.true_pose().position_in[0];
        let est_x = sim.estimated_pose().position_in[0];
        assert!((est_x - 130.0).abs() < 1.5);
        assert!(true_x < est_x - 5.0);
        assert_eq!(sim.true_pose().heading_rad, sim.estimated_pose().heading_rad);
    }

    #[test]
    fn test_turn_keeps_position() {
        let mut sim = simulation(0.0);
        sim.drive_trajectory(&straight(), true).unwrap();
        let before = sim.true_pose();

        let turn = DriveTrajectory::Turn(
            generator()
                .generate_turn_in_place_trajectory(
                    Rotation::new(before.heading_rad),
                    Rotation::from_degrees(90.0),
                    &[],
                    0.0,
                    LIMITS,
                )
                .unwrap(),
        );
        let report = sim.drive_trajectory(&turn, false).unwrap();

        assert!(!report.stalled);
        assert!(sim.true_pose().distance(&before) < 0.5);
        assert!((sim.true_pose().heading_rad - 90f64.to_radians()).abs() < 0.05);

        // Samples are tagged with their move
        assert_eq!(sim.samples().first().unwrap().move_index, 0);
        assert_eq!(sim.samples().last().unwrap().move_index, 1);
    }

    #[test]
    fn test_archive_rows() {
        let dir = std::env::temp_dir().join(format!("traj_sim_archive_{}", std::process::id()));
        let archive = SimArchive::in_dir(&dir).unwrap();
        let mut sim = simulation(0.0).with_archive(archive);

        let report = sim.drive_trajectory(&straight(), true).unwrap();

        let tracking = std::fs::read_to_string(dir.join(POSE_ARCHIVE_PATH)).unwrap();
        let mut lines = tracking.lines();
        assert_eq!(
            lines.next().unwrap(),
            "move_index,step,t_s,true_x_in,true_y_in,true_heading_rad,est_x_in,est_y_in,est_heading_rad"
        );
        assert_eq!(lines.count(), report.steps);

        let planner = std::fs::read_to_string(dir.join(PLANNER_ARCHIVE_PATH)).unwrap();
        assert_eq!(planner.lines().count(), report.steps + 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_params() {
        let kinematics = Kinematics::new(&drive_params());
        let result = DriveSimulation::new(
            SimParams {
                max_iterations: 0,
                ..sim_params(0.0)
            },
            kinematics,
            NeverFinished { loaded: false },
            OdometryEstimator::new(kinematics),
        );

        assert!(matches!(result, Err(SimError::InvalidParams(_))));
    }
}
