//! Trajectory control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace};
use nalgebra::Vector2;

use super::*;
use crate::{
    geometry::Pose2,
    loco::{ChassisVelocity, Kinematics, WheelCommand},
    trajectory::{DriveTrajectory, Setpoint},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Setpoints within this time of the end of the trajectory count as the final setpoint.
const END_TIME_TOLERANCE_S: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Feedforward plus PID feedback trajectory controller.
pub struct TrajCtrl {
    params: Params,

    kinematics: Kinematics,

    /// Fastest speed either side of the drive can be commanded to
    max_wheel_speed_ips: f64,

    /// Executing mode
    mode: TrajCtrlMode,

    /// Duration of the loaded trajectory
    duration_s: f64,

    /// Position held during a turn in place, captured on the first update of the turn
    hold_position_in: Option<Vector2<f64>>,

    report: StatusReport,

    /// Controller objects used to calculate the feedback
    controllers: TrajControllers,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The possible modes of execution of TrajCtrl.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TrajCtrlMode {
    Off,
    FollowLinear,
    TurnInPlace,
    Finished,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajCtrl {
    pub fn new(params: Params, kinematics: Kinematics, max_wheel_speed_ips: f64) -> Self {
        let controllers = TrajControllers::new(&params);

        Self {
            params,
            kinematics,
            max_wheel_speed_ips,
            mode: TrajCtrlMode::Off,
            duration_s: 0.0,
            hold_position_in: None,
            report: StatusReport::default(),
            controllers,
        }
    }

    pub fn mode(&self) -> TrajCtrlMode {
        self.mode
    }

    /// The errors and outputs of the latest update.
    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    /// The pose the robot should be in for the given setpoint.
    ///
    /// During a turn in place the position is held wherever the turn started.
    fn target_pose(&mut self, target: &Setpoint, pose: &Pose2) -> Pose2 {
        match target {
            Setpoint::Linear(s) => s.state.pose,
            Setpoint::Turn(s) => {
                let position_in = *self.hold_position_in.get_or_insert(pose.position_in);
                Pose2 {
                    position_in,
                    heading_rad: s.state.heading_rad,
                }
            }
        }
    }

    fn within_thresholds(&self) -> bool {
        let position_err_in = self.report.along_error_in.hypot(self.report.lat_error_in);

        position_err_in <= self.params.linear_threshold_in
            && self.report.head_error_rad.abs() <= self.params.angular_threshold_rad
    }
}

impl DriveController for TrajCtrl {
    fn load(&mut self, trajectory: &DriveTrajectory) -> Result<(), ControlError> {
        if trajectory.is_empty() {
            return Err(ControlError::EmptyTrajectory);
        }

        self.mode = match trajectory {
            DriveTrajectory::Linear(_) => TrajCtrlMode::FollowLinear,
            DriveTrajectory::Turn(_) => TrajCtrlMode::TurnInPlace,
        };
        self.duration_s = trajectory.duration_s();
        self.hold_position_in = None;
        self.report = StatusReport::default();
        self.controllers.reset();

        debug!(
            "TrajCtrl loaded {} trajectory of {:.3} s",
            trajectory.kind(),
            self.duration_s
        );

        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.mode == TrajCtrlMode::Finished
    }

    fn update(
        &mut self,
        dt_s: f64,
        target: &Setpoint,
        pose: &Pose2,
    ) -> Result<WheelCommand, ControlError> {
        if !(dt_s.is_finite() && dt_s > 0.0) {
            return Err(ControlError::InvalidStep(dt_s));
        }
        if !(pose.position_in[0].is_finite()
            && pose.position_in[1].is_finite()
            && pose.heading_rad.is_finite())
        {
            return Err(ControlError::NonFinitePose(*pose));
        }

        match self.mode {
            TrajCtrlMode::Off => return Err(ControlError::NoTrajectory),
            TrajCtrlMode::Finished => return Ok(WheelCommand::stop()),
            TrajCtrlMode::FollowLinear | TrajCtrlMode::TurnInPlace => (),
        }

        let target_pose = self.target_pose(target, pose);
        let error = pose.error_to(&target_pose);
        let feedforward = target.chassis_velocity();

        let correction = self.controllers.get_correction(
            dt_s,
            &error,
            &feedforward,
            &mut self.report,
            &self.params,
        );

        // The end is reached once the last setpoint is being tracked closely enough
        if target.t_s() >= self.duration_s - END_TIME_TOLERANCE_S && self.within_thresholds() {
            debug!(
                "TrajCtrl finished with position error {:.3} in, heading error {:.4} rad",
                error.dx_in.hypot(error.dy_in),
                error.dtheta_rad
            );
            self.mode = TrajCtrlMode::Finished;
            return Ok(WheelCommand::stop());
        }

        let demand = ChassisVelocity {
            linear_ips: feedforward.linear_ips + correction.linear_ips,
            angular_rads: feedforward.angular_rads + correction.angular_rads,
        };

        let raw = self.kinematics.inverse(&demand);
        let cmd = raw.saturate(self.max_wheel_speed_ips);
        self.report.saturated = cmd != raw;

        trace!(
            "TrajCtrl error ({:.3}, {:.3}, {:.4}), demand ({:.3}, {:.4})",
            error.dx_in,
            error.dy_in,
            error.dtheta_rad,
            demand.linear_ips,
            demand.angular_rads
        );

        Ok(cmd)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        geometry::{PoseWithCurvature, Rotation},
        loco::DriveParams,
        trajectory::{TimedState, Trajectory},
    };

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

    fn ctrl() -> TrajCtrl {
        let kinematics = Kinematics::new(&DriveParams {
            track_width_in: 26.0,
            track_scrub_factor: 1.0,
            max_wheel_speed_ips: 150.0,
            kv_v_per_ips: 0.05,
            ka_v_per_ips2: 0.005,
            ks_v: 0.5,
        });
        TrajCtrl::new(params(), kinematics, 150.0)
    }

    fn linear_state(x_in: f64, t_s: f64, velocity: f64) -> TimedState<PoseWithCurvature> {
        TimedState {
            state: PoseWithCurvature::new(Pose2::new(x_in, 0.0, 0.0), 0.0),
            t_s,
            distance: x_in,
            velocity,
            acceleration: 0.0,
        }
    }

    fn line() -> DriveTrajectory {
        DriveTrajectory::Linear(Trajectory::new(
            vec![linear_state(0.0, 0.0, 0.0), linear_state(10.0, 1.0, 0.0)],
            false,
        ))
    }

    #[test]
    fn test_update_before_load() {
        let mut c = ctrl();
        let sp = Setpoint::Linear(linear_state(0.0, 0.0, 0.0));

        assert_eq!(
            c.update(0.01, &sp, &Pose2::default()),
            Err(ControlError::NoTrajectory)
        );
    }

    #[test]
    fn test_feedforward_on_target() {
        let mut c = ctrl();
        c.load(&line()).unwrap();

        // On target, mid trajectory: pure feedforward
        let sp = Setpoint::Linear(linear_state(5.0, 0.5, 40.0));
        let cmd = c.update(0.01, &sp, &Pose2::new(5.0, 0.0, 0.0)).unwrap();

        assert!((cmd.left_ips - 40.0).abs() < 1e-9);
        assert!((cmd.right_ips - 40.0).abs() < 1e-9);
        assert!(!c.is_finished());
    }

    #[test]
    fn test_finishes_at_end_within_threshold() {
        let mut c = ctrl();
        c.load(&line()).unwrap();
        let last = Setpoint::Linear(linear_state(10.0, 1.0, 0.0));

        // Too far away to finish
        c.update(0.01, &last, &Pose2::new(7.0, 0.0, 0.0)).unwrap();
        assert!(!c.is_finished());

        let cmd = c.update(0.01, &last, &Pose2::new(9.5, 0.2, 0.01)).unwrap();
        assert!(c.is_finished());
        assert_eq!(cmd, WheelCommand::stop());
        assert_eq!(c.mode(), TrajCtrlMode::Finished);
    }

    #[test]
    fn test_turn_holds_position() {
        let mut c = ctrl();
        let turn = DriveTrajectory::Turn(Trajectory::new(
            vec![
                TimedState {
                    state: Rotation::new(0.0),
                    t_s: 0.0,
                    distance: 0.0,
                    velocity: 0.0,
                    acceleration: 1.0,
                },
                TimedState {
                    state: Rotation::new(0.5),
                    t_s: 1.0,
                    distance: 0.5,
                    velocity: 1.0,
                    acceleration: 1.0,
                },
            ],
            false,
        ));
        c.load(&turn).unwrap();

        let sp = Setpoint::Turn(TimedState {
            state: Rotation::new(0.2),
            t_s: 0.5,
            distance: 0.2,
            velocity: 1.0,
            acceleration: 1.0,
        });
        let cmd = c.update(0.01, &sp, &Pose2::new(30.0, 40.0, 0.2)).unwrap();

        // Spinning anticlockwise with no forward motion
        assert!((cmd.left_ips + cmd.right_ips).abs() < 1e-9);
        assert!(cmd.right_ips > 0.0);

        // Having drifted forward, the held position pulls the robot back
        let cmd = c.update(0.01, &sp, &Pose2::new(31.0, 40.0, 0.2)).unwrap();
        assert!(cmd.left_ips + cmd.right_ips < 0.0);
    }

    #[test]
    fn test_load_resets() {
        let mut c = ctrl();
        c.load(&line()).unwrap();
        let last = Setpoint::Linear(linear_state(10.0, 1.0, 0.0));
        c.update(0.01, &last, &Pose2::new(10.0, 0.0, 0.0)).unwrap();
        assert!(c.is_finished());

        c.load(&line()).unwrap();
        assert!(!c.is_finished());
        assert_eq!(c.mode(), TrajCtrlMode::FollowLinear);
    }
}
