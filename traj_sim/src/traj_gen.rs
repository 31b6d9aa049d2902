//! # Trajectory generator
//!
//! Turns waypoints or heading targets into time parameterised trajectories. A linear move fits a
//! [`Path`] through its waypoints and profiles it against the caller's constraints, the fixed
//! velocity and acceleration caps, and the voltage limit of the drive. A turn in place profiles
//! the angle swept between two headings in the same way, using the angular equivalents of the
//! caps.
//!
//! Generation is deterministic, the same inputs always give the same trajectory.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;

use crate::{
    geometry::{PoseWithCurvature, Rotation, Waypoint},
    loco::DifferentialDrive,
    path::{Path, PathError, MIN_SEGMENTS},
    timing::{
        time_parameterize, Constraint, ConstraintSet, DriveDynamicsConstraint, ProfileEnds,
        TimingError,
    },
    trajectory::Trajectory,
};
use util::maths::get_ang_dist_2pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Generates trajectories for a particular drive train.
#[derive(Debug, Clone)]
pub struct TrajectoryGenerator {
    drive: DifferentialDrive,

    /// Largest arc length between the states of a linear trajectory.
    max_dx_in: f64,

    /// Largest angle between the states of a turn in place.
    max_dtheta_rad: f64,
}

/// Limits applied to every state of a generated trajectory.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GenLimits {
    /// Chassis speed cap, inches/second.
    pub max_vel_ips: f64,

    /// Chassis acceleration cap, inches/second^2.
    pub max_accel_ips2: f64,

    /// Largest voltage either side of the drive may use.
    pub max_voltage_v: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GenError {
    #[error("Invalid generation input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("No feasible profile: {0}")]
    InfeasibleConstraint(#[from] TimingError),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InputError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Heading {0} is not finite")]
    NonFiniteHeading(f64),

    #[error("Limit {0} must be finite, got {1}")]
    NonFiniteLimit(&'static str, f64),

    #[error("The turn resolution must be positive and finite, got {0}")]
    InvalidResolution(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajectoryGenerator {
    pub fn new(drive: DifferentialDrive, max_dx_in: f64, max_dtheta_rad: f64) -> Self {
        Self {
            drive,
            max_dx_in,
            max_dtheta_rad,
        }
    }

    pub fn drive(&self) -> &DifferentialDrive {
        &self.drive
    }

    /// Generate a trajectory through the given waypoints, starting and ending at rest.
    ///
    /// If `reversed` the robot drives backwards along the path, the states keep the heading of
    /// the robot body while velocity and acceleration are negative.
    pub fn generate_trajectory(
        &self,
        reversed: bool,
        waypoints: &[Waypoint],
        constraints: &[Constraint],
        limits: GenLimits,
    ) -> Result<Trajectory<PoseWithCurvature>, GenError> {
        limits.validate()?;

        let path =
            Path::from_waypoints(waypoints, reversed, self.max_dx_in).map_err(InputError::from)?;

        let dynamics = DriveDynamicsConstraint::new(&self.drive, limits.max_voltage_v);
        let set = ConstraintSet::<PoseWithCurvature>::new(limits.max_vel_ips, limits.max_accel_ips2)
            .with_all(constraints)
            .with(&dynamics);

        let states = time_parameterize(
            path.states(),
            path.spacing_in(),
            &set,
            ProfileEnds {
                start_velocity: 0.0,
                end_velocity: 0.0,
                reversed,
            },
        )?;

        let traj = Trajectory::new(states, reversed);

        debug!(
            "Generated {}linear trajectory through {} waypoints against {} constraints: {} states, \
             {:.3} in, {:.3} s",
            if reversed { "reversed " } else { "" },
            waypoints.len(),
            set.num_constraints(),
            traj.len(),
            path.length_in(),
            traj.duration_s()
        );

        Ok(traj)
    }

    /// Generate a turn in place from `initial` to `target`, taking the shorter direction.
    ///
    /// The linear caps are converted to angular ones using the turn radius of the drive, so that
    /// the wheels never exceed the linear caps. The turn ends at rest and starts at the given
    /// angular velocity (radians/second), if that velocity is in the direction of the turn.
    ///
    /// Equal headings are not an error, they give a single state at rest with zero duration.
    pub fn generate_turn_in_place_trajectory(
        &self,
        initial: Rotation,
        target: Rotation,
        constraints: &[Constraint],
        initial_velocity_rads: f64,
        limits: GenLimits,
    ) -> Result<Trajectory<Rotation>, GenError> {
        limits.validate()?;

        for heading in [initial.heading_rad, target.heading_rad].iter() {
            if !heading.is_finite() {
                return Err(InputError::NonFiniteHeading(*heading).into());
            }
        }
        if !initial_velocity_rads.is_finite() {
            return Err(InputError::NonFiniteLimit("initial_velocity", initial_velocity_rads).into());
        }
        if !(self.max_dtheta_rad.is_finite() && self.max_dtheta_rad > 0.0) {
            return Err(InputError::InvalidResolution(self.max_dtheta_rad).into());
        }

        let delta_rad = get_ang_dist_2pi(initial.heading_rad, target.heading_rad);
        let sense = if delta_rad < 0.0 { -1.0 } else { 1.0 };

        // Unwrapped headings, monotonic towards the target
        let num_segments = if delta_rad == 0.0 {
            0
        } else {
            ((delta_rad.abs() / self.max_dtheta_rad).ceil() as usize).max(MIN_SEGMENTS)
        };
        let step_rad = if num_segments > 0 {
            delta_rad.abs() / num_segments as f64
        } else {
            0.0
        };
        let states: Vec<Rotation> = (0..=num_segments)
            .map(|i| {
                if i == num_segments {
                    Rotation::new(initial.heading_rad + delta_rad)
                } else {
                    Rotation::new(initial.heading_rad + sense * step_rad * i as f64)
                }
            })
            .collect();

        let r_in = self.drive.kinematics.turn_radius_in();
        let dynamics = DriveDynamicsConstraint::new(&self.drive, limits.max_voltage_v);
        let set = ConstraintSet::<Rotation>::new(
            limits.max_vel_ips / r_in,
            limits.max_accel_ips2 / r_in,
        )
        .with_all(constraints)
        .with(&dynamics);

        let timed = time_parameterize(
            &states,
            step_rad,
            &set,
            ProfileEnds {
                start_velocity: (sense * initial_velocity_rads).max(0.0),
                end_velocity: 0.0,
                reversed: sense < 0.0,
            },
        )?;

        let traj = Trajectory::new(timed, false);

        debug!(
            "Generated turn in place from {:.2} deg to {:.2} deg: {} states, {:.3} s",
            initial.heading_rad.to_degrees(),
            (initial.heading_rad + delta_rad).to_degrees(),
            traj.len(),
            traj.duration_s()
        );

        Ok(traj)
    }
}

impl GenLimits {
    fn validate(&self) -> Result<(), InputError> {
        let named = [
            ("max_vel_ips", self.max_vel_ips),
            ("max_accel_ips2", self.max_accel_ips2),
            ("max_voltage_v", self.max_voltage_v),
        ];

        match named.iter().find(|(_, v)| !v.is_finite()) {
            Some((name, v)) => Err(InputError::NonFiniteLimit(*name, *v)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
