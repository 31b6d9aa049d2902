//! # Trajectory
//!
//! A trajectory is an immutable, time ordered sequence of [`TimedState`]s. For linear moves the
//! state is a [`PoseWithCurvature`] and distances/velocities are linear (inches, inches/second),
//! for turns in place the state is a [`Rotation`] and the same fields hold angular quantities
//! (radians, radians/second).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

use crate::{
    geometry::{Interpolate, Pose2, PoseWithCurvature, Rotation},
    loco::ChassisVelocity,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Segments shorter than this are interpolated by time rather than by distance.
const MIN_SEGMENT_LENGTH: f64 = 1e-12;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A state along with its timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimedState<S> {
    pub state: S,

    /// Time since the start of the trajectory.
    ///
    /// Units: seconds
    pub t_s: f64,

    /// Unsigned distance (or angle) travelled since the start of the trajectory.
    pub distance: f64,

    /// Velocity at this state, negative when reversing or turning clockwise.
    pub velocity: f64,

    /// Acceleration held from this state until the next one.
    pub acceleration: f64,
}

/// An immutable time parameterised sequence of states.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory<S> {
    states: Vec<TimedState<S>>,
    reversed: bool,
}

/// Tracks progress through a trajectory in time.
pub struct TrajectorySampler<'t, S> {
    trajectory: &'t Trajectory<S>,
    t_s: f64,
    index: usize,
}

/// Tracks progress through either kind of trajectory, giving setpoints.
pub enum DriveSampler<'t> {
    Linear(TrajectorySampler<'t, PoseWithCurvature>),
    Turn(TrajectorySampler<'t, Rotation>),
}

/// Either kind of trajectory the robot can drive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DriveTrajectory {
    Linear(Trajectory<PoseWithCurvature>),
    Turn(Trajectory<Rotation>),
}

/// The target state of the robot at a particular time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Setpoint {
    Linear(TimedState<PoseWithCurvature>),
    Turn(TimedState<Rotation>),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl<S: Interpolate + Clone> TimedState<S> {
    /// Interpolate towards `other` at time `t_s`, assuming the acceleration of `self` is held.
    pub fn interpolate(&self, other: &Self, t_s: f64) -> Self {
        let dt_s = (t_s - self.t_s).max(0.0);
        let velocity = self.velocity + self.acceleration * dt_s;
        let travelled = (self.velocity * dt_s + 0.5 * self.acceleration * dt_s.powi(2)).abs();

        let seg_length = other.distance - self.distance;
        let seg_time_s = other.t_s - self.t_s;

        let frac = if seg_length > MIN_SEGMENT_LENGTH {
            travelled / seg_length
        } else if seg_time_s > 0.0 {
            dt_s / seg_time_s
        } else {
            0.0
        }
        .max(0.0)
        .min(1.0);

        Self {
            state: self.state.interpolate(&other.state, frac),
            t_s,
            distance: self.distance + frac * seg_length,
            velocity,
            acceleration: self.acceleration,
        }
    }
}

impl<S> Trajectory<S> {
    pub(crate) fn new(states: Vec<TimedState<S>>, reversed: bool) -> Self {
        Self { states, reversed }
    }

    pub fn states(&self) -> &[TimedState<S>] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn first(&self) -> Option<&TimedState<S>> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&TimedState<S>> {
        self.states.last()
    }

    /// Total time taken to drive the trajectory.
    ///
    /// Units: seconds
    pub fn duration_s(&self) -> f64 {
        self.states.last().map(|s| s.t_s).unwrap_or(0.0)
    }
}

impl<S: Interpolate + Clone> Trajectory<S> {
    /// Get the state at the given time, clamped to the start and end of the trajectory.
    ///
    /// Returns `None` only if the trajectory is empty.
    pub fn sample(&self, t_s: f64) -> Option<TimedState<S>> {
        // Index of the first state after t
        let idx = self.states.partition_point(|s| s.t_s <= t_s);
        self.sample_from(idx, t_s)
    }

    pub fn sampler(&self) -> TrajectorySampler<'_, S> {
        TrajectorySampler {
            trajectory: self,
            t_s: 0.0,
            index: 0,
        }
    }

    fn sample_from(&self, idx: usize, t_s: f64) -> Option<TimedState<S>> {
        let first = self.states.first()?;

        if idx == 0 || t_s <= first.t_s {
            return Some(first.clone());
        }

        match self.states.get(idx) {
            Some(next) => Some(self.states[idx - 1].interpolate(next, t_s)),
            None => self.states.last().cloned(),
        }
    }
}

impl<'t, S: Interpolate + Clone> TrajectorySampler<'t, S> {
    /// Time of the current sample.
    pub fn progress_s(&self) -> f64 {
        self.t_s
    }

    /// True once the sampler has reached the end of the trajectory.
    pub fn is_done(&self) -> bool {
        self.t_s >= self.trajectory.duration_s()
    }

    /// The state at the current progress.
    pub fn sample(&self) -> Option<TimedState<S>> {
        self.trajectory.sample_from(self.index, self.t_s)
    }

    /// Advance progress by `dt_s`, returning the new state.
    pub fn advance(&mut self, dt_s: f64) -> Option<TimedState<S>> {
        self.t_s = (self.t_s + dt_s).min(self.trajectory.duration_s()).max(0.0);

        // Progress only moves forwards so the index search can resume where it left off
        let states = self.trajectory.states();
        while self.index < states.len() && states[self.index].t_s <= self.t_s {
            self.index += 1;
        }

        self.sample()
    }
}

impl DriveTrajectory {
    pub fn duration_s(&self) -> f64 {
        match self {
            DriveTrajectory::Linear(t) => t.duration_s(),
            DriveTrajectory::Turn(t) => t.duration_s(),
        }
    }

    pub fn num_states(&self) -> usize {
        match self {
            DriveTrajectory::Linear(t) => t.len(),
            DriveTrajectory::Turn(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            DriveTrajectory::Linear(t) => t.is_empty(),
            DriveTrajectory::Turn(t) => t.is_empty(),
        }
    }

    /// Short name of the kind of trajectory, used in logs and archives
    pub fn kind(&self) -> &'static str {
        match self {
            DriveTrajectory::Linear(_) => "linear",
            DriveTrajectory::Turn(_) => "turn",
        }
    }

    /// Pose the robot is expected to start from, linear trajectories only.
    pub fn initial_pose(&self) -> Option<Pose2> {
        match self {
            DriveTrajectory::Linear(t) => t.first().map(|s| s.state.pose),
            DriveTrajectory::Turn(_) => None,
        }
    }

    /// Heading the robot is expected to start from.
    pub fn initial_heading_rad(&self) -> Option<f64> {
        match self {
            DriveTrajectory::Linear(t) => t.first().map(|s| s.state.pose.heading_rad),
            DriveTrajectory::Turn(t) => t.first().map(|s| s.state.heading_rad),
        }
    }

    /// The target at time `t_s`.
    pub fn sample(&self, t_s: f64) -> Option<Setpoint> {
        match self {
            DriveTrajectory::Linear(t) => t.sample(t_s).map(Setpoint::Linear),
            DriveTrajectory::Turn(t) => t.sample(t_s).map(Setpoint::Turn),
        }
    }

    /// Start tracking progress from the beginning of the trajectory.
    pub fn sampler(&self) -> DriveSampler<'_> {
        match self {
            DriveTrajectory::Linear(t) => DriveSampler::Linear(t.sampler()),
            DriveTrajectory::Turn(t) => DriveSampler::Turn(t.sampler()),
        }
    }
}

impl<'t> DriveSampler<'t> {
    pub fn progress_s(&self) -> f64 {
        match self {
            DriveSampler::Linear(s) => s.progress_s(),
            DriveSampler::Turn(s) => s.progress_s(),
        }
    }

    /// The setpoint at the current progress.
    pub fn sample(&self) -> Option<Setpoint> {
        match self {
            DriveSampler::Linear(s) => s.sample().map(Setpoint::Linear),
            DriveSampler::Turn(s) => s.sample().map(Setpoint::Turn),
        }
    }

    /// Advance progress by `dt_s`, returning the new setpoint.
    pub fn advance(&mut self, dt_s: f64) -> Option<Setpoint> {
        match self {
            DriveSampler::Linear(s) => s.advance(dt_s).map(Setpoint::Linear),
            DriveSampler::Turn(s) => s.advance(dt_s).map(Setpoint::Turn),
        }
    }
}

impl Setpoint {
    pub fn t_s(&self) -> f64 {
        match self {
            Setpoint::Linear(s) => s.t_s,
            Setpoint::Turn(s) => s.t_s,
        }
    }

    pub fn heading_rad(&self) -> f64 {
        match self {
            Setpoint::Linear(s) => s.state.pose.heading_rad,
            Setpoint::Turn(s) => s.state.heading_rad,
        }
    }

    /// Velocity of the chassis demanded by this setpoint.
    ///
    /// A turn in place never has any linear velocity.
    pub fn chassis_velocity(&self) -> ChassisVelocity {
        match self {
            Setpoint::Linear(s) => ChassisVelocity {
                linear_ips: s.velocity,
                angular_rads: s.velocity * s.state.curvature_in,
            },
            Setpoint::Turn(s) => ChassisVelocity {
                linear_ips: 0.0,
                angular_rads: s.velocity,
            },
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
