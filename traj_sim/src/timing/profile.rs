//! Velocity profile
//!
//! The profile is found in two passes over uniformly spaced states:
//!
//! 1. Forward, starting from the start velocity, each state is reached with the greatest
//!    acceleration allowed at the previous state, capped by the velocity bound at the state.
//! 2. Backward, starting from the end velocity, each state is lowered so that the robot can still
//!    brake into the following state with the deceleration allowed there.
//!
//! Time is then integrated assuming constant acceleration between states, so that a segment of
//! length `ds` travelled from `v0` to `v1` takes `2 ds / (v0 + v1)`.
//!
//! The passes work on speed magnitudes. Constraints are evaluated with the signed velocity the
//! robot will actually have, so a reversed profile sees the acceleration range in its own sense.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{ConstraintSet, MinMaxAccel};
use crate::trajectory::TimedState;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Sums of segment speeds below this mean the robot never leaves the segment.
const MIN_SEGMENT_SPEED: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Boundary conditions of a profile.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProfileEnds {
    /// Speed magnitude at the first state.
    pub start_velocity: f64,

    /// Speed magnitude at the last state.
    pub end_velocity: f64,

    /// If true the robot moves in the negative sense, velocity and acceleration are negated.
    pub reversed: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TimingError {
    #[error("The velocity bound at state {0} is {1}, a feasible profile needs a positive bound")]
    NonPositiveVelocity(usize, f64),

    #[error("The acceleration range at state {index} is empty ({min} > {max})")]
    EmptyAccelRange { index: usize, min: f64, max: f64 },

    #[error("The profile cannot move from state {0} to state {1}, both have zero velocity")]
    NoProgress(usize, usize),

    #[error("The state spacing must be positive and finite, got {0}")]
    InvalidSpacing(f64),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Assign velocities, accelerations and times to states spaced `ds` apart.
///
/// The first state has distance and time zero, distances grow by `ds` per state.
pub fn time_parameterize<S: Clone>(
    states: &[S],
    ds: f64,
    constraints: &ConstraintSet<S>,
    ends: ProfileEnds,
) -> Result<Vec<TimedState<S>>, TimingError> {
    if states.len() <= 1 {
        return Ok(states
            .iter()
            .map(|s| TimedState {
                state: s.clone(),
                t_s: 0.0,
                distance: 0.0,
                velocity: 0.0,
                acceleration: 0.0,
            })
            .collect());
    }

    if !(ds.is_finite() && ds > 0.0) {
        return Err(TimingError::InvalidSpacing(ds));
    }

    let sign = if ends.reversed { -1.0 } else { 1.0 };

    // Velocity bounds at every state
    let mut caps = Vec::with_capacity(states.len());
    for (i, s) in states.iter().enumerate() {
        let cap = constraints.max_velocity(s);
        // NaN fails this comparison too
        if !(cap > 0.0) {
            return Err(TimingError::NonPositiveVelocity(i, cap));
        }
        caps.push(cap);
    }

    let accel_at = |i: usize, speed: f64| -> Result<MinMaxAccel, TimingError> {
        let range = constraints.accel_range(&states[i], sign * speed);

        // Express the range in the sense of travel
        let range = if ends.reversed {
            MinMaxAccel::new(-range.max_accel, -range.min_accel)
        } else {
            range
        };

        if range.is_valid() {
            Ok(range)
        } else {
            Err(TimingError::EmptyAccelRange {
                index: i,
                min: range.min_accel,
                max: range.max_accel,
            })
        }
    };

    // Forward pass
    let last = states.len() - 1;
    let mut speeds = caps.clone();
    speeds[0] = ends.start_velocity.abs().min(caps[0]);
    for i in 1..=last {
        let prev = speeds[i - 1];
        let accel = accel_at(i - 1, prev)?.max_accel;
        let reachable = (prev.powi(2) + 2.0 * accel * ds).max(0.0).sqrt();
        speeds[i] = caps[i].min(reachable);
    }

    // Backward pass
    speeds[last] = speeds[last].min(ends.end_velocity.abs());
    for i in (0..last).rev() {
        let next = speeds[i + 1];
        let decel = -accel_at(i + 1, next)?.min_accel;
        let reachable = (next.powi(2) + 2.0 * decel * ds).max(0.0).sqrt();
        speeds[i] = speeds[i].min(reachable);
    }

    // Integrate time
    let mut timed = Vec::with_capacity(states.len());
    let mut t_s = 0.0;
    let mut acceleration = 0.0;
    for i in 0..=last {
        // The last state holds the acceleration of the final segment
        if i < last {
            let (v0, v1) = (speeds[i], speeds[i + 1]);
            if v0 + v1 < MIN_SEGMENT_SPEED {
                return Err(TimingError::NoProgress(i, i + 1));
            }
            acceleration = (v1.powi(2) - v0.powi(2)) / (2.0 * ds);
        }

        timed.push(TimedState {
            state: states[i].clone(),
            t_s,
            distance: i as f64 * ds,
            velocity: sign * speeds[i],
            acceleration: sign * acceleration,
        });

        if i < last {
            t_s += 2.0 * ds / (speeds[i] + speeds[i + 1]);
        }
    }

    Ok(timed)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
