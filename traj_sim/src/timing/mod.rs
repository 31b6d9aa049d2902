//! # Timing module
//!
//! Assigns a feasible velocity and time to every state of a geometric path. A set of
//! [`TimingConstraint`]s bounds the velocity and acceleration at each state; the bounds of all
//! constraints are combined by taking the most restrictive value. The profile itself is computed
//! by [`time_parameterize`], see the `profile` module for the algorithm.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod constraints;
mod profile;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use constraints::*;
pub use profile::*;

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A range of allowed accelerations.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct MinMaxAccel {
    pub min_accel: f64,
    pub max_accel: f64,
}

/// The combined bound of a [`ConstraintSet`] at a single state.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Bound {
    pub max_velocity: f64,
    pub accel: MinMaxAccel,
}

/// The constraints applied to one generation call.
///
/// The velocity and acceleration caps are always active. Additional constraints are borrowed
/// from the caller, they are never modified by evaluation.
pub struct ConstraintSet<'c, S> {
    max_velocity: f64,
    max_accel: f64,
    constraints: Vec<&'c dyn TimingConstraint<S>>,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A bound on the motion of the robot at a state of type `S`.
///
/// Implementations must be pure, evaluating the same state twice gives the same bound.
pub trait TimingConstraint<S> {
    /// The largest velocity magnitude allowed at this state.
    fn max_velocity(&self, state: &S) -> f64;

    /// The accelerations allowed at this state when travelling at `velocity`.
    fn min_max_acceleration(&self, state: &S, velocity: f64) -> MinMaxAccel;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MinMaxAccel {
    pub fn new(min_accel: f64, max_accel: f64) -> Self {
        Self {
            min_accel,
            max_accel,
        }
    }

    pub fn symmetric(max_accel: f64) -> Self {
        Self::new(-max_accel.abs(), max_accel.abs())
    }

    pub fn unbounded() -> Self {
        Self::new(std::f64::NEG_INFINITY, std::f64::INFINITY)
    }

    /// The range allowed by both `self` and `other`.
    pub fn intersect(&self, other: &MinMaxAccel) -> Self {
        Self::new(
            self.min_accel.max(other.min_accel),
            self.max_accel.min(other.max_accel),
        )
    }

    /// A range is valid if it is not empty.
    pub fn is_valid(&self) -> bool {
        self.min_accel <= self.max_accel
    }
}

impl<'c, S> ConstraintSet<'c, S> {
    /// Create a set containing only the fixed velocity and acceleration caps.
    pub fn new(max_velocity: f64, max_accel: f64) -> Self {
        Self {
            max_velocity,
            max_accel,
            constraints: Vec::new(),
        }
    }

    /// Register a constraint with the set.
    pub fn with(mut self, constraint: &'c dyn TimingConstraint<S>) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Register a group of constraints with the set.
    pub fn with_all<C>(mut self, constraints: &'c [C]) -> Self
    where
        C: TimingConstraint<S>,
    {
        for c in constraints {
            self.constraints.push(c);
        }
        self
    }

    /// Number of constraints registered in addition to the fixed caps
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// The largest velocity allowed by all constraints at this state.
    pub fn max_velocity(&self, state: &S) -> f64 {
        self.constraints
            .iter()
            .fold(self.max_velocity, |v, c| v.min(c.max_velocity(state)))
    }

    /// The accelerations allowed by all constraints at this state and velocity.
    pub fn accel_range(&self, state: &S, velocity: f64) -> MinMaxAccel {
        self.constraints
            .iter()
            .fold(MinMaxAccel::symmetric(self.max_accel), |a, c| {
                a.intersect(&c.min_max_acceleration(state, velocity))
            })
    }

    /// Evaluate the combined bound at this state.
    pub fn evaluate(&self, state: &S, velocity: f64) -> Bound {
        Bound {
            max_velocity: self.max_velocity(state),
            accel: self.accel_range(state, velocity),
        }
    }
}
