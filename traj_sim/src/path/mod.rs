//! # Path
//!
//! This module defines the geometric path the robot follows during a linear move.
//!
//! A path is fitted through a sequence of waypoints with one [`QuinticHermiteSpline`] per pair of
//! waypoints, then resampled at uniform arc length so that no two samples are further apart than
//! the requested resolution. Arc length is estimated from a dense table of chord lengths along
//! each segment.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod spline;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use spline::*;

use log::trace;

use crate::geometry::{Pose2, PoseWithCurvature, Waypoint};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of chords used to estimate the length of each segment.
const ARC_TABLE_SAMPLES: usize = 500;

/// Waypoints closer than this are considered to coincide.
const MIN_WAYPOINT_SEP_IN: f64 = 1e-6;

const RESAMPLE_SLACK: f64 = 1e-9;

/// Fewest segments a path is resampled into. A rest to rest profile over a single segment has
/// zero speed at both of its states and so never moves.
pub const MIN_SEGMENTS: usize = 2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A path resampled at uniform arc length.
#[derive(Debug, Clone)]
pub struct Path {
    states: Vec<PoseWithCurvature>,

    /// Arc length between consecutive states.
    spacing_in: f64,
}

/// An arc length lookup table over one spline segment.
struct ArcTable {
    spline: QuinticHermiteSpline,

    /// Arc length at the start of the segment along the whole path
    start_in: f64,

    /// Arc length from the start of the segment to parameter `k / ARC_TABLE_SAMPLES`
    lengths_in: Vec<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PathError {
    #[error("A path needs at least 2 waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("Waypoint {0} has a non-finite coordinate or heading")]
    NonFiniteWaypoint(usize),

    #[error("Waypoints {0} and {1} coincide")]
    CoincidentWaypoints(usize, usize),

    #[error("The path resolution must be positive and finite, got {0}")]
    InvalidResolution(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Path {
    /// Fit a path through the waypoints, sampled at most `max_dx_in` apart.
    ///
    /// If `reversed` the robot drives the path backwards. The spline is then fitted in the
    /// direction of travel (waypoint headings flipped) and the resulting states flipped back, so
    /// the states always hold the heading of the robot body.
    pub fn from_waypoints(
        waypoints: &[Waypoint],
        reversed: bool,
        max_dx_in: f64,
    ) -> Result<Self, PathError> {
        if waypoints.len() < 2 {
            return Err(PathError::TooFewWaypoints(waypoints.len()));
        }

        if !(max_dx_in.is_finite() && max_dx_in > 0.0) {
            return Err(PathError::InvalidResolution(max_dx_in));
        }

        if let Some(i) = waypoints.iter().position(|w| !w.is_finite()) {
            return Err(PathError::NonFiniteWaypoint(i));
        }

        let poses: Vec<Pose2> = waypoints
            .iter()
            .map(|w| {
                let pose = w.to_pose();
                if reversed {
                    pose.flipped()
                } else {
                    pose
                }
            })
            .collect();

        for (i, pair) in poses.windows(2).enumerate() {
            if pair[0].distance(&pair[1]) < MIN_WAYPOINT_SEP_IN {
                return Err(PathError::CoincidentWaypoints(i, i + 1));
            }
        }

        // Build the arc length tables
        let mut tables: Vec<ArcTable> = Vec::with_capacity(poses.len() - 1);
        let mut start_in = 0.0;
        for pair in poses.windows(2) {
            let table = ArcTable::new(QuinticHermiteSpline::from_poses(&pair[0], &pair[1]), start_in);
            start_in += table.length_in();
            tables.push(table);
        }
        let length_in = start_in;

        // Uniform resampling, with a little slack so rounding in the length doesn't add a sample
        let num_segments =
            ((length_in / max_dx_in - RESAMPLE_SLACK).ceil() as usize).max(MIN_SEGMENTS);
        let spacing_in = length_in / num_segments as f64;

        let mut states = Vec::with_capacity(num_segments + 1);
        for j in 0..=num_segments {
            let s_in = if j == num_segments {
                length_in
            } else {
                j as f64 * spacing_in
            };

            // Tables are ordered by start, so find the last one starting at or before s
            let idx = tables
                .partition_point(|t| t.start_in <= s_in)
                .saturating_sub(1);
            let table = &tables[idx];
            let t = table.param_at(s_in - table.start_in);

            let state = PoseWithCurvature::new(table.spline.pose(t), table.spline.curvature_in(t));

            states.push(if reversed { state.flipped() } else { state });
        }

        trace!(
            "Path with {} waypoints resampled to {} states, length {:.3} in",
            waypoints.len(),
            states.len(),
            length_in
        );

        Ok(Self { states, spacing_in })
    }

    pub fn states(&self) -> &[PoseWithCurvature] {
        &self.states
    }

    pub fn spacing_in(&self) -> f64 {
        self.spacing_in
    }

    /// Total arc length of the path.
    pub fn length_in(&self) -> f64 {
        self.spacing_in * self.states.len().saturating_sub(1) as f64
    }
}

impl ArcTable {
    fn new(spline: QuinticHermiteSpline, start_in: f64) -> Self {
        let mut lengths_in = Vec::with_capacity(ARC_TABLE_SAMPLES + 1);
        lengths_in.push(0.0);

        let mut prev = spline.point(0.0);
        let mut total = 0.0;
        for k in 1..=ARC_TABLE_SAMPLES {
            let p = spline.point(k as f64 / ARC_TABLE_SAMPLES as f64);
            total += (p - prev).norm();
            lengths_in.push(total);
            prev = p;
        }

        Self {
            spline,
            start_in,
            lengths_in,
        }
    }

    fn length_in(&self) -> f64 {
        self.lengths_in.last().copied().unwrap_or(0.0)
    }

    /// Spline parameter at arc length `s_in` from the start of the segment.
    fn param_at(&self, s_in: f64) -> f64 {
        let k = self.lengths_in.partition_point(|&l| l < s_in);

        if k == 0 {
            return 0.0;
        }
        if k >= self.lengths_in.len() {
            return 1.0;
        }

        let (l0, l1) = (self.lengths_in[k - 1], self.lengths_in[k]);
        let frac = if l1 > l0 { (s_in - l0) / (l1 - l0) } else { 0.0 };

        ((k - 1) as f64 + frac) / ARC_TABLE_SAMPLES as f64
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
