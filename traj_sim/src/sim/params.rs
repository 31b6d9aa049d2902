//! Simulation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulated execution engine.
#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {
    /// Length of one simulation step.
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// The number of steps after which an unfinished move is abandoned.
    pub max_iterations: usize,

    /// Fraction of the commanded wheel motion lost to slip, in [0, 1).
    #[serde(default)]
    pub wheel_slip: f64,

    /// If true the estimator is given the true heading as a gyro measurement.
    #[serde(default = "default_true")]
    pub gyro_enabled: bool,

    /// If true every step is written to the CSV archives in the session directory.
    #[serde(default)]
    pub archive_enabled: bool,
}

fn default_true() -> bool {
    true
}
