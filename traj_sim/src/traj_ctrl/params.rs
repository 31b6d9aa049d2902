//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Along-track controller proportional gain
    pub along_k_p: f64,

    /// Along-track controller integral gain
    pub along_k_i: f64,

    /// Along-track controller derivative gain
    pub along_k_d: f64,

    /// Lateral controller proportional gain
    pub lat_k_p: f64,

    /// Lateral controller integral gain
    pub lat_k_i: f64,

    /// Lateral controller derivative gain
    pub lat_k_d: f64,

    /// Heading controller proportional gain
    pub head_k_p: f64,

    /// Heading controller integral gain
    pub head_k_i: f64,

    /// Heading controller derivative gain
    pub head_k_d: f64,

    /// Largest correction added to the feedforward linear velocity.
    ///
    /// Units: inches/second
    pub max_linear_correction_ips: f64,

    /// Largest correction added to the feedforward turn rate.
    ///
    /// Units: radians/second
    pub max_angular_correction_rads: f64,

    /// The trajectory is finished once the position error is below this threshold.
    ///
    /// Units: inches
    pub linear_threshold_in: f64,

    /// The trajectory is finished once the heading error is below this threshold.
    ///
    /// Units: radians
    pub angular_threshold_rad: f64,
}
