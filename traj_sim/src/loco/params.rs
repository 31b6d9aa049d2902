//! Parameters structure for the drive train

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the differential drive.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DriveParams {
    // ---- GEOMETRY ----
    /// Distance between the left and right wheel contact patches.
    ///
    /// Units: inches
    pub track_width_in: f64,

    /// Factor applied to the track width to account for wheel scrub when turning. A value above
    /// 1 means the robot turns slower than ideal kinematics would predict.
    pub track_scrub_factor: f64,

    // ---- CAPABILITIES ----
    /// Fastest speed the wheels may be commanded to.
    ///
    /// Units: inches/second
    pub max_wheel_speed_ips: f64,

    // ---- VOLTAGE MODEL ----
    /// Voltage needed per unit of wheel speed.
    ///
    /// Units: volts/(inches/second)
    pub kv_v_per_ips: f64,

    /// Voltage needed per unit of wheel acceleration.
    ///
    /// Units: volts/(inches/second^2)
    pub ka_v_per_ips2: f64,

    /// Voltage needed to overcome static friction.
    ///
    /// Units: volts
    pub ks_v: f64,
}
