//! # Trajectory Simulation Parameters
//!
//! This module provides the parameters for the `traj_sim` executable, loaded from
//! `params/traj_sim.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::{
    loco::DriveParams,
    sim::SimParams,
    timing::Constraint,
    traj_ctrl,
    traj_gen::GenLimits,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TrajSimParams {
    pub sim: SimParams,

    pub generation: GenParams,

    pub drive: DriveParams,

    pub traj_ctrl: traj_ctrl::Params,
}

/// Parameters for trajectory generation.
#[derive(Debug, Clone, Deserialize)]
pub struct GenParams {
    /// Units: inches/second
    pub max_vel_ips: f64,

    /// Units: inches/second^2
    pub max_accel_ips2: f64,

    /// Largest voltage either side of the drive may be asked for.
    ///
    /// Units: volts
    pub max_voltage_v: f64,

    /// Largest distance between the states of a path.
    ///
    /// Units: inches
    pub max_dx_in: f64,

    /// Largest angle between the states of a turn in place.
    ///
    /// Units: radians
    pub max_dtheta_rad: f64,

    /// Constraints applied to every move.
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl GenParams {
    pub fn limits(&self) -> GenLimits {
        GenLimits {
            max_vel_ips: self.max_vel_ips,
            max_accel_ips2: self.max_accel_ips2,
            max_voltage_v: self.max_voltage_v,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse() {
        let p: TrajSimParams = util::params::from_str(
            r#"
            [sim]
            dt_s = 0.01
            max_iterations = 1500
            wheel_slip = 0.05

            [generation]
            max_vel_ips = 130.0
            max_accel_ips2 = 130.0
            max_voltage_v = 9.0
            max_dx_in = 2.0
            max_dtheta_rad = 0.05

            [[generation.constraints]]
            kind = "centripetal_accel"
            max_accel_ips2 = 70.0

            [drive]
            track_width_in = 26.0
            track_scrub_factor = 1.0
            max_wheel_speed_ips = 150.0
            kv_v_per_ips = 0.055
            ka_v_per_ips2 = 0.006
            ks_v = 1.0

            [traj_ctrl]
            along_k_p = 3.0
            along_k_i = 0.0
            along_k_d = 0.0
            lat_k_p = 0.05
            lat_k_i = 0.0
            lat_k_d = 0.0
            head_k_p = 5.0
            head_k_i = 0.0
            head_k_d = 0.0
            max_linear_correction_ips = 30.0
            max_angular_correction_rads = 2.0
            linear_threshold_in = 1.0
            angular_threshold_rad = 0.02
            "#,
        )
        .unwrap();

        assert_eq!(p.sim.max_iterations, 1500);
        assert!(p.sim.gyro_enabled);
        assert!(!p.sim.archive_enabled);
        assert_eq!(p.generation.limits().max_voltage_v, 9.0);
        assert_eq!(
            p.generation.constraints,
            vec![Constraint::CentripetalAccel {
                max_accel_ips2: 70.0
            }]
        );
        assert_eq!(p.drive.ks_v, 1.0);
    }

    #[test]
    fn test_params_file() {
        let p: TrajSimParams = util::params::load_path(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../params/traj_sim.toml"
        ))
        .unwrap();

        assert!(p.sim.dt_s > 0.0);
        assert!(!p.generation.constraints.is_empty());
    }

    #[test]
    fn test_max_iterations_required() {
        let result: Result<SimParams, _> = util::params::from_str("dt_s = 0.01");

        assert!(result.is_err());
    }
}
