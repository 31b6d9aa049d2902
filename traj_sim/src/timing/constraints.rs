//! Timing constraints

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{MinMaxAccel, TimingConstraint};
use crate::{
    geometry::{PoseWithCurvature, Rotation},
    loco::DifferentialDrive,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Curvatures below this magnitude are treated as straight lines.
const MIN_CURVATURE_IN: f64 = 1e-12;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A configurable constraint.
///
/// Neither kind bounds a turn in place since the chassis does not translate.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    /// Limits `v^2 |k|`, the centripetal acceleration felt by the chassis.
    CentripetalAccel { max_accel_ips2: f64 },

    /// An extra cap on chassis speed.
    VelocityLimit { max_vel_ips: f64 },
}

/// Bounds from the drive voltage model, see [`DifferentialDrive`].
#[derive(Debug, Copy, Clone)]
pub struct DriveDynamicsConstraint<'d> {
    drive: &'d DifferentialDrive,
    max_voltage_v: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TimingConstraint<PoseWithCurvature> for Constraint {
    fn max_velocity(&self, state: &PoseWithCurvature) -> f64 {
        match self {
            Constraint::CentripetalAccel { max_accel_ips2 } => {
                if state.curvature_in.abs() < MIN_CURVATURE_IN {
                    std::f64::INFINITY
                } else {
                    (max_accel_ips2 / state.curvature_in.abs()).sqrt()
                }
            }
            Constraint::VelocityLimit { max_vel_ips } => *max_vel_ips,
        }
    }

    fn min_max_acceleration(&self, _state: &PoseWithCurvature, _velocity: f64) -> MinMaxAccel {
        MinMaxAccel::unbounded()
    }
}

impl TimingConstraint<Rotation> for Constraint {
    fn max_velocity(&self, _state: &Rotation) -> f64 {
        std::f64::INFINITY
    }

    fn min_max_acceleration(&self, _state: &Rotation, _velocity: f64) -> MinMaxAccel {
        MinMaxAccel::unbounded()
    }
}

impl<'d> DriveDynamicsConstraint<'d> {
    pub fn new(drive: &'d DifferentialDrive, max_voltage_v: f64) -> Self {
        Self {
            drive,
            max_voltage_v,
        }
    }
}

impl<'d> TimingConstraint<PoseWithCurvature> for DriveDynamicsConstraint<'d> {
    fn max_velocity(&self, state: &PoseWithCurvature) -> f64 {
        self.drive
            .max_velocity_ips(state.curvature_in, self.max_voltage_v)
    }

    fn min_max_acceleration(&self, state: &PoseWithCurvature, velocity: f64) -> MinMaxAccel {
        self.drive
            .accel_range(state.curvature_in, velocity, self.max_voltage_v)
    }
}

impl<'d> TimingConstraint<Rotation> for DriveDynamicsConstraint<'d> {
    fn max_velocity(&self, _state: &Rotation) -> f64 {
        self.drive.max_angular_rate_rads(self.max_voltage_v)
    }

    fn min_max_acceleration(&self, _state: &Rotation, velocity: f64) -> MinMaxAccel {
        self.drive.angular_accel_range(velocity, self.max_voltage_v)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{geometry::Pose2, loco::DriveParams, timing::ConstraintSet};

    fn state(curvature_in: f64) -> PoseWithCurvature {
        PoseWithCurvature::new(Pose2::new(10.0, 20.0, 0.3), curvature_in)
    }

    #[test]
    fn test_centripetal() {
        let c = Constraint::CentripetalAccel {
            max_accel_ips2: 70.0,
        };

        assert_eq!(c.max_velocity(&state(0.0)), std::f64::INFINITY);
        assert!((c.max_velocity(&state(0.7)) - 10.0).abs() < 1e-12);
        assert!((c.max_velocity(&state(-0.7)) - 10.0).abs() < 1e-12);

        // Doesn't limit a turn in place
        assert_eq!(c.max_velocity(&Rotation::new(1.0)), std::f64::INFINITY);
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let drive = DifferentialDrive::new(&DriveParams {
            track_width_in: 26.0,
            track_scrub_factor: 1.0,
            max_wheel_speed_ips: 150.0,
            kv_v_per_ips: 0.08,
            ka_v_per_ips2: 0.02,
            ks_v: 1.0,
        });
        let dyn_constraint = DriveDynamicsConstraint::new(&drive, 9.0);
        let constraints = [Constraint::CentripetalAccel {
            max_accel_ips2: 70.0,
        }];

        let set = ConstraintSet::<PoseWithCurvature>::new(130.0, 130.0)
            .with_all(&constraints)
            .with(&dyn_constraint);

        let s = state(0.05);
        let first = set.evaluate(&s, 20.0);
        let second = set.evaluate(&s, 20.0);

        assert_eq!(first, second);
        assert_eq!(set.num_constraints(), 2);
    }

    #[test]
    fn test_set_takes_minimum() {
        let constraints = [
            Constraint::CentripetalAccel {
                max_accel_ips2: 100.0,
            },
            Constraint::VelocityLimit { max_vel_ips: 60.0 },
        ];
        let set = ConstraintSet::<PoseWithCurvature>::new(130.0, 130.0).with_all(&constraints);

        // Straight: only the velocity limit applies
        assert_eq!(set.max_velocity(&state(0.0)), 60.0);
        // Tight turn: centripetal dominates
        assert!((set.max_velocity(&state(1.0)) - 10.0).abs() < 1e-12);

        // No constraint applies: only the fixed caps
        let caps: ConstraintSet<PoseWithCurvature> = ConstraintSet::new(130.0, 120.0);
        let bound = caps.evaluate(&state(0.2), 50.0);
        assert_eq!(bound.max_velocity, 130.0);
        assert_eq!(bound.accel, MinMaxAccel::new(-120.0, 120.0));
    }

    #[test]
    fn test_deserialize_constraint() {
        #[derive(Deserialize)]
        struct Wrapper {
            constraints: Vec<Constraint>,
        }

        let w: Wrapper = util::params::from_str(
            r#"
            [[constraints]]
            kind = "centripetal_accel"
            max_accel_ips2 = 70.0

            [[constraints]]
            kind = "velocity_limit"
            max_vel_ips = 90.0
            "#,
        )
        .unwrap();

        assert_eq!(
            w.constraints,
            vec![
                Constraint::CentripetalAccel {
                    max_accel_ips2: 70.0
                },
                Constraint::VelocityLimit { max_vel_ips: 90.0 }
            ]
        );
    }
}
