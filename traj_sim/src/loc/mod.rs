//! # Localisation module
//!
//! This module provides the best guess of the robot's pose. The estimate is owned by the
//! estimator and only changes through [`StateEstimator::update`] and [`StateEstimator::reset`],
//! the rest of the system reads it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use crate::{
    geometry::Pose2,
    loco::{Kinematics, WheelDisplacement},
};
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Measurements available to the estimator over one step.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct EstimatorInput {
    /// Distance travelled by each side of the drive, from the encoders
    pub displacement: WheelDisplacement,

    /// Absolute heading from the gyro, if one is fitted
    pub gyro_heading_rad: Option<f64>,
}

/// Dead reckoning from wheel odometry, with the heading taken from the gyro when it is
/// available.
#[derive(Debug, Clone)]
pub struct OdometryEstimator {
    kinematics: Kinematics,

    pose: Pose2,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Provides an interface for the localisation system of the robot.
pub trait StateEstimator {
    /// Update the estimate with the measurements of the latest step.
    fn update(&mut self, input: &EstimatorInput) -> Pose2;

    /// The current estimate.
    fn current_pose(&self) -> Pose2;

    /// Discard the estimate and start again from `pose`.
    fn reset(&mut self, pose: Pose2);
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl OdometryEstimator {
    pub fn new(kinematics: Kinematics) -> Self {
        Self {
            kinematics,
            pose: Pose2::default(),
        }
    }
}

impl StateEstimator for OdometryEstimator {
    fn update(&mut self, input: &EstimatorInput) -> Pose2 {
        let mut twist = self.kinematics.forward(&input.displacement);

        // The gyro heading replaces the heading change measured by the wheels, which suffer from
        // scrub and slip
        if let Some(heading_rad) = input.gyro_heading_rad {
            twist.dtheta_rad = wrap_pi(heading_rad - self.pose.heading_rad);
        }

        self.pose = self.pose.exp(&twist);

        self.pose
    }

    fn current_pose(&self) -> Pose2 {
        self.pose
    }

    fn reset(&mut self, pose: Pose2) {
        self.pose = pose;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::loco::DriveParams;
    use std::f64::consts::FRAC_PI_2;

    fn estimator() -> OdometryEstimator {
        OdometryEstimator::new(Kinematics::new(&DriveParams {
            track_width_in: 20.0,
            track_scrub_factor: 1.0,
            max_wheel_speed_ips: 150.0,
            kv_v_per_ips: 0.05,
            ka_v_per_ips2: 0.005,
            ks_v: 0.5,
        }))
    }

    #[test]
    fn test_straight() {
        let mut est = estimator();
        est.reset(Pose2::new(10.0, 5.0, FRAC_PI_2));

        let pose = est.update(&EstimatorInput {
            displacement: WheelDisplacement {
                left_in: 3.0,
                right_in: 3.0,
            },
            gyro_heading_rad: None,
        });

        assert!((pose.position_in[0] - 10.0).abs() < 1e-9);
        assert!((pose.position_in[1] - 8.0).abs() < 1e-9);
        assert_eq!(pose, est.current_pose());
    }

    #[test]
    fn test_gyro_overrides_wheels() {
        let mut est = estimator();

        // Wheels say a point turn of 0.1 rad, the gyro says the robot didn't turn
        let pose = est.update(&EstimatorInput {
            displacement: WheelDisplacement {
                left_in: -1.0,
                right_in: 1.0,
            },
            gyro_heading_rad: Some(0.0),
        });
        assert_eq!(pose.heading_rad, 0.0);

        let pose = est.update(&EstimatorInput {
            displacement: WheelDisplacement {
                left_in: -1.0,
                right_in: 1.0,
            },
            gyro_heading_rad: None,
        });
        assert!((pose.heading_rad - 0.1).abs() < 1e-12);
    }
}
