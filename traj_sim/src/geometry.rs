//! # Geometry
//!
//! Planar geometry types shared by path generation, trajectory control and simulation.
//!
//! All positions are in inches in the Field (FLD) frame, with headings measured anticlockwise
//! from the positive FLD_X axis.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

use util::maths::wrap_pi;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Below this magnitude an angle change is treated as zero when integrating twists.
const SMALL_ANGLE_RAD: f64 = 1e-9;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A planar pose of the robot body in the FLD frame.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose2 {
    /// Position in the FLD frame
    pub position_in: Vector2<f64>,

    /// Heading of the robot, anticlockwise from FLD_X
    pub heading_rad: f64,
}

/// A change in pose expressed in the frame of the pose it is applied to.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    pub dx_in: f64,
    pub dy_in: f64,
    pub dtheta_rad: f64,
}

/// A pose on a path along with the curvature of the path at that pose.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseWithCurvature {
    pub pose: Pose2,

    /// Rate of change of heading with respect to distance travelled.
    ///
    /// Units: 1/inches
    pub curvature_in: f64,
}

/// The heading of the robot during a turn in place.
///
/// Unlike [`Pose2`] headings, rotation headings are not wrapped so that a turn progresses
/// continuously from its initial to its final value.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub heading_rad: f64,
}

/// A waypoint as given in a routine plan.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x_in: f64,
    pub y_in: f64,
    pub heading_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// States which can be interpolated between, with `frac` in [0, 1].
pub trait Interpolate {
    fn interpolate(&self, other: &Self, frac: f64) -> Self;
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Pose2 {
    pub fn new(x_in: f64, y_in: f64, heading_rad: f64) -> Self {
        Self {
            position_in: Vector2::new(x_in, y_in),
            heading_rad,
        }
    }

    /// Unit vector pointing in the direction of the pose.
    pub fn forward2(&self) -> Vector2<f64> {
        Vector2::new(self.heading_rad.cos(), self.heading_rad.sin())
    }

    /// The same position facing the opposite way.
    pub fn flipped(&self) -> Self {
        Self {
            position_in: self.position_in,
            heading_rad: wrap_pi(self.heading_rad + std::f64::consts::PI),
        }
    }

    /// Apply a twist to this pose, moving along the constant curvature arc the twist describes.
    pub fn exp(&self, twist: &Twist) -> Self {
        let (s, c) = if twist.dtheta_rad.abs() < SMALL_ANGLE_RAD {
            (
                1.0 - twist.dtheta_rad.powi(2) / 6.0,
                0.5 * twist.dtheta_rad,
            )
        } else {
            (
                twist.dtheta_rad.sin() / twist.dtheta_rad,
                (1.0 - twist.dtheta_rad.cos()) / twist.dtheta_rad,
            )
        };

        let local = Vector2::new(
            twist.dx_in * s - twist.dy_in * c,
            twist.dx_in * c + twist.dy_in * s,
        );

        Self {
            position_in: self.position_in + Rotation2::new(self.heading_rad) * local,
            heading_rad: wrap_pi(self.heading_rad + twist.dtheta_rad),
        }
    }

    /// Express `target` in the frame of this pose.
    ///
    /// Returns the twist-like error (along-track, lateral, heading) which would take this pose to
    /// the target, with the heading error wrapped to [-pi, pi).
    pub fn error_to(&self, target: &Pose2) -> Twist {
        let local = Rotation2::new(-self.heading_rad) * (target.position_in - self.position_in);

        Twist {
            dx_in: local[0],
            dy_in: local[1],
            dtheta_rad: wrap_pi(target.heading_rad - self.heading_rad),
        }
    }

    /// Distance between the positions of two poses.
    pub fn distance(&self, other: &Pose2) -> f64 {
        (other.position_in - self.position_in).norm()
    }
}

impl Interpolate for Pose2 {
    fn interpolate(&self, other: &Self, frac: f64) -> Self {
        Self {
            position_in: self.position_in + (other.position_in - self.position_in) * frac,
            heading_rad: wrap_pi(
                self.heading_rad + wrap_pi(other.heading_rad - self.heading_rad) * frac,
            ),
        }
    }
}

impl PoseWithCurvature {
    pub fn new(pose: Pose2, curvature_in: f64) -> Self {
        Self { pose, curvature_in }
    }

    /// Turn the state around so it describes the robot driving backwards over the same point.
    ///
    /// The heading is flipped and, since distance is now travelled in the opposite sense, the
    /// curvature changes sign.
    pub fn flipped(&self) -> Self {
        Self {
            pose: self.pose.flipped(),
            curvature_in: -self.curvature_in,
        }
    }
}

impl Interpolate for PoseWithCurvature {
    fn interpolate(&self, other: &Self, frac: f64) -> Self {
        Self {
            pose: self.pose.interpolate(&other.pose, frac),
            curvature_in: self.curvature_in + (other.curvature_in - self.curvature_in) * frac,
        }
    }
}

impl Rotation {
    pub fn new(heading_rad: f64) -> Self {
        Self { heading_rad }
    }

    pub fn from_degrees(heading_deg: f64) -> Self {
        Self::new(heading_deg.to_radians())
    }
}

impl Interpolate for Rotation {
    fn interpolate(&self, other: &Self, frac: f64) -> Self {
        Self::new(self.heading_rad + (other.heading_rad - self.heading_rad) * frac)
    }
}

impl Waypoint {
    pub fn new(x_in: f64, y_in: f64, heading_deg: f64) -> Self {
        Self {
            x_in,
            y_in,
            heading_deg,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x_in.is_finite() && self.y_in.is_finite() && self.heading_deg.is_finite()
    }

    pub fn to_pose(&self) -> Pose2 {
        Pose2::new(self.x_in, self.y_in, self.heading_deg.to_radians())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_exp_straight() {
        let pose = Pose2::new(1.0, 2.0, FRAC_PI_2);
        let end = pose.exp(&Twist {
            dx_in: 10.0,
            dy_in: 0.0,
            dtheta_rad: 0.0,
        });

        assert!((end.position_in - Vector2::new(1.0, 12.0)).norm() < 1e-9);
        assert!((end.heading_rad - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_exp_arc() {
        // Quarter circle of radius 10 turning left from the origin
        let end = Pose2::default().exp(&Twist {
            dx_in: 10.0 * FRAC_PI_2,
            dy_in: 0.0,
            dtheta_rad: FRAC_PI_2,
        });

        assert!((end.position_in - Vector2::new(10.0, 10.0)).norm() < 1e-9);
        assert!((end.heading_rad - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_error_to() {
        let pose = Pose2::new(0.0, 0.0, FRAC_PI_2);
        let err = pose.error_to(&Pose2::new(-1.0, 2.0, PI));

        // Target is 2 ahead and 1 to the left, rotated a further quarter turn
        assert!((err.dx_in - 2.0).abs() < 1e-12);
        assert!((err.dy_in - 1.0).abs() < 1e-12);
        assert!((err.dtheta_rad - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_interpolate_wraps_heading() {
        let a = Pose2::new(0.0, 0.0, PI - 0.1);
        let b = Pose2::new(2.0, 0.0, -PI + 0.1);
        let mid = a.interpolate(&b, 0.5);

        assert!((mid.position_in[0] - 1.0).abs() < 1e-12);
        assert!((mid.heading_rad.abs() - PI).abs() < 1e-9);
    }

    #[test]
    fn test_flip_negates_curvature() {
        let state = PoseWithCurvature::new(Pose2::new(3.0, 4.0, 0.0), 0.02);
        let flipped = state.flipped();

        assert_eq!(flipped.pose.position_in, state.pose.position_in);
        assert!((flipped.pose.heading_rad.abs() - PI).abs() < 1e-12);
        assert_eq!(flipped.curvature_in, -0.02);
    }
}
