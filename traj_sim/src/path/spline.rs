//! Quintic Hermite spline segment
//!
//! Each segment joins two poses, with the tangent at each end pointing along the pose heading and
//! the second derivative zero at both ends. Adjacent segments therefore share position, tangent
//! and (zero) curvature at the knot, which makes the whole path curvature continuous.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;

use crate::geometry::Pose2;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Length of the end tangents as a multiple of the chord length.
pub const TANGENT_SCALE: f64 = 1.2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single quintic segment, `p(t) = sum c_i t^i` for `t` in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct QuinticHermiteSpline {
    coeffs: [Vector2<f64>; 6],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl QuinticHermiteSpline {
    /// Fit a segment between two poses.
    pub fn from_poses(start: &Pose2, end: &Pose2) -> Self {
        let chord_in = start.distance(end);
        let v0 = start.forward2() * chord_in * TANGENT_SCALE;
        let v1 = end.forward2() * chord_in * TANGENT_SCALE;

        Self::from_hermite(start.position_in, v0, end.position_in, v1)
    }

    /// Build the polynomial from end points and tangents, with zero second derivatives.
    pub fn from_hermite(
        p0: Vector2<f64>,
        v0: Vector2<f64>,
        p1: Vector2<f64>,
        v1: Vector2<f64>,
    ) -> Self {
        Self {
            coeffs: [
                p0,
                v0,
                Vector2::zeros(),
                -p0 * 10.0 - v0 * 6.0 - v1 * 4.0 + p1 * 10.0,
                p0 * 15.0 + v0 * 8.0 + v1 * 7.0 - p1 * 15.0,
                -p0 * 6.0 - v0 * 3.0 - v1 * 3.0 + p1 * 6.0,
            ],
        }
    }

    pub fn point(&self, t: f64) -> Vector2<f64> {
        let c = &self.coeffs;
        c[0] + (c[1] + (c[2] + (c[3] + (c[4] + c[5] * t) * t) * t) * t) * t
    }

    /// First derivative with respect to `t`.
    pub fn velocity(&self, t: f64) -> Vector2<f64> {
        let c = &self.coeffs;
        c[1] + (c[2] * 2.0 + (c[3] * 3.0 + (c[4] * 4.0 + c[5] * 5.0 * t) * t) * t) * t
    }

    /// Second derivative with respect to `t`.
    pub fn acceleration(&self, t: f64) -> Vector2<f64> {
        let c = &self.coeffs;
        c[2] * 2.0 + (c[3] * 6.0 + (c[4] * 12.0 + c[5] * 20.0 * t) * t) * t
    }

    pub fn heading_rad(&self, t: f64) -> f64 {
        let v = self.velocity(t);
        v[1].atan2(v[0])
    }

    /// Signed curvature, positive when turning anticlockwise.
    ///
    /// Units: 1/inches
    pub fn curvature_in(&self, t: f64) -> f64 {
        let v = self.velocity(t);
        let a = self.acceleration(t);
        let speed = v.norm();

        if speed < std::f64::EPSILON {
            return 0.0;
        }

        (v[0] * a[1] - v[1] * a[0]) / speed.powi(3)
    }

    pub fn pose(&self, t: f64) -> Pose2 {
        let p = self.point(t);
        Pose2::new(p[0], p[1], self.heading_rad(t))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_end_conditions() {
        let start = Pose2::new(0.0, 0.0, 0.0);
        let end = Pose2::new(60.0, 40.0, FRAC_PI_2);
        let spline = QuinticHermiteSpline::from_poses(&start, &end);

        assert!((spline.point(0.0) - start.position_in).norm() < 1e-9);
        assert!((spline.point(1.0) - end.position_in).norm() < 1e-9);

        assert!(spline.heading_rad(0.0).abs() < 1e-9);
        assert!((spline.heading_rad(1.0) - FRAC_PI_2).abs() < 1e-9);

        assert!(spline.acceleration(0.0).norm() < 1e-9);
        assert!(spline.acceleration(1.0).norm() < 1e-9);
        assert!(spline.curvature_in(0.0).abs() < 1e-12);
        assert!(spline.curvature_in(1.0).abs() < 1e-12);

        // Turning left in between
        assert!(spline.curvature_in(0.5) > 0.0);
    }

    #[test]
    fn test_straight_line() {
        let spline = QuinticHermiteSpline::from_poses(
            &Pose2::new(0.0, 0.0, 0.0),
            &Pose2::new(120.0, 0.0, 0.0),
        );

        for i in 0..=10 {
            let t = i as f64 / 10.0;
            assert!(spline.point(t)[1].abs() < 1e-12);
            assert!(spline.curvature_in(t).abs() < 1e-12);
        }
    }
}
