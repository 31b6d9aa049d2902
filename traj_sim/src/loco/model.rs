//! Drive voltage model
//!
//! Each side of the drive needs `kS sgn(u) + kV u + kA a` volts to move its wheels at speed `u`
//! with acceleration `a`. Given a voltage limit this bounds the chassis velocity and the range of
//! chassis accelerations available at a particular velocity and curvature.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::{DriveParams, Kinematics};
use crate::timing::MinMaxAccel;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Wheel speeds below this are treated as stationary when deciding the sense of friction.
const STATIONARY_IPS: f64 = 1e-9;

/// Wheel/chassis ratios below this mean the wheel does not move with the chassis.
const MIN_WHEEL_FACTOR: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Voltage model of a differential drive.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DifferentialDrive {
    pub kinematics: Kinematics,
    kv_v_per_ips: f64,
    ka_v_per_ips2: f64,
    ks_v: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DifferentialDrive {
    pub fn new(params: &DriveParams) -> Self {
        Self {
            kinematics: Kinematics::new(params),
            kv_v_per_ips: params.kv_v_per_ips,
            ka_v_per_ips2: params.ka_v_per_ips2,
            ks_v: params.ks_v,
        }
    }

    /// Free speed of a wheel at the given voltage, zero if the voltage can't overcome friction.
    ///
    /// Units: inches/second
    pub fn max_wheel_speed_ips(&self, max_voltage_v: f64) -> f64 {
        ((max_voltage_v - self.ks_v) / self.kv_v_per_ips).max(0.0)
    }

    /// Fastest chassis speed along a path of the given curvature.
    ///
    /// The outer wheel moves at `v (1 + |k| r)`, so that wheel hits the voltage limit first.
    pub fn max_velocity_ips(&self, curvature_in: f64, max_voltage_v: f64) -> f64 {
        self.max_wheel_speed_ips(max_voltage_v)
            / (1.0 + curvature_in.abs() * self.kinematics.turn_radius_in())
    }

    /// Fastest turn rate in place.
    pub fn max_angular_rate_rads(&self, max_voltage_v: f64) -> f64 {
        self.max_wheel_speed_ips(max_voltage_v) / self.kinematics.turn_radius_in()
    }

    /// Range of chassis accelerations available when travelling at `velocity_ips` along a path of
    /// the given curvature.
    pub fn accel_range(
        &self,
        curvature_in: f64,
        velocity_ips: f64,
        max_voltage_v: f64,
    ) -> MinMaxAccel {
        let r = self.kinematics.turn_radius_in();
        self.range_for_factors(
            [1.0 - curvature_in * r, 1.0 + curvature_in * r],
            velocity_ips,
            max_voltage_v,
        )
    }

    /// Range of angular accelerations available when turning in place at `angular_rads`.
    pub fn angular_accel_range(&self, angular_rads: f64, max_voltage_v: f64) -> MinMaxAccel {
        let r = self.kinematics.turn_radius_in();
        self.range_for_factors([-r, r], angular_rads, max_voltage_v)
    }

    /// Intersect the acceleration ranges of each side, where side `i` moves at `factors[i]` times
    /// the chassis quantity.
    fn range_for_factors(
        &self,
        factors: [f64; 2],
        chassis_velocity: f64,
        max_voltage_v: f64,
    ) -> MinMaxAccel {
        let mut range = MinMaxAccel::unbounded();

        for f in factors.iter() {
            if f.abs() < MIN_WHEEL_FACTOR {
                continue;
            }

            let (wheel_min, wheel_max) = self.wheel_accel_range(chassis_velocity * f, max_voltage_v);

            let side = if *f > 0.0 {
                MinMaxAccel::new(wheel_min / f, wheel_max / f)
            } else {
                MinMaxAccel::new(wheel_max / f, wheel_min / f)
            };

            range = range.intersect(&side);
        }

        range
    }

    /// Wheel accelerations available at the given wheel speed.
    fn wheel_accel_range(&self, speed_ips: f64, max_voltage_v: f64) -> (f64, f64) {
        let sense = friction_sense(speed_ips);

        if sense == 0.0 {
            // Starting from rest friction must be overcome in whichever direction we go
            let headroom_v = max_voltage_v - self.ks_v;
            (-headroom_v / self.ka_v_per_ips2, headroom_v / self.ka_v_per_ips2)
        } else {
            let hold_v = self.ks_v * sense + self.kv_v_per_ips * speed_ips;
            (
                (-max_voltage_v - hold_v) / self.ka_v_per_ips2,
                (max_voltage_v - hold_v) / self.ka_v_per_ips2,
            )
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn friction_sense(speed_ips: f64) -> f64 {
    if speed_ips > STATIONARY_IPS {
        1.0
    } else if speed_ips < -STATIONARY_IPS {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn drive() -> DifferentialDrive {
        DifferentialDrive::new(&DriveParams {
            track_width_in: 26.0,
            track_scrub_factor: 1.0,
            max_wheel_speed_ips: 150.0,
            kv_v_per_ips: 0.08,
            ka_v_per_ips2: 0.02,
            ks_v: 1.0,
        })
    }

    #[test]
    fn test_max_velocity() {
        let d = drive();

        assert!((d.max_wheel_speed_ips(9.0) - 100.0).abs() < 1e-9);
        assert!((d.max_velocity_ips(0.0, 9.0) - 100.0).abs() < 1e-9);

        // Radius 13 in means the outer wheel moves twice as fast as the centre
        assert!((d.max_velocity_ips(1.0 / 13.0, 9.0) - 50.0).abs() < 1e-9);
        assert!((d.max_velocity_ips(-1.0 / 13.0, 9.0) - 50.0).abs() < 1e-9);

        // Not enough voltage to overcome friction
        assert_eq!(d.max_velocity_ips(0.0, 0.5), 0.0);
    }

    #[test]
    fn test_accel_range_straight() {
        let d = drive();

        let rest = d.accel_range(0.0, 0.0, 9.0);
        assert!((rest.max_accel - 400.0).abs() < 1e-9);
        assert!((rest.min_accel + 400.0).abs() < 1e-9);

        // At 50 in/s, 5 V holds speed leaving 4 V to accelerate and 14 V to brake
        let moving = d.accel_range(0.0, 50.0, 9.0);
        assert!((moving.max_accel - 200.0).abs() < 1e-9);
        assert!((moving.min_accel + 700.0).abs() < 1e-9);

        // At free speed no more acceleration is available
        let free = d.accel_range(0.0, 100.0, 9.0);
        assert!(free.max_accel.abs() < 1e-9);
    }

    #[test]
    fn test_angular_accel_range() {
        let d = drive();
        let range = d.angular_accel_range(0.0, 9.0);

        assert!((range.max_accel - 400.0 / 13.0).abs() < 1e-9);
        assert!((range.min_accel + 400.0 / 13.0).abs() < 1e-9);
    }
}
