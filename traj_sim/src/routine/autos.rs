//! Built-in routines
//!
//! Coordinates are in inches from the corner of the field, headings in degrees.

use super::{Move, Routine};
use crate::geometry::Waypoint;

/// Look up a built-in routine by name.
pub fn by_name(name: &str) -> Option<Routine> {
    match name {
        "near_scale" => Some(near_scale()),
        "far_scale" => Some(far_scale()),
        _ => None,
    }
}

/// Drive to the scale, turn and pick up the first cube, then back up to the scale again.
pub fn near_scale() -> Routine {
    Routine {
        name: "near_scale".into(),
        moves: vec![
            // Start to scale
            Move::LinearMove {
                waypoints: vec![
                    Waypoint::new(18.0, 48.0, 0.0),
                    Waypoint::new(160.0, 48.0, 0.0),
                    Waypoint::new(262.0, 70.0, 20.0),
                ],
                reversed: false,
            },
            Move::RotateInPlace {
                from_heading_deg: 20.0,
                to_heading_deg: 160.0,
            },
            // Scale to first cube
            Move::LinearMove {
                waypoints: vec![
                    Waypoint::new(262.0, 70.0, 160.0),
                    Waypoint::new(210.0, 89.0, 160.0),
                ],
                reversed: false,
            },
            Move::RotateInPlace {
                from_heading_deg: 160.0,
                to_heading_deg: 200.0,
            },
            // First cube back to scale, facing the cube
            Move::LinearMove {
                waypoints: vec![
                    Waypoint::new(210.0, 89.0, 200.0),
                    Waypoint::new(262.0, 108.0, 200.0),
                ],
                reversed: true,
            },
        ],
    }
}

/// Cross the field to the far scale, then fetch the first cube on that side and back up to the
/// scale with it.
pub fn far_scale() -> Routine {
    Routine {
        name: "far_scale".into(),
        moves: vec![
            // Start, along the near side and across to the far scale
            Move::LinearMove {
                waypoints: vec![
                    Waypoint::new(18.0, 48.0, 0.0),
                    Waypoint::new(190.0, 48.0, 0.0),
                    Waypoint::new(232.0, 90.0, 90.0),
                    Waypoint::new(232.0, 230.0, 90.0),
                    Waypoint::new(262.0, 256.0, -20.0),
                ],
                reversed: false,
            },
            Move::RotateInPlace {
                from_heading_deg: -20.0,
                to_heading_deg: -160.0,
            },
            // Scale to first cube
            Move::LinearMove {
                waypoints: vec![
                    Waypoint::new(262.0, 256.0, -160.0),
                    Waypoint::new(210.0, 237.0, -160.0),
                ],
                reversed: false,
            },
            Move::RotateInPlace {
                from_heading_deg: -160.0,
                to_heading_deg: -200.0,
            },
            // First cube back to scale, facing the cube
            Move::LinearMove {
                waypoints: vec![
                    Waypoint::new(210.0, 237.0, -200.0),
                    Waypoint::new(262.0, 218.0, -200.0),
                ],
                reversed: true,
            },
        ],
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        loco::DifferentialDrive, params::TrajSimParams, routine::RoutineRunner,
        traj_gen::TrajectoryGenerator,
    };

    fn load_routine(name: &str) -> Routine {
        Routine::load_path(format!(
            "{}/../params/routines/{}.toml",
            env!("CARGO_MANIFEST_DIR"),
            name
        ))
        .unwrap()
    }

    #[test]
    fn test_moves_join_up() {
        for routine in [near_scale(), far_scale()].iter() {
            let mut position: Option<(f64, f64)> = None;
            let mut heading_deg: Option<f64> = None;

            for m in routine.moves.iter() {
                match m {
                    Move::LinearMove { waypoints, .. } => {
                        let (first, last) = (waypoints[0], waypoints[waypoints.len() - 1]);

                        // Each path starts where the previous one ended
                        if let Some(p) = position {
                            assert_eq!(p, (first.x_in, first.y_in), "{}", routine.name);
                        }
                        if let Some(h) = heading_deg {
                            assert_eq!(h, first.heading_deg, "{}", routine.name);
                        }

                        position = Some((last.x_in, last.y_in));
                        heading_deg = Some(last.heading_deg);
                    }
                    Move::RotateInPlace {
                        from_heading_deg,
                        to_heading_deg,
                    } => {
                        assert_eq!(heading_deg, Some(*from_heading_deg), "{}", routine.name);
                        heading_deg = Some(*to_heading_deg);
                    }
                }
            }

            assert_eq!(by_name(&routine.name).as_ref(), Some(routine));
        }

        assert!(by_name("centre_switch").is_none());
    }

    #[test]
    fn test_params_file_matches() {
        assert_eq!(load_routine("near_scale"), near_scale());
        assert_eq!(load_routine("far_scale"), far_scale());
    }

    #[test]
    fn test_every_move_generates() {
        let params: TrajSimParams = util::params::load_path(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../params/traj_sim.toml"
        ))
        .unwrap();
        let runner = RoutineRunner::new(
            TrajectoryGenerator::new(
                DifferentialDrive::new(&params.drive),
                params.generation.max_dx_in,
                params.generation.max_dtheta_rad,
            ),
            params.generation.constraints.clone(),
            params.generation.limits(),
        );

        for routine in [near_scale(), far_scale()].iter() {
            for (i, m) in routine.moves.iter().enumerate() {
                let traj = runner
                    .generate(m)
                    .unwrap_or_else(|e| panic!("{} move {}: {}", routine.name, i, e));
                assert!(traj.duration_s() > 0.0);
            }
        }
    }
}
