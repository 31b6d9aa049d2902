//! # Trajectory Generation Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use traj_lib::{
    geometry::{Rotation, Waypoint},
    loco::{DifferentialDrive, DriveParams},
    routine::{autos, RoutineRunner},
    timing::Constraint,
    traj_gen::{GenLimits, TrajectoryGenerator},
};

fn traj_gen_benchmark(c: &mut Criterion) {
    // ---- Build the generator ----

    let drive = DifferentialDrive::new(&DriveParams {
        track_width_in: 26.0,
        track_scrub_factor: 1.0,
        max_wheel_speed_ips: 150.0,
        kv_v_per_ips: 0.055,
        ka_v_per_ips2: 0.006,
        ks_v: 1.0,
    });
    let generator = TrajectoryGenerator::new(drive, 2.0, 0.05);

    let limits = GenLimits {
        max_vel_ips: 130.0,
        max_accel_ips2: 130.0,
        max_voltage_v: 9.0,
    };
    let constraints = vec![Constraint::CentripetalAccel {
        max_accel_ips2: 70.0,
    }];

    let waypoints = vec![
        Waypoint::new(18.0, 48.0, 0.0),
        Waypoint::new(160.0, 48.0, 0.0),
        Waypoint::new(262.0, 70.0, 20.0),
    ];

    c.bench_function("TrajectoryGenerator::generate_trajectory", |b| {
        b.iter(|| {
            generator
                .generate_trajectory(false, &waypoints, &constraints, limits)
                .unwrap()
        })
    });

    c.bench_function("TrajectoryGenerator::generate_turn_in_place_trajectory", |b| {
        b.iter(|| {
            generator
                .generate_turn_in_place_trajectory(
                    Rotation::from_degrees(20.0),
                    Rotation::from_degrees(160.0),
                    &constraints,
                    0.0,
                    limits,
                )
                .unwrap()
        })
    });

    // Whole routine, generation only
    let routine = autos::near_scale();
    let runner = RoutineRunner::new(generator.clone(), constraints.clone(), limits);

    c.bench_function("RoutineRunner::generate::near_scale", |b| {
        b.iter(|| {
            for mv in routine.moves.iter() {
                runner.generate(mv).unwrap();
            }
        })
    });
}

criterion_group!(benches, traj_gen_benchmark);
criterion_main!(benches);
