//! # Trajectory Simulation
//!
//! This executable generates the trajectories of an autonomous routine and drives them through
//! the simulated control loop, printing how long the routine takes to drive.
//!
//! Usage: `traj_sim [ROUTINE]`, where `ROUTINE` is the name of a built-in routine or a path to a
//! routine TOML file. The `near_scale` routine is run if none is given.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::env;

use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{debug, info};

use traj_lib::{
    loc::OdometryEstimator,
    loco::{DifferentialDrive, Kinematics},
    params::TrajSimParams,
    routine::{autos, Routine, RoutineRunner},
    sim::{DriveSimulation, SimArchive},
    traj_ctrl::TrajCtrl,
    traj_gen::TrajectoryGenerator,
};
use util::{
    logger::{self, LevelFilter, LogConfig},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const DEFAULT_ROUTINE: &str = "near_scale";

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let session = Session::new("traj_sim", "sessions").wrap_err("Failed to create the session")?;

    logger::init(
        &LogConfig::new(LevelFilter::Debug).quiet("traj_lib::sim", LevelFilter::Info),
        &session,
    )
        .wrap_err("Failed to initialise logging")?;

    info!("Trajectory Simulation\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: TrajSimParams =
        util::params::load("traj_sim.toml").wrap_err("Could not load traj_sim params")?;

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let routine = match args.len() {
        1 => autos::near_scale(),
        2 => match autos::by_name(&args[1]) {
            Some(r) => r,
            None => {
                info!("Loading routine from \"{}\"", &args[1]);
                Routine::load_path(&args[1]).wrap_err("Failed to load the routine")?
            }
        },
        _ => {
            return Err(eyre!(
                "Expected at most one argument, the routine to run (default {})",
                DEFAULT_ROUTINE
            ))
        }
    };

    // ---- MODULE INIT ----

    let kinematics = Kinematics::new(&params.drive);

    let generator = TrajectoryGenerator::new(
        DifferentialDrive::new(&params.drive),
        params.generation.max_dx_in,
        params.generation.max_dtheta_rad,
    );
    let runner = RoutineRunner::new(
        generator,
        params.generation.constraints.clone(),
        params.generation.limits(),
    );

    let traj_ctrl = TrajCtrl::new(
        params.traj_ctrl.clone(),
        kinematics,
        params.drive.max_wheel_speed_ips,
    );

    let mut sim = DriveSimulation::new(
        params.sim.clone(),
        kinematics,
        traj_ctrl,
        OdometryEstimator::new(kinematics),
    )
    .wrap_err("Failed to initialise the simulation")?;

    if params.sim.archive_enabled {
        let archive = SimArchive::new(&session).wrap_err("Failed to create the archives")?;
        sim = sim.with_archive(archive);
        info!("Archiving to {:?}", session.arch_root);
    }

    info!("Init complete\n");

    // ---- RUN ----

    let report = runner
        .run(&routine, &mut sim, Some(&session))
        .wrap_err_with(|| format!("Routine {:?} failed", routine.name))?;

    for m in report.moves.iter() {
        info!(
            "    {} ({}): {:.3} s, {} steps{}",
            m.index,
            m.kind,
            m.elapsed_s,
            m.steps,
            if m.stalled { " STALLED" } else { "" }
        );
    }

    info!("Time driven: {:.3} s", report.total_elapsed_s);
    println!("Time driven: {:.3} s", report.total_elapsed_s);

    session.save("routine_report.json", report);

    session.exit();

    Ok(())
}
