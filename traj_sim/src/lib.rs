//! # Trajectory library.
//!
//! This library generates time-parameterised trajectories for a differential-drive robot and
//! drives them through a simulated closed control loop, measuring how long a routine of moves
//! actually takes.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Planar geometry - poses, twists and the states trajectories are made of
pub mod geometry;

/// Localisation module - estimates the pose of the robot from odometry and the gyro
pub mod loc;

/// Locomotion module - kinematics and the voltage model of the differential drive
pub mod loco;

/// Parameters for the `traj_sim` executable
pub mod params;

/// Path module - smooth splines through waypoints, resampled by arc length
pub mod path;

/// Routine module - runs a plan of moves through generation and simulation
pub mod routine;

/// Simulation module - the simulated execution engine
pub mod sim;

/// Timing module - velocity and acceleration constraints and the velocity profile
pub mod timing;

/// Trajectory control module - keeps the robot on the trajectory
pub mod traj_ctrl;

/// Trajectory generator - builds linear and turn in place trajectories
pub mod traj_gen;

/// Timed trajectories and their sampling
pub mod trajectory;
