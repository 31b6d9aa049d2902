//! Host platform utility functions

use std::path::PathBuf;

/// Environment variable pointing at the root of the software tree (the directory containing
/// `params/` and `sessions/`).
pub const SW_ROOT_ENV_VAR: &str = "TRAJ_SIM_ROOT";

/// Get the root directory of the software tree.
///
/// If `TRAJ_SIM_ROOT` is not set the current working directory is used instead.
pub fn get_sw_root() -> std::io::Result<PathBuf> {
    match std::env::var_os(SW_ROOT_ENV_VAR) {
        Some(root) => Ok(PathBuf::from(root)),
        None => std::env::current_dir(),
    }
}
