//! # Logging
//!
//! Log records are written twice, once to stdout with a coloured level tag and once to the log
//! file of the session in plain text. Each line carries the time since the session epoch. Records
//! at debug or trace level also name the module they came from.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use colored::{ColoredString, Colorize};
use log::{info, Level};
use std::fmt::Display;

use crate::session::{self, Session};

pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Verbosity of the logger, overall and per module.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub level: LevelFilter,

    /// Modules logged at a lower verbosity than `level`
    pub quiet_modules: Vec<(&'static str, LevelFilter)>,
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("The log level must include info messages, found `{0}`")]
    LevelTooLow(LevelFilter),

    #[error("Could not open the session log file: {0}")]
    LogFile(std::io::Error),

    #[error("A logger has already been installed: {0}")]
    AlreadyInstalled(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LogConfig {
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            quiet_modules: Vec::new(),
        }
    }

    /// Cap the verbosity of `module` and everything beneath it. The cap can't raise the module
    /// above the overall level.
    pub fn quiet(mut self, module: &'static str, level: LevelFilter) -> Self {
        self.quiet_modules.push((module, level.min(self.level)));
        self
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Install the logger for this execution.
///
/// Can only succeed once per process.
pub fn init(config: &LogConfig, session: &Session) -> Result<(), LogError> {
    if config.level < Level::Info {
        return Err(LogError::LevelTooLow(config.level));
    }

    let log_file = fern::log_file(&session.log_file_path).map_err(LogError::LogFile)?;

    let stdout = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(
                    session::get_elapsed_seconds(),
                    coloured_tag(record.level()),
                    record.level(),
                    record.target(),
                    message
                )
            ))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(
                    session::get_elapsed_seconds(),
                    tag(record.level()),
                    record.level(),
                    record.target(),
                    message
                )
            ))
        })
        .chain(log_file);

    config
        .quiet_modules
        .iter()
        .fold(fern::Dispatch::new().level(config.level), |d, (module, level)| {
            d.level_for(*module, *level)
        })
        .chain(stdout)
        .chain(file)
        .apply()
        .map_err(LogError::AlreadyInstalled)?;

    info!(
        "Logging at {:?} since {} into {:?}",
        config.level,
        session::get_epoch(),
        session.log_file_path
    );
    for (module, level) in config.quiet_modules.iter() {
        info!("    {} capped at {:?}", module, level);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn format_line<T: Display, M: Display>(
    elapsed_s: f64,
    tag: T,
    level: Level,
    target: &str,
    message: M,
) -> String {
    if level > Level::Info {
        format!("[{:10.6} {}] {}: {}", elapsed_s, tag, target, message)
    } else {
        format!("[{:10.6} {}] {}", elapsed_s, tag, message)
    }
}

fn tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERR",
        Level::Warn => "WRN",
        Level::Info => "INF",
        Level::Debug => "DBG",
        Level::Trace => "TRC",
    }
}

fn coloured_tag(level: Level) -> ColoredString {
    let t = tag(level);
    match level {
        Level::Error => t.red().bold(),
        Level::Warn => t.yellow(),
        Level::Info => t.normal(),
        Level::Debug => t.dimmed(),
        Level::Trace => t.dimmed().italic(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_line() {
        assert_eq!(
            format_line(1.5, tag(Level::Info), Level::Info, "traj_lib::sim", "Started"),
            "[  1.500000 INF] Started"
        );
        assert_eq!(
            format_line(0.25, tag(Level::Debug), Level::Debug, "traj_lib::sim", "Step 3"),
            "[  0.250000 DBG] traj_lib::sim: Step 3"
        );
    }

    #[test]
    fn test_quiet_never_raises() {
        let config = LogConfig::new(LevelFilter::Info)
            .quiet("traj_lib::sim", LevelFilter::Trace)
            .quiet("traj_lib::timing", LevelFilter::Warn);

        assert_eq!(
            config.quiet_modules,
            vec![
                ("traj_lib::sim", LevelFilter::Info),
                ("traj_lib::timing", LevelFilter::Warn)
            ]
        );
    }
}
