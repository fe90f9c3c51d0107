//! Logger initialisation
//!
//! Log lines go to stdout and to the session's log file, prefixed with the number of seconds since
//! the session started and a coloured level tag.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Targets whose chatter is limited to warnings, whatever the requested level.
const QUIET_TARGETS: [&str; 3] = ["ureq", "ureq_proto", "rustls"];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Waypoint transitions are logged at INFO, a level of {0} would hide them")]
    LevelTooQuiet(LevelFilter),

    #[error("Cannot open the log file: {0}")]
    LogFile(std::io::Error),

    #[error("A logger has already been installed: {0}")]
    AlreadyInstalled(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Install the logger for this execution.
///
/// May only be called once per process.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::LevelTooQuiet(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFile)?;

    QUIET_TARGETS
        .iter()
        .fold(fern::Dispatch::new().level(min_level), |d, t| d.level_for(*t, LevelFilter::Warn))
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}{}",
                session::get_elapsed_seconds(),
                level_tag(record.level()),
                target_prefix(record),
                message
            ))
        })
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::AlreadyInstalled)?;

    match session::get_epoch() {
        Some(epoch) => info!("Logging to {:?}, session started {}", session.log_file_path, epoch),
        None => info!("Logging to {:?}", session.log_file_path)
    }
    info!("Log level: {:?}", min_level);

    Ok(())
}

/// Parse a log level name as given on the command line.
///
/// Accepts `info`, `debug` and `trace` in any case.
pub fn parse_level(level: &str) -> Result<LevelFilter, String> {
    match level.to_ascii_lowercase().as_str() {
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        other => Err(format!("Unsupported log level \"{}\"", other))
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info  => "INF".normal(),
        Level::Warn  => "WRN".yellow(),
        Level::Error => "ERR".red().bold()
    }
}

/// Debug and trace lines name the module they come from.
fn target_prefix(record: &Record) -> String {
    match record.level() {
        Level::Debug | Level::Trace => format!("{}: ", record.target()),
        _ => String::new()
    }
}
