//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the software root, the directory containing the
/// `params` and `sessions` directories.
pub const SW_ROOT_ENV_VAR: &str = "GND_SW_ROOT";

/// Get the software root directory.
///
/// If the environment variable is not set an error is returned.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Get the name of the host machine, or `"unknown"` if it cannot be determined.
pub fn get_hostname() -> String {
    env::var("HOSTNAME")
        .or_else(|_| std::fs::read_to_string("/etc/hostname").map(|s| s.trim().to_string()))
        .unwrap_or_else(|_| String::from("unknown"))
}
