use std::path::{Path, PathBuf};

const APP_DIR: &str = "statline";

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| Path::new(".").to_path_buf())
        .join(APP_DIR)
}

/// Returns the platform-specific path for the config file.
///
/// # Notes
/// - Uses platform-specific config directory (e.g., ~/.config on Linux)
/// - Falls back to current directory if config directory is unavailable
pub fn get_config_path() -> String {
    app_dir(dirs::config_dir())
        .join("config.toml")
        .to_string_lossy()
        .to_string()
}

/// Returns the platform-specific path for the log directory.
pub fn get_log_dir_path() -> String {
    app_dir(dirs::config_dir())
        .join("logs")
        .to_string_lossy()
        .to_string()
}

/// Returns the platform-specific directory for durable cache records
/// (e.g., ~/.cache/statline on Linux).
pub fn get_cache_dir_path() -> String {
    app_dir(dirs::cache_dir()).to_string_lossy().to_string()
}
