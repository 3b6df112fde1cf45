//! Platform config directories.

use std::path::PathBuf;

/// Overrides the platform directory for every service when set.
pub const CONFIG_DIR_ENV: &str = "VEDEX_CONFIG_DIR";

/// Config directory for `service`:
/// `$VEDEX_CONFIG_DIR/<service>` if set, otherwise the platform location
/// (`~/Library/Application Support/<Service>`, `$XDG_CONFIG_HOME/<service>`,
/// `%APPDATA%\<Service>`).
pub fn default_config_dir_for(service: &str) -> PathBuf {
    if let Some(root) = std::env::var_os(CONFIG_DIR_ENV) {
        return PathBuf::from(root).join(service.to_lowercase());
    }
    platform_config_dir(service)
}

#[cfg(target_os = "macos")]
fn platform_config_dir(service: &str) -> PathBuf {
    home_dir()
        .join("Library")
        .join("Application Support")
        .join(title_case(service))
}

#[cfg(target_os = "windows")]
fn platform_config_dir(service: &str) -> PathBuf {
    std::env::var_os("APPDATA")
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join("AppData").join("Roaming"))
        .join(title_case(service))
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_config_dir(service: &str) -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".config"))
        .join(service.to_lowercase())
}

fn home_dir() -> PathBuf {
    let var = if cfg!(target_os = "windows") { "USERPROFILE" } else { "HOME" };
    std::env::var_os(var)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

#[cfg_attr(not(any(target_os = "macos", target_os = "windows")), allow(dead_code))]
fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
