//! Cross-platform directory path resolution
//!
//! The root config lives in the config directory. Per-environment configs
//! and persisted table settings live in the data directory.
//! - Linux/macOS: XDG Base Directory specification (~/.config, ~/.local/share)
//! - Windows: Known Folder API (AppData\Roaming, AppData\Local)

use std::path::{Path, PathBuf};

const APP_DIR: &str = "svcview";

/// Which platform directory a path is resolved against
#[derive(Clone, Copy)]
enum DirKind {
    Config,
    Data,
}

impl DirKind {
    fn override_var(self) -> &'static str {
        match self {
            DirKind::Config => "SVCVIEW_CONFIG_DIR",
            DirKind::Data => "SVCVIEW_DATA_DIR",
        }
    }

    #[cfg(not(windows))]
    fn xdg_var(self) -> &'static str {
        match self {
            DirKind::Config => "XDG_CONFIG_HOME",
            DirKind::Data => "XDG_DATA_HOME",
        }
    }

    /// Home-relative fallback used when the XDG variable is unset
    #[cfg(not(windows))]
    fn home_relative(self) -> &'static [&'static str] {
        match self {
            DirKind::Config => &[".config"],
            DirKind::Data => &[".local", "share"],
        }
    }
}

fn resolve(kind: DirKind) -> PathBuf {
    if let Ok(dir) = std::env::var(kind.override_var()) {
        return PathBuf::from(dir);
    }
    platform_dir(kind)
}

#[cfg(windows)]
fn platform_dir(kind: DirKind) -> PathBuf {
    use directories::ProjectDirs;
    ProjectDirs::from("", "", APP_DIR)
        .map(|dirs| match kind {
            DirKind::Config => dirs.config_dir().to_path_buf(),
            DirKind::Data => dirs.data_dir().to_path_buf(),
        })
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
}

#[cfg(not(windows))]
fn platform_dir(kind: DirKind) -> PathBuf {
    use directories::BaseDirs;
    let base = std::env::var(kind.xdg_var())
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = BaseDirs::new()
                .map(|dirs| dirs.home_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            kind.home_relative()
                .iter()
                .fold(home, |path, segment| path.join(segment))
        });
    base.join(APP_DIR)
}

/// Get the configuration directory path
///
/// Checks SVCVIEW_CONFIG_DIR environment variable first, then falls back to:
/// - Unix (Linux/macOS): XDG_CONFIG_HOME/svcview or ~/.config/svcview
/// - Windows: %APPDATA%\svcview\config
pub fn config_dir() -> PathBuf {
    resolve(DirKind::Config)
}

/// Get the data directory path
///
/// Checks SVCVIEW_DATA_DIR environment variable first, then falls back to:
/// - Unix (Linux/macOS): XDG_DATA_HOME/svcview or ~/.local/share/svcview
/// - Windows: %LOCALAPPDATA%\svcview\data
pub fn data_dir() -> PathBuf {
    resolve(DirKind::Data)
}

/// Get the root configuration file path
pub fn root_config_path() -> PathBuf {
    config_dir().join("config.yaml")
}

/// Get the environment-specific config file path
pub fn environment_config_path(environment: u64) -> PathBuf {
    data_dir()
        .join("environments")
        .join(environment.to_string())
        .join("config.yaml")
}

/// Get the directory holding persisted table settings
pub fn tables_dir() -> PathBuf {
    data_dir().join("tables")
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
