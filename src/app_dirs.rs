//! Per-user application directory helpers anchored to a single `autoBWF` folder.
//!
//! The configuration document and launch logs live under the OS data directory
//! (e.g., `~/.local/share` on Linux). Setting `AUTOBWF_CONFIG_HOME` replaces the
//! base directory, which tests and portable installs rely on.

use std::{
    path::PathBuf,
    sync::{LazyLock, Mutex},
};

use directories::BaseDirs;
use thiserror::Error;

/// Name of the application directory that lives under the OS data root.
pub const APP_DIR_NAME: &str = "autoBWF";
/// Environment variable overriding the base directory.
pub const CONFIG_HOME_ENV: &str = "AUTOBWF_CONFIG_HOME";

static BASE_OVERRIDE: LazyLock<Mutex<Option<PathBuf>>> = LazyLock::new(|| Mutex::new(None));

/// Errors that can occur while resolving or preparing application directories.
#[derive(Debug, Error)]
pub enum AppDirError {
    /// No suitable base data directory could be resolved.
    #[error("No suitable base data directory available for application files")]
    NoBaseDir,
    /// Failed to create the application directory.
    #[error("Failed to create application directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Return the root `autoBWF` directory, creating it if needed.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = base_dir().ok_or(AppDirError::NoBaseDir)?;
    let path = base.join(APP_DIR_NAME);
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Return the logs directory inside the `autoBWF` root, creating it if needed.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    let path = app_root_dir()?.join("logs");
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn base_dir() -> Option<PathBuf> {
    if let Some(path) = BASE_OVERRIDE.lock().ok().and_then(|guard| guard.clone()) {
        return Some(path);
    }
    if let Ok(path) = std::env::var(CONFIG_HOME_ENV) {
        return Some(PathBuf::from(path));
    }
    BaseDirs::new().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Scoped override of the base directory, cleared again on drop.
#[cfg(test)]
pub(crate) struct BaseDirGuard;

#[cfg(test)]
impl BaseDirGuard {
    pub(crate) fn set(path: PathBuf) -> Self {
        let mut guard = BASE_OVERRIDE
            .lock()
            .expect("base override mutex poisoned");
        *guard = Some(path);
        Self
    }
}

#[cfg(test)]
impl Drop for BaseDirGuard {
    fn drop(&mut self) {
        if let Ok(mut guard) = BASE_OVERRIDE.lock() {
            *guard = None;
        }
    }
}

#[cfg(test)]
pub(crate) static TEST_DIR_LOCK: Mutex<()> = Mutex::new(());
