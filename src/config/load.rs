use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app_dirs;

use super::{AppConfig, ConfigError, DEFAULT_CONFIG_JSON};

/// Filename of the configuration document inside the application directory.
pub const CONFIG_FILE_NAME: &str = "autobwfconfig.json";

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(|error| match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => ConfigError::CreateDir { path, source },
    })?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load the configuration, writing the default document first if none exists.
pub fn load_or_default() -> Result<AppConfig, ConfigError> {
    let path = config_path()?;
    if !path.exists() {
        tracing::info!("Writing default configuration to {}", path.display());
        write_default(&path)?;
    }
    load_from(&path)
}

/// Load and parse a configuration document from `path`.
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::ParseJson {
        path: Some(path.to_path_buf()),
        source,
    })
}

/// Parse a configuration document held in memory.
pub fn parse(text: &str) -> Result<AppConfig, ConfigError> {
    serde_json::from_str(text).map_err(|source| ConfigError::ParseJson { path: None, source })
}

/// Write the default document atomically so a crash never leaves half a file.
fn write_default(path: &Path) -> Result<(), ConfigError> {
    let write_error = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().ok_or_else(|| {
        write_error(std::io::Error::other("config path has no parent directory"))
    })?;
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(DEFAULT_CONFIG_JSON.as_bytes())
        .map_err(write_error)?;
    file.persist(path).map_err(|err| write_error(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_dirs::{BaseDirGuard, TEST_DIR_LOCK};
    use tempfile::tempdir;

    #[test]
    fn creates_default_document_on_first_load() {
        let _lock = TEST_DIR_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        let base = tempdir().unwrap();
        let _guard = BaseDirGuard::set(base.path().to_path_buf());

        let config = load_or_default().unwrap();
        let path = config_path().unwrap();
        assert!(path.is_file());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG_JSON);
        assert_eq!(config.originator, "Apocryphal St. U. Archives");
    }

    #[test]
    fn existing_document_is_not_overwritten() {
        let _lock = TEST_DIR_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        let base = tempdir().unwrap();
        let _guard = BaseDirGuard::set(base.path().to_path_buf());
        let path = config_path().unwrap();
        let custom = DEFAULT_CONFIG_JSON.replace("ApoSU", "UkrHEC");
        std::fs::write(&path, &custom).unwrap();

        let config = load_or_default().unwrap();
        assert_eq!(config.repocode, "UkrHEC");
    }

    #[test]
    fn malformed_document_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseJson { path: Some(_), .. }));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
