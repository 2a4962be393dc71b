use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

const APP_DIR: &str = "gmail-launcher";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    profiles_dir: PathBuf,
    credentials_root: PathBuf,
    cache_root: PathBuf,
}

impl AppPaths {
    pub fn discover() -> AppResult<Self> {
        let config_root = dirs::config_dir()
            .ok_or_else(|| AppError::Config("unable to resolve config directory".to_string()))?;
        let data_root = dirs::data_dir()
            .ok_or_else(|| AppError::Config("unable to resolve data directory".to_string()))?;

        Self::with_roots(config_root.join(APP_DIR), data_root.join(APP_DIR))
    }

    /// Lays out the directory tree under explicit roots instead of the
    /// platform defaults.
    pub fn with_roots(config_dir: PathBuf, data_dir: PathBuf) -> AppResult<Self> {
        let profiles_dir = config_dir.join("profiles");
        let credentials_root = data_dir.join("credentials");
        let cache_root = data_dir.join("cache");

        fs::create_dir_all(&profiles_dir)?;
        fs::create_dir_all(&credentials_root)?;
        fs::create_dir_all(&cache_root)?;

        Ok(Self {
            config_dir,
            profiles_dir,
            credentials_root,
            cache_root,
        })
    }

    pub fn settings_file(&self, profile: &str) -> PathBuf {
        self.profiles_dir.join(format!("{profile}.json"))
    }

    pub fn credentials_dir(&self, profile: &str) -> PathBuf {
        self.credentials_root.join(profile)
    }

    pub fn cache_dir(&self, profile: &str) -> PathBuf {
        self.cache_root.join(profile)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lays_out_directories_under_roots() {
        let dir = tempfile::tempdir().expect("temp dir");
        let paths = AppPaths::with_roots(dir.path().join("config"), dir.path().join("data"))
            .expect("paths should resolve");

        assert!(dir.path().join("data/credentials").is_dir());
        assert_eq!(
            paths.credentials_dir("work"),
            dir.path().join("data/credentials/work")
        );
        assert_eq!(
            paths.settings_file("work"),
            dir.path().join("config/profiles/work.json")
        );
        assert_eq!(paths.cache_dir("work"), dir.path().join("data/cache/work"));
    }
}
