use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

use super::AuthorizationToken;

/// Durable storage for credential blobs, one slot per key.
pub trait CredentialStore: Send + Sync {
    /// Fails with [`AppError::CredentialsUnavailable`] when nothing was ever
    /// saved under `key`. A stored but unusable token is still returned.
    fn load(&self, key: &str) -> AppResult<AuthorizationToken>;
    /// Overwrites any previous token under `key`.
    fn save(&self, key: &str, token: &AuthorizationToken) -> AppResult<()>;
    /// Succeeds when nothing is stored.
    fn delete(&self, key: &str) -> AppResult<()>;
}

#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot(&self, key: &str) -> AppResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(AppError::Config(format!("invalid credential key `{key}`")));
        }

        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self, key: &str) -> AppResult<AuthorizationToken> {
        let path = self.slot(key)?;
        if !path.exists() {
            return Err(AppError::CredentialsUnavailable(key.to_string()));
        }

        let raw = fs::read_to_string(path)?;
        Ok(AuthorizationToken::from_blob(raw))
    }

    fn save(&self, key: &str, token: &AuthorizationToken) -> AppResult<()> {
        let path = self.slot(key)?;
        fs::create_dir_all(&self.dir)?;

        let staging = path.with_extension("json.tmp");
        fs::write(&staging, token.as_str())?;
        restrict_permissions(&staging)?;
        fs::rename(&staging, &path)?;

        tracing::debug!(key, "credential saved");
        Ok(())
    }

    fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.slot(key)?;
        if path.exists() {
            fs::remove_file(path)?;
            tracing::debug!(key, "credential deleted");
        }

        Ok(())
    }
}

fn restrict_permissions(path: &Path) -> AppResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }

    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}
