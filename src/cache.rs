use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::actions::LabelSet;
use crate::api::models::labels;
use crate::error::AppResult;

/// Keeps the launcher's local read-model in step with confirmed mutations.
pub trait CacheRefreshNotifier: Send + Sync {
    /// Fire-and-forget; failures are logged, never returned.
    fn refresh(&self, outcome: &LabelSet);
    fn clear(&self) -> AppResult<()>;
}

/// Cached search listings stored as one JSON file per label id.
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn listing_path(&self, label_id: &str) -> PathBuf {
        let file_stem: String = label_id
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-') {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_stem}.json"))
    }

    fn invalidate(&self, label_id: &str) -> io::Result<bool> {
        match fs::remove_file(self.listing_path(label_id)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

impl CacheRefreshNotifier for LocalCache {
    fn refresh(&self, outcome: &LabelSet) {
        if outcome.is_empty() {
            tracing::debug!("no confirmed labels; cache left as is");
            return;
        }

        // The inbox listing changes with every confirmed mutation.
        let stale: BTreeSet<&str> = outcome.iter().chain([labels::INBOX]).collect();
        for label_id in stale {
            match self.invalidate(label_id) {
                Ok(true) => tracing::debug!(label_id, "cached listing invalidated"),
                Ok(false) => {}
                Err(err) => tracing::warn!(label_id, error = %err, "failed to invalidate cache"),
            }
        }
    }

    fn clear(&self) -> AppResult<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        tracing::debug!(dir = %self.dir.display(), "cache cleared");
        Ok(())
    }
}
