use std::path::{Path, PathBuf};

use log::{info, warn};
use tokio::fs;

use crate::config::exe_dir;
use crate::error::{Error, Result};
use crate::feed::FeedSnapshot;

pub const DEFAULT_SNAPSHOT_FILE: &str = "lanqiao_data.json";

/// Keeps the feed seen by the previous run in a single JSON file.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        exe_dir().join(DEFAULT_SNAPSHOT_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when nothing was saved yet or the file cannot be used; both
    /// lead to a cold start.
    pub async fn load(&self) -> Option<FeedSnapshot> {
        match self.try_load().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("{}, treating every entry as new", err);
                None
            }
        }
    }

    async fn try_load(&self) -> Result<Option<FeedSnapshot>> {
        let literal = match fs::read_to_string(&self.path).await {
            Ok(literal) => literal,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.load_error(err)),
        };
        serde_json::from_str(&literal)
            .map(Some)
            .map_err(|err| self.load_error(err))
    }

    /// Replaces the stored snapshot. The new content goes to a sibling temp
    /// file first and is renamed over the old one.
    pub async fn save(&self, snapshot: &FeedSnapshot) -> Result<()> {
        let content = serde_json::to_string_pretty(snapshot).map_err(|err| self.save_error(err))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| self.save_error(err))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .map_err(|err| self.save_error(err))?;
        if let Err(err) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(self.save_error(err));
        }

        info!("snapshot saved to {}", self.path.display());
        Ok(())
    }

    fn load_error(&self, err: impl ToString) -> Error {
        Error::SnapshotLoad {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }

    fn save_error(&self, err: impl ToString) -> Error {
        Error::SnapshotSave {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}
