//! File-based Drift Queue Adapter
//!
//! Keeps each pending drift record as one YAML file named after its
//! observation id. Files are written to a temporary name and renamed into
//! place, so a crash never leaves a half-written entry behind. The queue
//! survives process restarts. Entries that no longer parse are renamed to
//! `*.yaml.corrupt` and stop counting as pending.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

use crate::domain::foundation::ObservationId;
use crate::ports::{DriftQueue, PersistenceError, QueuedDrift};

const ENTRY_EXTENSION: &str = "yaml";
const TEMP_EXTENSION: &str = "yaml.tmp";
const CORRUPT_EXTENSION: &str = "yaml.corrupt";

/// Durable on-disk queue of drift records awaiting delivery
#[derive(Debug, Clone)]
pub struct FileDriftQueue {
    base_path: PathBuf,
}

impl FileDriftQueue {
    /// Create a queue rooted at `base_path`
    ///
    /// # Example
    /// ```ignore
    /// let queue = FileDriftQueue::new("./data/drift-queue");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn entry_path(&self, observation_id: &ObservationId) -> PathBuf {
        self.base_path
            .join(format!("{}.{}", observation_id.file_stem(), ENTRY_EXTENSION))
    }

    fn temp_path(&self, observation_id: &ObservationId) -> PathBuf {
        self.base_path
            .join(format!("{}.{}", observation_id.file_stem(), TEMP_EXTENSION))
    }

    async fn ensure_dir(&self) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    /// Paths of every committed entry. A missing directory is an empty queue.
    async fn entry_paths(&self) -> Result<Vec<PathBuf>, PersistenceError> {
        let mut dir = match fs::read_dir(&self.base_path).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let committed = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| {
                    name.ends_with(&format!(".{}", ENTRY_EXTENSION))
                        && !name.ends_with(&format!(".{}", TEMP_EXTENSION))
                })
                .unwrap_or(false);
            if committed {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    async fn read_entry(path: &Path) -> Result<QueuedDrift, PersistenceError> {
        let yaml = fs::read_to_string(path).await?;
        serde_yaml::from_str(&yaml).map_err(|e| PersistenceError::Serialization(e.to_string()))
    }

    /// Every entry that parses. Unparseable files are moved aside.
    async fn read_all(&self) -> Result<Vec<QueuedDrift>, PersistenceError> {
        let mut entries = Vec::new();
        for path in self.entry_paths().await? {
            match Self::read_entry(&path).await {
                Ok(entry) => entries.push(entry),
                Err(e @ PersistenceError::Serialization(_)) => {
                    let aside = path.with_extension(CORRUPT_EXTENSION);
                    warn!(
                        path = %path.display(),
                        moved_to = %aside.display(),
                        error = %e,
                        "Moving unparseable drift queue entry aside"
                    );
                    fs::rename(&path, &aside).await?;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable drift queue entry");
                }
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl DriftQueue for FileDriftQueue {
    async fn enqueue(&self, entry: QueuedDrift) -> Result<(), PersistenceError> {
        self.ensure_dir().await?;

        let yaml = serde_yaml::to_string(&entry)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        let temp = self.temp_path(entry.observation_id());
        fs::write(&temp, yaml).await?;
        fs::rename(&temp, self.entry_path(entry.observation_id())).await?;

        Ok(())
    }

    async fn pending(&self, limit: usize) -> Result<Vec<QueuedDrift>, PersistenceError> {
        let mut entries = self.read_all().await?;
        entries.sort_by(|a, b| {
            a.enqueued_at
                .cmp(&b.enqueued_at)
                .then_with(|| a.observation_id().cmp(b.observation_id()))
        });
        entries.truncate(limit);
        Ok(entries)
    }

    async fn remove(&self, observation_id: &ObservationId) -> Result<(), PersistenceError> {
        match fs::remove_file(self.entry_path(observation_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn len(&self) -> Result<usize, PersistenceError> {
        Ok(self.read_all().await?.len())
    }
}
