use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use cask_types::Locator;

use crate::backend::StorageBackend;
use crate::error::{BackendError, BackendResult};

/// Backend that keeps one file per locator under a base directory.
///
/// Each locator component becomes a path component. Writes go to a unique
/// temporary file that is synced and then renamed into place, so a reader
/// never observes a partially written value.
#[derive(Debug, Clone)]
pub struct FileSystemBackend {
    base_dir: PathBuf,
}

impl FileSystemBackend {
    /// Open a backend rooted at `base_dir`, creating the directory if needed.
    pub async fn open(base_dir: impl Into<PathBuf>) -> BackendResult<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).await?;
        info!(path = %base_dir.display(), "file system backend opened");
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, locator: &Locator) -> BackendResult<PathBuf> {
        let mut path = self.base_dir.clone();
        for part in locator.as_str().split('/') {
            // Locator validation already rejects `.`/`..`; this also keeps
            // Windows drive prefixes and separators out of the join.
            if part.contains(':') || part.contains(std::path::MAIN_SEPARATOR) {
                return Err(BackendError::InvalidLocator(locator.to_string()));
            }
            path.push(part);
        }
        Ok(path)
    }
}

#[async_trait]
impl StorageBackend for FileSystemBackend {
    async fn put(&self, locator: &Locator, data: Bytes) -> BackendResult<()> {
        let path = self.path_for(locator)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::now_v7().simple()));
        let mut file = File::create(&temp_path).await?;
        let written = async {
            file.write_all(&data).await?;
            file.sync_all().await
        }
        .await;
        drop(file);
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(%locator, size = data.len(), "file written");
        Ok(())
    }

    async fn get(&self, locator: &Locator) -> BackendResult<Bytes> {
        let path = self.path_for(locator)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BackendError::NotFound(locator.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, locator: &Locator) -> BackendResult<bool> {
        let path = self.path_for(locator)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn delete(&self, locator: &Locator) -> BackendResult<bool> {
        let path = self.path_for(locator)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(%locator, "file deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> BackendResult<Vec<Locator>> {
        let root = Locator::new(prefix)
            .map_err(|_| BackendError::InvalidLocator(prefix.to_string()))?;
        let root_path = self.path_for(&root)?;
        match fs::metadata(&root_path).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Ok(Vec::new()),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        }

        let mut found = Vec::new();
        let mut pending = vec![(root_path, prefix.to_string())];
        while let Some((dir, key)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                // Removed by a concurrent delete.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                    continue;
                };
                let child = format!("{key}/{name}");
                if entry.file_type().await?.is_dir() {
                    pending.push((entry.path(), child));
                } else if !name.ends_with(".tmp") {
                    if let Ok(locator) = Locator::new(child) {
                        found.push(locator);
                    }
                }
            }
        }
        found.sort();
        Ok(found)
    }
}
