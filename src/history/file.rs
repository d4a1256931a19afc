use super::{KeyValueStore, Update};
use crate::Result;
use async_trait::async_trait;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::sync::{broadcast, Mutex};

/// Directory-backed store holding one `<key>.json` file per key.
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
    changes: broadcast::Sender<String>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
            changes,
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("Invalid storage key '{}'", key),
            )
            .into());
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    async fn read(path: &Path) -> Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_sync(dir: &Path, path: &Path, value: &str) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        // Each write gets its own temp file, renamed over the target so
        // readers never observe a partial file.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Caller must hold `write_lock`.
    async fn write(&self, key: &str, path: PathBuf, value: String) -> Result<()> {
        let len = value.len();
        tokio::task::spawn_blocking({
            let dir = self.dir.clone();
            let path = path.clone();
            move || Self::write_sync(&dir, &path, &value)
        })
        .await
        .map_err(|e| std::io::Error::other(format!("History write task join error: {}", e)))??;

        tracing::debug!("Saved {} ({} bytes)", path.display(), len);
        let _ = self.changes.send(key.to_string());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Self::read(&self.path_for(key)?).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().await;
        self.write(key, path, value.to_string()).await
    }

    async fn update(&self, key: &str, apply: Update) -> Result<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().await;
        let next = apply(Self::read(&path).await?)?;
        self.write(key, path, next).await
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}
