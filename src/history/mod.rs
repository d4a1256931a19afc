//! Local history of generated poems
//!
//! History lives in a key-value store under a single fixed key, as a JSON
//! array of [`HistoryEntry`] values ordered newest first. Stores broadcast the
//! key of every write so other views of the same store can refresh.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::models::{HistoryEntry, PoemResult};
use crate::Result;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Storage key holding the serialized history list.
pub const HISTORY_KEY: &str = "poem-history";

/// Rewrites a stored value given its current contents.
pub type Update = Box<dyn FnOnce(Option<String>) -> Result<String> + Send>;

/// Stores serialize all writes to a key, so `update` is atomic with respect to
/// every other `set`/`update` made through the same store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Read-modify-write under the store's write lock.
    async fn update(&self, key: &str, apply: Update) -> Result<()>;
    /// Receive the key of every subsequent write.
    fn subscribe(&self) -> broadcast::Receiver<String>;
}

pub struct PoemHistory {
    store: Arc<dyn KeyValueStore>,
}

impl PoemHistory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current entries, newest first.
    ///
    /// Unreadable or corrupt history is reported and treated as empty.
    pub async fn entries(&self) -> Vec<HistoryEntry> {
        match self.store.get(HISTORY_KEY).await {
            Ok(raw) => decode_entries(raw),
            Err(e) => {
                tracing::warn!("Error reading history key '{}': {}", HISTORY_KEY, e);
                Vec::new()
            }
        }
    }

    /// Prepend a successful generation to the history.
    pub async fn record(&self, result: &PoemResult) -> Result<HistoryEntry> {
        let entry = HistoryEntry {
            id: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            image: result.image.as_str().to_string(),
            poem: result.poem.clone(),
        };

        let new_entry = entry.clone();
        self.store
            .update(
                HISTORY_KEY,
                Box::new(move |raw| {
                    let mut entries = decode_entries(raw);
                    entries.insert(0, new_entry);
                    Ok(serde_json::to_string(&entries)?)
                }),
            )
            .await?;

        tracing::info!("Recorded poem {}", entry.id);
        Ok(entry)
    }

    /// Look up a past entry for redisplay.
    pub async fn get(&self, id: &str) -> Option<HistoryEntry> {
        self.entries().await.into_iter().find(|e| e.id == id)
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.set(HISTORY_KEY, "[]").await?;
        tracing::info!("History cleared");
        Ok(())
    }

    pub fn subscribe(&self) -> HistorySubscription {
        HistorySubscription {
            receiver: self.store.subscribe(),
        }
    }
}

fn decode_entries(raw: Option<String>) -> Vec<HistoryEntry> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!("Discarding unreadable history '{}': {}", HISTORY_KEY, e);
        Vec::new()
    })
}

/// Change notifications for the history key only.
pub struct HistorySubscription {
    receiver: broadcast::Receiver<String>,
}

impl HistorySubscription {
    /// Wait for the next history write. Returns `false` once the store is gone.
    pub async fn changed(&mut self) -> bool {
        loop {
            match self.receiver.recv().await {
                Ok(key) if key == HISTORY_KEY => return true,
                Ok(_) => continue,
                // Missed notifications still mean the value moved on.
                Err(broadcast::error::RecvError::Lagged(_)) => return true,
                Err(broadcast::error::RecvError::Closed) => return false,
            }
        }
    }
}
