use super::{KeyValueStore, Update};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// In-process store; contents vanish with the process.
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    changes: broadcast::Sender<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            values: Mutex::new(HashMap::new()),
            changes,
        }
    }

    fn notify(&self, key: &str) {
        // No subscribers is fine.
        let _ = self.changes.send(key.to_string());
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self.notify(key);
        Ok(())
    }

    async fn update(&self, key: &str, apply: Update) -> Result<()> {
        {
            // The map lock covers the whole read-modify-write.
            let mut values = self.values.lock().unwrap();
            let next = apply(values.get(key).cloned())?;
            values.insert(key.to_string(), next);
        }
        self.notify(key);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[tokio::test]
    async fn test_memory_store_get_set() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").await.unwrap(), None);

        store.set("a", "1").await.unwrap();
        store.set("a", "2").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_memory_store_update_sees_current_value() {
        let store = MemoryStore::new();
        store.set("n", "1").await.unwrap();

        store
            .update("n", Box::new(|raw| Ok(format!("{}1", raw.unwrap_or_default()))))
            .await
            .unwrap();
        assert_eq!(store.get("n").await.unwrap().as_deref(), Some("11"));
    }

    #[tokio::test]
    async fn test_memory_store_failed_update_keeps_value() {
        let store = MemoryStore::new();
        store.set("n", "1").await.unwrap();

        let err = store
            .update("n", Box::new(|_| Err(Error::Config("nope".to_string()))))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(store.get("n").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_memory_store_notifies_subscribers() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe();

        store.set("poem-history", "[]").await.unwrap();
        assert_eq!(changes.recv().await.unwrap(), "poem-history");
    }
}
