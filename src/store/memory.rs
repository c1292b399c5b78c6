use crate::core::cache::KeyValueCollection;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory collection backed by a HashMap; used for tests and as the
/// fallback when the persistent store is unavailable.
pub struct MemoryCollection {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueCollection for MemoryCollection {
    async fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) {
        debug!("Store SET for key: {}", key);
        self.inner.lock().await.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_collection_get_set() {
        let collection = MemoryCollection::new();

        assert!(collection.get("key1").await.is_none());

        collection.set("key1", "value1".to_string()).await;
        assert_eq!(collection.get("key1").await, Some("value1".to_string()));

        // Overwrite replaces the prior value.
        collection.set("key1", "value2".to_string()).await;
        assert_eq!(collection.get("key1").await, Some("value2".to_string()));
    }
}
