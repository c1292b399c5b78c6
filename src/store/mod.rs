pub mod disk;
pub mod memory;

use crate::config::AppConfig;
use crate::core::cache::KeyValueCollection;
use disk::DiskCollection;
use fjall::{Keyspace, PartitionCreateOptions};
use memory::MemoryCollection;
use std::sync::Arc;
use tracing::warn;

/// Key-value store handing out named collections, persisted through a fjall
/// keyspace when one can be opened and held in memory otherwise.
pub struct KeyValueStore {
    keyspace: Option<Arc<Keyspace>>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        let keyspace = AppConfig::default_data_path()
            .ok()
            .and_then(|path| {
                let cache_dir = path.join("cache");
                fjall::Config::new(cache_dir).open().ok()
            })
            .map(Arc::new);

        if keyspace.is_none() {
            warn!("Could not open persistent cache, falling back to in-memory store");
        }

        Self { keyspace }
    }

    pub fn new_at(path: &std::path::Path) -> Self {
        let keyspace = fjall::Config::new(path).open().ok().map(Arc::new);
        Self { keyspace }
    }

    pub fn in_memory() -> Self {
        Self { keyspace: None }
    }

    /// Opens a named collection. Falls back to a transient in-memory
    /// collection when the persistent partition cannot be created.
    pub fn collection(&self, name: &str) -> Arc<dyn KeyValueCollection> {
        if let Some(keyspace) = &self.keyspace {
            match keyspace.open_partition(name, PartitionCreateOptions::default()) {
                Ok(partition) => return Arc::new(DiskCollection::new(partition)),
                Err(e) => {
                    warn!("Failed to open partition '{}': {}", name, e);
                }
            }
        }
        Arc::new(MemoryCollection::new())
    }
}

impl Default for KeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}
