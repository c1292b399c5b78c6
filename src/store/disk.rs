use crate::core::cache::KeyValueCollection;
use async_trait::async_trait;
use fjall::PartitionHandle;
use tracing::debug;

/// Persistent collection backed by one fjall partition. Storage errors are
/// downgraded to misses; the cache layer treats absence and corruption the
/// same way.
pub struct DiskCollection {
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn new(partition: PartitionHandle) -> Self {
        Self { partition }
    }
}

#[async_trait]
impl KeyValueCollection for DiskCollection {
    async fn get(&self, key: &str) -> Option<String> {
        match self.partition.get(key) {
            Ok(Some(bytes)) => String::from_utf8(bytes.to_vec()).ok(),
            Ok(None) => None,
            Err(e) => {
                debug!("Disk store get error for {}: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: String) {
        debug!("Store SET for key: {}", key);
        if let Err(e) = self.partition.insert(key, value.as_bytes()) {
            debug!("Disk store set error for {}: {}", key, e);
        }
    }
}
