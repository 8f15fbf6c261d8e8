//! Accessory directory with an optional in-memory snapshot
//!
//! The snapshot is populated by the first successful cached fetch and kept
//! for the life of the directory. It has no TTL; uncached fetches read the
//! bridge without replacing it.

use crate::client::{Accessory, HomebridgeClient, ServiceCharacteristic};
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Fetches accessories from the bridge and keeps the cached snapshot
pub struct AccessoryDirectory {
    client: Arc<dyn HomebridgeClient>,
    cache: RwLock<Option<Arc<Vec<Accessory>>>>,
}

impl AccessoryDirectory {
    pub fn new(client: Arc<dyn HomebridgeClient>) -> Self {
        Self {
            client,
            cache: RwLock::new(None),
        }
    }

    /// Bridge client used for fetches
    pub fn client(&self) -> &Arc<dyn HomebridgeClient> {
        &self.client
    }

    /// Return the accessory list
    ///
    /// With `use_cache` an existing snapshot is returned without touching the
    /// network, and a fresh result becomes the new snapshot. Concurrent cached
    /// callers on an empty cache wait for a single fetch. Without `use_cache`
    /// the bridge is always asked and the snapshot is left alone.
    pub async fn fetch(&self, use_cache: bool) -> Result<Arc<Vec<Accessory>>> {
        if !use_cache {
            return self.fetch_remote().await;
        }

        if let Some(snapshot) = self.cache.read().await.as_ref() {
            debug!("Serving {} accessories from cache", snapshot.len());
            return Ok(Arc::clone(snapshot));
        }

        let mut cache = self.cache.write().await;
        if let Some(snapshot) = cache.as_ref() {
            debug!("Serving {} accessories filled by a concurrent fetch", snapshot.len());
            return Ok(Arc::clone(snapshot));
        }

        let accessories = self.fetch_remote().await?;
        *cache = Some(Arc::clone(&accessories));
        debug!("Cached {} accessories", accessories.len());
        Ok(accessories)
    }

    async fn fetch_remote(&self) -> Result<Arc<Vec<Accessory>>> {
        match self.client.get_accessories().await {
            Ok(accessories) => Ok(Arc::new(accessories)),
            Err(e) => {
                warn!("Accessory fetch failed: {e}");
                Err(e)
            }
        }
    }

    /// Number of accessories in the snapshot, if one exists
    pub async fn cached_len(&self) -> Option<usize> {
        self.cache.read().await.as_ref().map(|snapshot| snapshot.len())
    }

    /// Look up an accessory by `uniqueId`
    pub fn find_by_id<'a>(accessories: &'a [Accessory], id: &str) -> Option<&'a Accessory> {
        accessories.iter().find(|accessory| accessory.unique_id == id)
    }

    /// Look up a characteristic by type tag within one accessory
    pub fn find_characteristic<'a>(
        accessory: &'a Accessory,
        characteristic_type: &str,
    ) -> Option<&'a ServiceCharacteristic> {
        accessory
            .service_characteristics
            .iter()
            .find(|c| c.characteristic_type == characteristic_type)
    }
}
