use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::Delivery;

/// Delivery reads are cached for an hour; every write to a delivery must
/// call `invalidate` for that id.
pub const DELIVERY_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Clone)]
pub struct DeliveryCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<Uuid, (Instant, Delivery)>>>,
}

impl DeliveryCache {
    pub fn new() -> Self {
        Self::with_ttl(DELIVERY_CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, id: Uuid) -> Option<Delivery> {
        let entries = self.entries.read().await;
        match entries.get(&id) {
            Some((stored_at, delivery)) if stored_at.elapsed() < self.ttl => {
                Some(delivery.clone())
            }
            _ => None,
        }
    }

    pub async fn put(&self, delivery: Delivery) {
        let mut entries = self.entries.write().await;
        entries.insert(delivery.id, (Instant::now(), delivery));
    }

    pub async fn invalidate(&self, id: Uuid) {
        let mut entries = self.entries.write().await;
        entries.remove(&id);
    }
}

impl Default for DeliveryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn delivery(id: Uuid) -> Delivery {
        Delivery {
            id,
            order_id: Uuid::new_v4(),
            courier_id: None,
            status: "pending".into(),
            dest_latitude: 48.8566,
            dest_longitude: 2.3522,
            distance_km: None,
            fee: 500,
            history: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn hit_within_ttl_and_miss_after_invalidate() {
        let cache = DeliveryCache::new();
        let id = Uuid::new_v4();
        cache.put(delivery(id)).await;

        assert!(cache.get(id).await.is_some());
        cache.invalidate(id).await;
        assert!(cache.get(id).await.is_none());
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let cache = DeliveryCache::with_ttl(Duration::from_millis(0));
        let id = Uuid::new_v4();
        cache.put(delivery(id)).await;
        assert!(cache.get(id).await.is_none());
    }
}
