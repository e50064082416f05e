//! In-memory LFU+TTL cache in front of the order storage layer (cache
//! component of the read/write pipeline).
//!
//! A single [`parking_lot::RwLock`] guards both the value map and the
//! per-entry access-frequency counters, mirroring the original's single
//! mutex over one cache struct: `Get` increments frequency and therefore
//! always needs exclusive access, so splitting the lock into a
//! frequency-only and value-only half buys nothing.
//!
//! `CACHE_TTL` is the one knob that drives both how long an entry lives and
//! how often the sweeper looks for expired entries — there's no separate
//! hardcoded lifetime distinct from the configured TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use domain::Order;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

struct Entry {
    order: Order,
    freq: u64,
    expires_at: Instant,
}

struct Inner {
    entries: HashMap<String, Entry>,
}

/// Bounded, TTL-expiring, least-frequently-used order cache.
pub struct OrderCache {
    capacity: usize,
    ttl: Duration,
    inner: RwLock<Inner>,
}

impl OrderCache {
    /// `capacity` of 0 is clamped to 1 — a cache that can hold nothing
    /// isn't a cache, and the original treats a non-positive size the same
    /// way.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
            }),
        }
    }

    /// Number of live entries, including ones past their TTL that haven't
    /// been swept yet.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a clone of the cached order, bumping its access frequency.
    /// An expired entry is treated as a miss and removed lazily.
    #[instrument(skip(self), fields(order_uid = order_uid))]
    pub fn get(&self, order_uid: &str) -> Option<Order> {
        let mut inner = self.inner.write();
        let now = Instant::now();

        match inner.entries.get_mut(order_uid) {
            Some(entry) if entry.expires_at > now => {
                entry.freq += 1;
                debug!(freq = entry.freq, "cache hit");
                Some(entry.order.clone())
            }
            Some(_) => {
                inner.entries.remove(order_uid);
                debug!("cache hit on expired entry, evicted");
                None
            }
            None => None,
        }
    }

    /// Inserts or refreshes an order. An existing key has its value and TTL
    /// refreshed in place without disturbing its frequency. A new key at
    /// capacity evicts the least-frequently-used entry first.
    #[instrument(skip(self, order), fields(order_uid = %order.order_uid))]
    pub fn put(&self, order: Order) {
        let mut inner = self.inner.write();
        let expires_at = Instant::now() + self.ttl;

        if let Some(entry) = inner.entries.get_mut(&order.order_uid) {
            entry.order = order;
            entry.expires_at = expires_at;
            return;
        }

        if inner.entries.len() >= self.capacity {
            if let Some(victim) = least_frequently_used(&inner.entries) {
                debug!(victim, "evicting least-frequently-used entry");
                inner.entries.remove(&victim);
            }
        }

        inner.entries.insert(
            order.order_uid.clone(),
            Entry {
                order,
                freq: 1,
                expires_at,
            },
        );
    }

    /// Bulk-populates the cache at startup (warm-up), bypassing eviction —
    /// the caller is expected to have already sized the load to capacity.
    #[instrument(skip(self, orders))]
    pub fn load(&self, orders: Vec<Order>) {
        let mut inner = self.inner.write();
        let expires_at = Instant::now() + self.ttl;
        let n = orders.len();

        for order in orders {
            inner.entries.insert(
                order.order_uid.clone(),
                Entry {
                    order,
                    freq: 1,
                    expires_at,
                },
            );
        }

        info!(loaded = n, "cache warmed up");
    }

    /// Removes every entry past its TTL. Called on a fixed period by
    /// [`spawn_ttl_sweeper`].
    #[instrument(skip(self))]
    fn sweep_expired(&self) {
        let now = Instant::now();
        let mut inner = self.inner.write();
        let before = inner.entries.len();
        inner.entries.retain(|_, e| e.expires_at > now);
        let swept = before - inner.entries.len();
        if swept > 0 {
            warn!(swept, "swept expired cache entries");
        }
    }
}

fn least_frequently_used(entries: &HashMap<String, Entry>) -> Option<String> {
    entries
        .iter()
        .min_by_key(|(_, e)| e.freq)
        .map(|(k, _)| k.clone())
}

/// Spawns a background task that sweeps expired entries every `ttl`
/// (the same duration configures both the entry lifetime and the sweep
/// period, per `CACHE_TTL`).
pub fn spawn_ttl_sweeper(cache: Arc<OrderCache>) -> JoinHandle<()> {
    let ttl = cache.ttl;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ttl);
        interval.tick().await;
        loop {
            interval.tick().await;
            cache.sweep_expired();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Delivery, Item, Payment};

    fn sample_order(uid: &str) -> Order {
        Order {
            order_uid: uid.to_string(),
            track_number: "tn".into(),
            entry: "WBIL".into(),
            delivery: Delivery {
                name: "Test".into(),
                phone: "+9720000000".into(),
                zip: "123".into(),
                city: "City".into(),
                address: "Addr".into(),
                region: "".into(),
                email: "a@b.com".into(),
            },
            payment: Payment {
                transaction: "tx".into(),
                request_id: "".into(),
                currency: "USD".into(),
                provider: "wbpay".into(),
                amount: 100,
                payment_dt: 1,
                bank: "alpha".into(),
                delivery_cost: 0,
                goods_total: 100,
                custom_fee: 0,
            },
            items: vec![Item {
                chrt_id: 1,
                track_number: "tn".into(),
                price: 100,
                rid: "rid".into(),
                name: "item".into(),
                sale: 0,
                size: "0".into(),
                total_price: 100,
                nm_id: 1,
                brand: "brand".into(),
                status: 200,
            }],
            locale: "en".into(),
            internal_signature: "".into(),
            customer_id: "cust".into(),
            delivery_service: "meest".into(),
            shardkey: "1".into(),
            sm_id: 1,
            date_created: chrono::Utc::now(),
            oof_shard: "1".into(),
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = OrderCache::new(8, Duration::from_secs(60));
        cache.put(sample_order("uid1"));
        let got = cache.get("uid1").unwrap();
        assert_eq!(got.order_uid, "uid1");
    }

    #[test]
    fn miss_on_unknown_key() {
        let cache = OrderCache::new(8, Duration::from_secs(60));
        assert!(cache.get("nope").is_none());
    }

    #[test]
    fn capacity_zero_is_clamped_to_one() {
        let cache = OrderCache::new(0, Duration::from_secs(60));
        cache.put(sample_order("uid1"));
        cache.put(sample_order("uid2"));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("uid2").is_some());
    }

    #[test]
    fn evicts_least_frequently_used_on_overflow() {
        let cache = OrderCache::new(2, Duration::from_secs(60));
        cache.put(sample_order("uid1"));
        cache.put(sample_order("uid2"));

        // uid1 is accessed repeatedly, uid2 is never read again.
        cache.get("uid1");
        cache.get("uid1");
        cache.get("uid1");

        cache.put(sample_order("uid3"));

        assert!(cache.get("uid1").is_some());
        assert!(cache.get("uid2").is_none());
        assert!(cache.get("uid3").is_some());
    }

    #[test]
    fn put_on_existing_key_refreshes_without_evicting() {
        let cache = OrderCache::new(1, Duration::from_secs(60));
        cache.put(sample_order("uid1"));
        cache.put(sample_order("uid1"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = OrderCache::new(8, Duration::from_millis(100));
        cache.put(sample_order("uid1"));
        assert!(cache.get("uid1").is_some());

        tokio::time::advance(Duration::from_millis(150)).await;

        assert!(cache.get("uid1").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_removes_expired_entries_on_its_own() {
        let cache = Arc::new(OrderCache::new(8, Duration::from_millis(100)));
        cache.put(sample_order("uid1"));

        let handle = spawn_ttl_sweeper(cache.clone());
        tokio::time::advance(Duration::from_millis(250)).await;
        tokio::task::yield_now().await;

        assert_eq!(cache.len(), 0);
        handle.abort();
    }
}
