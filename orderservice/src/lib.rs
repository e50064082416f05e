pub mod error;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use backoff::future::retry;
use domain::{Delivery, Item, Order, Payment};
use ordercache::OrderCache;
use orderstorage::{OrderHeader, OrderRepository, StorageError, with_retry};
use tracing::{Instrument, info, instrument, warn};

use common::logger::{child_span, warn_if_slow};
pub use error::ServiceError;

/// Orchestrates the cache and the storage layer: the one place that knows
/// both exist. Mirrors the original `Service` — write path retries with a
/// generous elapsed budget since it's off the hot read path, read path is
/// cache-through with a four-way fan-out to storage on miss.
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    cache: Arc<OrderCache>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, cache: Arc<OrderCache>) -> Self {
        Self { repo, cache }
    }

    /// Persists a new order and, on success, seeds the cache with it.
    ///
    /// A duplicate-key error from storage (the order was already written by
    /// a prior delivery of the same message) is treated as success rather
    /// than retried — retrying it would just loop until the 15s budget is
    /// spent for no reason, since the write already landed.
    #[instrument(skip(self, order), fields(order_uid = %order.order_uid))]
    pub async fn add(&self, order: Order) -> Result<(), ServiceError> {
        if !order.is_complete() {
            return Err(ServiceError::IncorrectAggregate);
        }

        let header = OrderHeader {
            order_uid: order.order_uid.clone(),
            track_number: order.track_number.clone(),
            entry: order.entry.clone(),
            locale: order.locale.clone(),
            internal_signature: order.internal_signature.clone(),
            customer_id: order.customer_id.clone(),
            delivery_service: order.delivery_service.clone(),
            shardkey: order.shardkey.clone(),
            sm_id: order.sm_id,
            date_created: order.date_created,
            oof_shard: order.oof_shard.clone(),
        };

        let backoff_policy = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::from_secs(15)))
            .build();

        let repo = self.repo.clone();
        let mut exhausted = false;
        let result = retry(backoff_policy, || {
            let repo = repo.clone();
            let header = header.clone();
            let delivery = order.delivery.clone();
            let payment = order.payment.clone();
            let items = order.items.clone();
            async move {
                match repo.add(&header, &delivery, &payment, &items).await {
                    Ok(()) => Ok(()),
                    Err(e) if e.is_duplicate() => {
                        info!(order_uid = %header.order_uid, "order already persisted, treating as success");
                        Ok(())
                    }
                    Err(e) if e.is_transient() => Err(backoff::Error::transient(e)),
                    Err(e) => Err(backoff::Error::permanent(e)),
                }
            }
        })
        .await
        .inspect_err(|e| exhausted = e.is_transient());

        match result {
            Ok(()) => {
                self.cache.put(order);
                Ok(())
            }
            Err(e) if exhausted => Err(ServiceError::RetryFailed(e)),
            Err(e) => Err(e.into()),
        }
    }

    /// Cache-through read: a miss fans the four child lookups out
    /// concurrently rather than issuing them one at a time.
    #[instrument(skip(self), fields(order_uid = order_uid))]
    pub async fn get(&self, order_uid: &str) -> Result<Order, ServiceError> {
        if let Some(order) = self.cache.get(order_uid) {
            return Ok(order);
        }

        let order = warn_if_slow(
            "storage_fan_out_get",
            Duration::from_millis(200),
            self.fetch_from_storage(order_uid),
        )
        .await?;

        self.cache.put(order.clone());
        Ok(order)
    }

    /// Each leg of the fan-out runs under its own child span so a slow
    /// individual table read is visible in the trace rather than folded
    /// into the enclosing `get` span's total.
    async fn fetch_from_storage(&self, order_uid: &str) -> Result<Order, ServiceError> {
        let (header, delivery, payment, items) = tokio::try_join!(
            with_retry(|| self.repo.get_order_header(order_uid))
                .instrument(child_span("get_order_header")),
            with_retry(|| self.repo.get_delivery(order_uid)).instrument(child_span("get_delivery")),
            with_retry(|| self.repo.get_payment(order_uid)).instrument(child_span("get_payment")),
            with_retry(|| self.repo.get_items(order_uid)).instrument(child_span("get_items")),
        )?;

        Ok(assemble(header, delivery, payment, items))
    }

    /// Bulk-loads every order from storage into the cache at startup,
    /// again fanning the four table reads out concurrently.
    #[instrument(skip(self))]
    pub async fn warm_up(&self) -> Result<(), ServiceError> {
        let (headers, deliveries, payments, items) = tokio::try_join!(
            with_retry(|| self.repo.get_all_order_headers()),
            with_retry(|| self.repo.get_all_deliveries()),
            with_retry(|| self.repo.get_all_payments()),
            with_retry(|| self.repo.get_all_items()),
        )?;

        let mut deliveries: HashMap<String, Delivery> = deliveries.into_iter().collect();
        let mut payments: HashMap<String, Payment> = payments.into_iter().collect();
        let mut items_by_order: HashMap<String, Vec<Item>> = HashMap::new();
        for (order_uid, item) in items {
            items_by_order.entry(order_uid).or_default().push(item);
        }

        let mut orders = Vec::with_capacity(headers.len());
        for header in headers {
            let delivery = deliveries.remove(&header.order_uid);
            let payment = payments.remove(&header.order_uid);
            let order_items = items_by_order.remove(&header.order_uid);

            match (delivery, payment, order_items) {
                (Some(d), Some(p), Some(i)) if !i.is_empty() => {
                    orders.push(assemble(header, d, p, i));
                }
                _ => {
                    warn!(
                        order_uid = %header.order_uid,
                        "skipping incomplete order during warm-up"
                    );
                }
            }
        }

        let loaded = orders.len();
        self.cache.load(orders);
        info!(loaded, "cache warm-up complete");
        Ok(())
    }
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        if matches!(e, StorageError::NotFound) {
            ServiceError::NotFound
        } else {
            ServiceError::Storage(e)
        }
    }
}

fn assemble(header: OrderHeader, delivery: Delivery, payment: Payment, items: Vec<Item>) -> Order {
    Order {
        order_uid: header.order_uid,
        track_number: header.track_number,
        entry: header.entry,
        delivery,
        payment,
        items,
        locale: header.locale,
        internal_signature: header.internal_signature,
        customer_id: header.customer_id,
        delivery_service: header.delivery_service,
        shardkey: header.shardkey,
        sm_id: header.sm_id,
        date_created: header.date_created,
        oof_shard: header.oof_shard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use domain::{Delivery, Item, Payment};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct MockRepo {
        headers: Mutex<HashMap<String, OrderHeader>>,
        deliveries: Mutex<HashMap<String, Delivery>>,
        payments: Mutex<HashMap<String, Payment>>,
        items: Mutex<HashMap<String, Vec<Item>>>,
        add_calls: AtomicU32,
        fail_adds_with: Mutex<Option<StorageError>>,
    }

    impl MockRepo {
        fn empty() -> Self {
            Self {
                headers: Mutex::new(HashMap::new()),
                deliveries: Mutex::new(HashMap::new()),
                payments: Mutex::new(HashMap::new()),
                items: Mutex::new(HashMap::new()),
                add_calls: AtomicU32::new(0),
                fail_adds_with: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl OrderRepository for MockRepo {
        async fn add(
            &self,
            header: &OrderHeader,
            delivery: &Delivery,
            payment: &Payment,
            items: &[Item],
        ) -> Result<(), StorageError> {
            self.add_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.fail_adds_with.lock().take() {
                return Err(err);
            }
            self.headers
                .lock()
                .insert(header.order_uid.clone(), header.clone());
            self.deliveries
                .lock()
                .insert(header.order_uid.clone(), delivery.clone());
            self.payments
                .lock()
                .insert(header.order_uid.clone(), payment.clone());
            self.items
                .lock()
                .insert(header.order_uid.clone(), items.to_vec());
            Ok(())
        }

        async fn get_order_header(&self, order_uid: &str) -> Result<OrderHeader, StorageError> {
            self.headers
                .lock()
                .get(order_uid)
                .cloned()
                .ok_or(StorageError::NotFound)
        }

        async fn get_delivery(&self, order_uid: &str) -> Result<Delivery, StorageError> {
            self.deliveries
                .lock()
                .get(order_uid)
                .cloned()
                .ok_or(StorageError::NotFound)
        }

        async fn get_payment(&self, order_uid: &str) -> Result<Payment, StorageError> {
            self.payments
                .lock()
                .get(order_uid)
                .cloned()
                .ok_or(StorageError::NotFound)
        }

        async fn get_items(&self, order_uid: &str) -> Result<Vec<Item>, StorageError> {
            self.items
                .lock()
                .get(order_uid)
                .cloned()
                .ok_or(StorageError::NotFound)
        }

        async fn get_all_order_headers(&self) -> Result<Vec<OrderHeader>, StorageError> {
            Ok(self.headers.lock().values().cloned().collect())
        }

        async fn get_all_deliveries(&self) -> Result<Vec<(String, Delivery)>, StorageError> {
            Ok(self
                .deliveries
                .lock()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect())
        }

        async fn get_all_payments(&self) -> Result<Vec<(String, Payment)>, StorageError> {
            Ok(self
                .payments
                .lock()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect())
        }

        async fn get_all_items(&self) -> Result<Vec<(String, Item)>, StorageError> {
            Ok(self
                .items
                .lock()
                .iter()
                .flat_map(|(k, v)| v.iter().map(move |i| (k.clone(), i.clone())))
                .collect())
        }
    }

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

    #[tokio::test]
    async fn add_then_get_round_trips_via_cache() {
        let repo = Arc::new(MockRepo::empty());
        let cache = Arc::new(OrderCache::new(8, Duration::from_secs(60)));
        let service = OrderService::new(repo, cache);

        service.add(sample_order("uid1")).await.unwrap();
        let got = service.get("uid1").await.unwrap();
        assert_eq!(got.order_uid, "uid1");
    }

    #[tokio::test]
    async fn get_falls_back_to_storage_on_cache_miss() {
        let repo = Arc::new(MockRepo::empty());
        let cache = Arc::new(OrderCache::new(8, Duration::from_secs(60)));
        let service = OrderService::new(repo.clone(), cache.clone());

        service.add(sample_order("uid1")).await.unwrap();
        // Evict from cache to force the storage fan-out path.
        let fresh_cache = OrderCache::new(8, Duration::from_secs(60));
        let service = OrderService::new(repo, Arc::new(fresh_cache));

        let got = service.get("uid1").await.unwrap();
        assert_eq!(got.order_uid, "uid1");
    }

    #[tokio::test]
    async fn get_unknown_order_is_not_found() {
        let repo = Arc::new(MockRepo::empty());
        let cache = Arc::new(OrderCache::new(8, Duration::from_secs(60)));
        let service = OrderService::new(repo, cache);

        let err = service.get("nope").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn add_rejects_an_order_with_no_items() {
        let repo = Arc::new(MockRepo::empty());
        let cache = Arc::new(OrderCache::new(8, Duration::from_secs(60)));
        let service = OrderService::new(repo.clone(), cache);

        let mut order = sample_order("uid1");
        order.items.clear();

        let err = service.add(order).await.unwrap_err();
        assert!(matches!(err, ServiceError::IncorrectAggregate));
        assert_eq!(repo.add_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn duplicate_add_is_treated_as_success() {
        let repo = Arc::new(MockRepo::empty());
        *repo.fail_adds_with.lock() = Some(StorageError::OrderExists("uid1".into()));
        let cache = Arc::new(OrderCache::new(8, Duration::from_secs(60)));
        let service = OrderService::new(repo.clone(), cache);

        let result = service.add(sample_order("uid1")).await;
        assert!(result.is_ok());
        assert_eq!(repo.add_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn warm_up_populates_cache_from_storage() {
        let repo = Arc::new(MockRepo::empty());
        repo.add(
            &OrderHeader {
                order_uid: "uid1".into(),
                track_number: "tn".into(),
                entry: "WBIL".into(),
                locale: "en".into(),
                internal_signature: "".into(),
                customer_id: "cust".into(),
                delivery_service: "meest".into(),
                shardkey: "1".into(),
                sm_id: 1,
                date_created: chrono::Utc::now(),
                oof_shard: "1".into(),
            },
            &sample_order("uid1").delivery,
            &sample_order("uid1").payment,
            &sample_order("uid1").items,
        )
        .await
        .unwrap();

        let cache = Arc::new(OrderCache::new(8, Duration::from_secs(60)));
        let service = OrderService::new(repo, cache.clone());

        service.warm_up().await.unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("uid1").is_some());
    }
}
