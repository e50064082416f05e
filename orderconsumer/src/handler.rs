use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use backoff::future::retry;
use common::logger::{TraceId, annotate_span, root_span};
use domain::Order;
use orderservice::{OrderService, ServiceError};
use tracing::{Instrument, info, warn};

use crate::dlq::DlqPublisher;
use crate::error::NonRetriableError;

/// The one capability the consumer needs from the service layer. Kept as a
/// trait at this seam so handler tests can swap in a fake without pulling in
/// `orderstorage`.
#[async_trait]
pub trait OrderAdder: Send + Sync {
    async fn add(&self, order: Order) -> Result<(), ServiceError>;
}

#[async_trait]
impl OrderAdder for OrderService {
    async fn add(&self, order: Order) -> Result<(), ServiceError> {
        OrderService::add(self, order).await
    }
}

pub struct MessageHandler {
    adder: Arc<dyn OrderAdder>,
    dlq: Arc<dyn DlqPublisher>,
    topic: String,
}

impl MessageHandler {
    pub fn new(
        adder: Arc<dyn OrderAdder>,
        dlq: Arc<dyn DlqPublisher>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            adder,
            dlq,
            topic: topic.into(),
        }
    }

    /// Decodes, validates, and persists one message. A decode/validation
    /// failure is a poison message — no amount of retrying will fix it, so
    /// it goes straight to the DLQ. A storage failure gets its own retry
    /// budget on top of the one `OrderService::add` already runs internally,
    /// for resilience against outages that outlast a single add's 15s.
    ///
    /// The message key is the correlation id for the whole span tree this
    /// message produces; once the payload decodes, the span is re-annotated
    /// with the order uid it actually carries (the two are the same value on
    /// a well-formed message, but a poison message may never get that far).
    pub async fn handle(&self, key: &str, payload: &[u8], partition: i32, offset: i64) {
        let trace_id = TraceId::new(key.to_string());
        let span = root_span("consume_message", &trace_id);

        async move {
            let order = match domain::decode_and_validate(payload) {
                Ok(order) => order,
                Err(e) => {
                    let err = NonRetriableError::new(e);
                    warn!(error = %err, "message failed validation, routing to DLQ");
                    self.dlq.publish(key, payload, &err.0, &self.topic, partition, offset).await;
                    return;
                }
            };

            annotate_span(&order.order_uid);

            if let Err(e) = self.process_with_retries(order).await {
                warn!(error = %e, "exhausted retries persisting order, routing to DLQ");
                self.dlq
                    .publish(key, payload, &e, &self.topic, partition, offset)
                    .await;
                return;
            }

            info!("order persisted");
        }
        .instrument(span)
        .await
    }

    /// Retries `OrderService::add` on top of the 15s budget it already runs
    /// internally, so a network blip spanning an entire add attempt doesn't
    /// immediately poison the message. Decode/validation failures never
    /// reach here — those are handled by `handle` before this is called.
    ///
    /// The first attempt gets a tighter 5s timeout (the common case: the
    /// store is healthy and this returns well within it); every retry after
    /// that gets the full 15s, since by then something is plausibly slow
    /// rather than just contended.
    async fn process_with_retries(&self, order: Order) -> Result<(), anyhow::Error> {
        let backoff_policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_interval(Duration::from_secs(15))
            .with_max_elapsed_time(Some(Duration::from_secs(30)))
            .build();

        let adder = self.adder.clone();
        let first_attempt = std::sync::atomic::AtomicBool::new(true);
        retry(backoff_policy, move || {
            let adder = adder.clone();
            let order = order.clone();
            let per_attempt_timeout = if first_attempt.swap(false, std::sync::atomic::Ordering::SeqCst) {
                Duration::from_secs(5)
            } else {
                Duration::from_secs(15)
            };
            async move {
                let attempt = tokio::time::timeout(per_attempt_timeout, adder.add(order));
                match attempt.await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(backoff::Error::transient(anyhow::Error::new(e))),
                    Err(_) => Err(backoff::Error::transient(anyhow::anyhow!(
                        "timed out persisting order"
                    ))),
                }
            }
        })
        .await
    }
}
