use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::{Offset, TopicPartitionList};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::classify::is_transient_kafka_error;
use crate::handler::MessageHandler;

/// Built by the caller from whatever process-wide configuration it owns
/// (`apiserver::AppConfig::from_env`, in this workspace's one binary) —
/// kept free of its own environment parsing so there's exactly one place
/// defaults for `KAFKA_*`/`CONSUMER_WORKERS` live.
#[derive(Clone, Debug)]
pub struct ConsumerConfig {
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
    pub workers: usize,
    pub channel_capacity: usize,
}

struct ReadMessage {
    key: String,
    payload: Vec<u8>,
    partition: i32,
    offset: i64,
}

/// Reader-loop-to-worker-pool consumer: one task polls the broker and hands
/// each message off to a bounded pool of `workers` handlers, so a slow
/// storage write on one message doesn't stall the whole partition's
/// throughput. Offsets are committed explicitly on the shared consumer
/// handle — once after a handler finishes successfully, once after a
/// poison message is routed to the DLQ — never implicitly via auto-commit.
///
/// `shutdown` is cooperative: cancelling it stops the reader from issuing
/// any further `ReadMessage` calls, closes the channel, and lets the worker
/// pool drain whatever it already has in flight (subject to the handler's
/// own per-attempt timeouts) before this returns. No other error the reader
/// observes is treated as fatal — broker hiccups and unrecognized errors
/// alike are logged and retried, since a consumer that gives up on its own
/// is worse than one that keeps polling a broker that comes back.
pub async fn run(
    config: ConsumerConfig,
    handler: Arc<MessageHandler>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let consumer: Arc<StreamConsumer> = Arc::new(
        ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .create()?,
    );

    consumer.subscribe(&[config.topic.as_str()])?;

    let (tx, rx) = tokio::sync::mpsc::channel::<ReadMessage>(config.channel_capacity);
    let rx = Arc::new(tokio::sync::Mutex::new(rx));
    let mut worker_handles = Vec::with_capacity(config.workers);

    for id in 0..config.workers {
        let handler = handler.clone();
        let rx = rx.clone();
        let consumer = consumer.clone();
        let topic = config.topic.clone();

        worker_handles.push(tokio::spawn(async move {
            loop {
                let msg = { rx.lock().await.recv().await };
                let Some(msg) = msg else { break };

                handler
                    .handle(&msg.key, &msg.payload, msg.partition, msg.offset)
                    .await;

                if let Err(e) = consumer.commit_partition(
                    &topic_partition(&topic, msg.partition, msg.offset),
                    CommitMode::Async,
                ) {
                    warn!(worker = id, error = %e, "failed to commit offset");
                }
            }
        }));
    }

    let mut backoff_ms: f64 = 500.0;
    const MAX_BACKOFF_MS: f64 = 5_000.0;
    const BACKOFF_MULTIPLIER: f64 = 1.7;
    const FLAT_RETRY: Duration = Duration::from_secs(1);

    let mut stream = consumer.stream();
    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("shutdown requested, reader loop exiting");
                break;
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(msg)) => {
                backoff_ms = 500.0;

                let key = msg
                    .key()
                    .map(|k| String::from_utf8_lossy(k).into_owned())
                    .unwrap_or_default();
                let payload = msg.payload().unwrap_or_default().to_vec();
                let partition = msg.partition();
                let offset = msg.offset();

                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        info!("shutdown requested, reader loop exiting");
                        break;
                    }
                    result = tx.send(ReadMessage { key, payload, partition, offset }) => {
                        if result.is_err() {
                            error!("worker pool channel closed, stopping consumer");
                            break;
                        }
                    }
                }
            }
            Some(Err(e)) if is_transient_kafka_error(&e) => {
                warn!(error = %e, backoff_ms, "transient kafka error, backing off");
                tokio::time::sleep(Duration::from_millis(backoff_ms as u64)).await;
                backoff_ms = (backoff_ms * BACKOFF_MULTIPLIER).min(MAX_BACKOFF_MS);
            }
            Some(Err(e)) => {
                warn!(error = %e, "unrecognized kafka consumer error, retrying");
                tokio::time::sleep(FLAT_RETRY).await;
            }
            None => {
                info!("kafka stream ended");
                break;
            }
        }
    }

    drop(tx);
    for handle in worker_handles {
        let _ = handle.await;
    }

    Ok(())
}

fn topic_partition(topic: &str, partition: i32, offset: i64) -> TopicPartitionList {
    let mut tpl = TopicPartitionList::new();
    tpl.add_partition_offset(topic, partition, Offset::Offset(offset + 1))
        .expect("partition and offset are always valid here");
    tpl
}
