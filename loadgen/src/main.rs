mod cli;
mod generator;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use clap::Parser;
use rdkafka::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    common::logger::init_tracing(false);

    let cli = Cli::parse();

    let producer: FutureProducer = ClientConfig::new()
        .set("bootstrap.servers", &cli.brokers)
        .set("message.timeout.ms", "5000")
        .create()?;
    let producer = Arc::new(producer);

    let produced = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::with_capacity(cli.workers);

    let per_worker = cli.count.div_ceil(cli.workers);
    let total = cli.count;

    for worker_id in 0..cli.workers {
        let producer = producer.clone();
        let produced = produced.clone();
        let topic = cli.topic.clone();
        let invalid_ratio = cli.invalid_ratio;

        handles.push(tokio::spawn(async move {
            let mut rng = rand::thread_rng();

            for _ in 0..per_worker {
                let n = produced.fetch_add(1, Ordering::SeqCst);
                if n >= total {
                    break;
                }

                let (key, payload) = if rand::Rng::gen_bool(&mut rng, invalid_ratio) {
                    ("poison".to_string(), generator::random_invalid_payload(&mut rng))
                } else {
                    let order = generator::random_valid_order(&mut rng);
                    let key = order.order_uid.clone();
                    (key, serde_json::to_vec(&order).expect("order dto always serializes"))
                };

                let record = FutureRecord::to(&topic).key(&key).payload(&payload);
                if let Err((e, _)) = producer.send(record, Timeout::After(Duration::from_secs(5))).await {
                    tracing::warn!(worker_id, error = %e, "failed to produce message");
                }
            }
        }));
    }

    for handle in handles {
        handle.await?;
    }

    tracing::info!(produced = produced.load(Ordering::SeqCst), "load generation complete");
    Ok(())
}
