mod config;
mod http;

use std::sync::Arc;
use std::time::Duration;

use common::logger::init_tracing;
use config::AppConfig;
use ordercache::{OrderCache, spawn_ttl_sweeper};
use orderconsumer::{ConsumerConfig, DlqProducer, MessageHandler};
use orderservice::OrderService;
use orderstorage::{Db, PgOrderStorage};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    tracing::info!("starting order service");

    let cfg = AppConfig::from_env();

    let db = Db::connect(&cfg.database_url, cfg.db_max_connections).await?;
    db.migrate().await?;

    let repo = Arc::new(PgOrderStorage::new(db.pool.clone()));
    let cache = Arc::new(OrderCache::new(
        cfg.cache_capacity,
        Duration::from_secs(cfg.cache_ttl_secs),
    ));

    let service = Arc::new(OrderService::new(repo, cache.clone()));
    service.warm_up().await?;

    let _sweeper = spawn_ttl_sweeper(cache);

    let dlq = Arc::new(DlqProducer::new(&cfg.kafka_brokers, cfg.kafka_dlq_topic.clone())?);
    let handler = Arc::new(MessageHandler::new(service.clone(), dlq, cfg.kafka_topic.clone()));

    let consumer_config = ConsumerConfig {
        brokers: cfg.kafka_brokers.clone(),
        topic: cfg.kafka_topic.clone(),
        group_id: cfg.kafka_group_id.clone(),
        workers: cfg.consumer_workers,
        channel_capacity: cfg.consumer_channel_capacity,
    };

    let shutdown = CancellationToken::new();
    let consumer_shutdown = shutdown.clone();
    let consumer_handle = tokio::spawn(async move {
        if let Err(e) = orderconsumer::run(consumer_config, handler, consumer_shutdown).await {
            tracing::error!(error = %e, "order consumer stopped with an error");
        }
    });

    let app = http::router(service, Duration::from_secs(cfg.http_timeout_secs));
    let listener = tokio::net::TcpListener::bind(&cfg.http_addr).await?;
    tracing::info!(addr = %cfg.http_addr, "http surface listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "http server stopped with an error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    shutdown.cancel();
    if let Err(e) = consumer_handle.await {
        tracing::error!(error = %e, "order consumer task panicked during shutdown");
    }

    Ok(())
}
