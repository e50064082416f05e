#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Postgres connection string, assembled from the `DSN_*` components.
    pub database_url: String,
    /// Max connections held in the Postgres pool.
    pub db_max_connections: u32,

    // =========================
    // Cache configuration
    // =========================
    /// Maximum number of orders held in the in-memory cache. A value of 0
    /// is clamped to 1 by the cache itself.
    pub cache_capacity: usize,
    /// Both the per-entry lifetime and the sweep period of the cache —
    /// there is no separate hardcoded TTL distinct from this value.
    pub cache_ttl_secs: u64,

    // =========================
    // Broker configuration
    // =========================
    pub kafka_brokers: String,
    pub kafka_topic: String,
    pub kafka_group_id: String,
    pub kafka_dlq_topic: String,
    /// Size of the worker pool the consumer hands decoded messages to.
    pub consumer_workers: usize,
    pub consumer_channel_capacity: usize,

    // =========================
    // HTTP configuration
    // =========================
    pub http_addr: String,
    pub http_timeout_secs: u64,
    pub http_idle_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let dsn_host = std::env::var("DSN_HOST").unwrap_or_else(|_| "localhost".into());
        let dsn_port = std::env::var("DSN_PORT").unwrap_or_else(|_| "5432".into());
        let dsn_user = std::env::var("DSN_USER").unwrap_or_else(|_| "admin".into());
        let dsn_password = std::env::var("DSN_PASSWORD").unwrap_or_else(|_| "adm_123".into());
        let dsn_name = std::env::var("DSN_NAME").unwrap_or_else(|_| "myapp".into());

        Self {
            database_url: format!(
                "postgres://{dsn_user}:{dsn_password}@{dsn_host}:{dsn_port}/{dsn_name}"
            ),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 16),

            cache_capacity: env_parse("CACHE_CAPACITY", 10),
            cache_ttl_secs: env_parse("CACHE_TTL", 60),

            kafka_brokers: std::env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".into()),
            kafka_topic: std::env::var("KAFKA_TOPIC").unwrap_or_else(|_| "user-events".into()),
            kafka_group_id: std::env::var("KAFKA_GROUP_ID")
                .unwrap_or_else(|_| "user-api-group".into()),
            kafka_dlq_topic: std::env::var("KAFKA_DLQ_TOPIC")
                .unwrap_or_else(|_| "user-events-dlq".into()),
            consumer_workers: env_parse("CONSUMER_WORKERS", 100),
            consumer_channel_capacity: env_parse("CONSUMER_CHANNEL_CAPACITY", 256),

            http_addr: std::env::var("HTTP_ADDR").unwrap_or_else(|_| "localhost:8081".into()),
            http_timeout_secs: env_parse("HTTP_TIMEOUT", 4),
            http_idle_timeout_secs: env_parse("HTTP_IDLE_TIMEOUT", 60),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
