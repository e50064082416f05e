use clap::Parser;

#[derive(Debug, Parser)]
#[clap(name = "loadgen", version, about = "Synthetic order producer")]
pub struct Cli {
    /// Kafka bootstrap servers.
    #[clap(long, default_value = "localhost:9092")]
    pub brokers: String,

    /// Topic to produce generated orders to.
    #[clap(long, default_value = "user-events")]
    pub topic: String,

    /// Total number of messages to produce.
    #[clap(long, default_value = "1000")]
    pub count: usize,

    /// Number of concurrent producing workers.
    #[clap(long, default_value = "8")]
    pub workers: usize,

    /// Fraction (0.0-1.0) of produced messages that are deliberately
    /// malformed, to exercise the DLQ path on the consuming side.
    #[clap(long, default_value = "0.05")]
    pub invalid_ratio: f64,
}
