//! Shared tracing setup used by every binary in the workspace.
//!
//! One `init_tracing` call per process, pretty output in development and
//! JSON when `APP_ENV=production`, matching how each service in this
//! workspace is expected to run under a log aggregator in prod.

use once_cell::sync::OnceCell;
use std::time::Duration;
use tracing::{Span, field};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Correlation id that follows a request, broker message, or batch through
/// its processing span.
#[derive(Clone, Debug)]
pub struct TraceId(String);

impl TraceId {
    pub fn new(v: impl Into<String>) -> Self {
        Self(v.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Initializes the global tracing subscriber. Safe to call more than once;
/// only the first call takes effect.
pub fn init_tracing(json: bool) {
    LOGGER_INIT.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let base = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_file(true)
            .with_span_events(fmt::format::FmtSpan::CLOSE);

        if json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(base.json())
                .init();
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(base.pretty())
                .init();
        }
    });
}

pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "root",
        name = %name,
        trace_id = %trace_id.as_str(),
        order_uid = field::Empty,
    )
}

pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!("child", name = %name, order_uid = field::Empty)
}

pub fn annotate_span(order_uid: &str) {
    let span = Span::current();
    span.record("order_uid", field::display(order_uid));
}

/// Runs `fut`, logging a warning if it takes longer than `max`. Used to flag
/// slow storage round-trips without failing the call.
pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = std::time::Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
