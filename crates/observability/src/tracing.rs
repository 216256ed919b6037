//! Tracing/logging initialization.
//!
//! Inventory operations run inside `#[instrument]` spans; each log line
//! carries the fields of the span it was emitted from (`product_id`, `name`,
//! ...), and a closing event per span records how long the operation took.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Filter used when `RUST_LOG` is unset or unparsable.
///
/// sqlx logs every statement at `info`; keep only its slow-query warnings.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}
