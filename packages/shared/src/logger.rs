//! Logging setup for the Tayori binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence. Otherwise both the server library crate and the
/// binary log at `default_log_level`, and `tower_http` request traces are kept
/// at `info` so they don't drown the presence logs.
///
/// # Examples
///
/// ```no_run
/// use tayori_shared::logger::setup_logger;
///
/// setup_logger("tayori_server", "debug");
/// ```
pub fn setup_logger(crate_name: &str, default_log_level: &str) {
    let default_filter = format!(
        "{}={},tower_http=info",
        crate_name.replace('-', "_"),
        default_log_level,
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
