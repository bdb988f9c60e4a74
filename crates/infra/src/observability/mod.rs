//! Logging and tracing initialization
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and either
//! human-readable or JSON-lines output. `RUST_LOG` takes precedence over the
//! configured level so a single run can be made more verbose without touching
//! configuration.
//!
//! Tokens never reach the logs: credential types redact themselves in `Debug`
//! and `Display`, and the API client only records method, path and status.

use dropdoko_domain::constants::DEFAULT_LOG_LEVEL;
use dropdoko_domain::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// Returns `false` if a global subscriber was already installed (by an
/// earlier call or by the host application), in which case nothing changes.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = build_filter(config);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(true)).try_init()
    };

    installed.is_ok()
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}
