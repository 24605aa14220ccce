use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialize tracing - safe to call multiple times
///
/// `production` gets JSON lines, anything else gets the pretty formatter.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(env: &str, service: &str) {
    INIT.call_once(|| {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

        // try_init: a test harness or host may already own the global subscriber
        let installed = if env == "production" {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .with(env_filter)
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .with(env_filter)
                .try_init()
        };

        if installed.is_ok() {
            tracing::info!(service = %service, env = %env, "Tracing initialized");
        }
    });
}
