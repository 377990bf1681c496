use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset. Query and connection-pool chatter
/// from sqlx and hyper is kept at `warn`.
const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Install the global fmt subscriber for the service.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt().with_env_filter(filter).with_target(true).init();
}
