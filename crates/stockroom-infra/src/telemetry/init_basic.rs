use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set
pub fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stockroom=debug,tower_http=debug".into())
}

/// Install the global tracing subscriber.
///
/// Production environments log JSON lines (with the active span fields); everything
/// else gets the human-readable formatter.
pub fn init_telemetry(environment: &str) -> Result<(), Box<dyn std::error::Error>> {
    let production = matches!(environment.to_lowercase().as_str(), "production" | "prod");

    let json = production.then(|| fmt::layer().json().with_current_span(true));
    let pretty = (!production).then(fmt::layer);

    tracing_subscriber::registry()
        .with(default_filter())
        .with(json)
        .with(pretty)
        .try_init()?;

    tracing::info!(environment = %environment, json = production, "Tracing initialized");
    Ok(())
}

pub async fn shutdown_telemetry() {
    tracing::debug!("Telemetry shutdown");
}
