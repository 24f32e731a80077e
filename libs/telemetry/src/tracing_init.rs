use std::sync::OnceLock;

use anyhow::Result;
use tracing_subscriber::layer::Layer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::TelemetryConfig;

static INIT: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_telemetry(cfg: TelemetryConfig) -> Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let fmt_layer = if cfg.json_logs() {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.default_filter.as_str()));

    // A subscriber may already be installed by the embedding application or a test harness.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .ok();

    INIT.set(()).ok();
    tracing::debug!(
        service = %cfg.service_name,
        version = %cfg.service_version,
        "telemetry initialised"
    );
    Ok(())
}

pub fn telemetry_initialised() -> bool {
    INIT.get().is_some()
}
