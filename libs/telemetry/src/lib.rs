//! Tracing setup shared by slackhook services.
//! Builds a `tracing-subscriber` registry from environment configuration
//! and offers a couple of span helpers used by the dispatcher.

use anyhow::Result;
use tracing::Span;

mod config;
mod tracing_init;

pub use config::{LogFormat, TelemetryConfig};
pub use tracing_init::{init_telemetry, telemetry_initialised};

/// Installs the subscriber configured from `RUST_LOG` and `LOG_FORMAT`.
///
/// Pass the calling crate's `env!("CARGO_PKG_VERSION")` as `service_version`.
pub fn install(service_name: &str, service_version: &str) -> Result<()> {
    init_telemetry(TelemetryConfig::from_env(service_name, service_version))
}

/// Records the workspace and listener event on a span declared with those fields.
pub fn with_common_fields(span: &Span, workspace_id: Option<&str>, event: Option<&str>) {
    if let Some(workspace_id) = workspace_id {
        span.record("workspace_id", tracing::field::display(workspace_id));
    }
    if let Some(event) = event {
        span.record("event", tracing::field::display(event));
    }
}
