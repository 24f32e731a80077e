use anyhow::Result;
use slackhook_gateway::{GatewayConfig, dispatcher_builder, run};

#[tokio::main]
async fn main() -> Result<()> {
    slackhook_telemetry::install("slackhook-gateway", env!("CARGO_PKG_VERSION"))?;

    let config = GatewayConfig::from_env()?;
    let dispatcher = dispatcher_builder(&config).build();
    run(config, dispatcher).await
}
