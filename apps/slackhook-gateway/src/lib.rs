pub mod config;
pub mod http;
pub mod signature;

use std::sync::Arc;

use anyhow::Result;
use axum::serve;
use slackhook_core::{
    Dispatcher, DispatcherBuilder, Emission, MemoryCredentialStore, SlackClient, WILDCARD,
    listener_fn,
};
use tokio::net::TcpListener;
use tracing::info;

pub use crate::config::GatewayConfig;
pub use crate::http::{GatewayState, build_router};

/// Dispatcher builder wired with the Slack Web API client, an in-memory
/// credential store and a wildcard listener that logs every emission.
pub fn dispatcher_builder(config: &GatewayConfig) -> DispatcherBuilder {
    Dispatcher::builder(Arc::new(SlackClient::new(config.slack.clone())))
        .config(config.dispatcher.clone())
        .store(Arc::new(MemoryCredentialStore::new()))
        .on(WILDCARD, listener_fn(log_emission))
}

fn log_emission(event: &str, emission: &Emission<'_>) -> anyhow::Result<()> {
    match emission {
        Emission::Message { payload, .. } => info!(
            event,
            kind = payload.kind().as_str(),
            workspace_id = payload.workspace_id().unwrap_or_default(),
            "slack notification"
        ),
        Emission::InstallSuccess { query } => {
            info!(event, state = query.state().unwrap_or_default(), "slack install succeeded")
        }
        Emission::InstallError { error, .. } => {
            info!(event, error = %error, "slack install failed")
        }
    }
    Ok(())
}

/// Serves the dispatcher until ctrl-c.
pub async fn run(config: GatewayConfig, dispatcher: Dispatcher) -> Result<()> {
    let state = GatewayState {
        dispatcher,
        signing_secret: config.signing_secret.clone(),
    };
    let router = build_router(state, &config.path);
    let listener = TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, path = %config.path, "slackhook-gateway listening");

    serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
