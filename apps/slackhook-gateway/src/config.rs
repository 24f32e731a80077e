use std::net::SocketAddr;

use anyhow::{Context, Result};
use slackhook_core::{DispatcherConfig, SlackAppConfig};

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub addr: SocketAddr,
    /// Route serving both the OAuth (GET) and event (POST) callbacks.
    pub path: String,
    pub signing_secret: Option<String>,
    pub dispatcher: DispatcherConfig,
    pub slack: SlackAppConfig,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let addr = std::env::var("BIND")
            .unwrap_or_else(|_| "0.0.0.0:8090".into())
            .parse()
            .context("invalid BIND address")?;
        let path = std::env::var("SLACKHOOK_PATH").unwrap_or_else(|_| "/slack".into());
        let signing_secret = std::env::var("SLACK_SIGNING_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        Ok(Self {
            addr,
            path: normalize_path(&path),
            signing_secret,
            dispatcher: DispatcherConfig::from_env()?,
            slack: SlackAppConfig::from_env()?,
        })
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".into()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
