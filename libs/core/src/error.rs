use thiserror::Error;

/// The embedded interactive `payload` field could not be decoded.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("embedded payload is not a string")]
    NotAString,
    #[error("embedded payload is not valid json: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to encode auth record: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("slack transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("slack api error: {0}")]
    Api(String),
    #[error("missing {0} in slack response")]
    MissingField(&'static str),
    #[error("workspace has no stored bot token")]
    NotInstalled,
}

/// Failure of the `code`-present OAuth path.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("oauth exchange failed: {0}")]
    Exchange(#[source] ClientError),
    #[error("failed to persist installation: {0}")]
    Persist(#[source] StoreError),
}

impl InstallError {
    pub fn stage(&self) -> &'static str {
        match self {
            InstallError::Exchange(_) => "exchange",
            InstallError::Persist(_) => "persist",
        }
    }
}

/// A listener returned an error while handling `event`.
#[derive(Debug, Error)]
#[error("listener for {event:?} failed: {source}")]
pub struct ListenerError {
    pub event: String,
    #[source]
    pub source: anyhow::Error,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
