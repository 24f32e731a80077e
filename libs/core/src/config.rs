use std::env;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE: &str = "https://slack.com/api";
pub const DEFAULT_AUTHORIZE_URL: &str = "https://slack.com/oauth/v2/authorize";
pub const DEFAULT_SCOPES: &str = "commands,chat:write";

/// Settings read by the dispatcher on every request.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Base URL the browser is sent to after an install attempt.
    pub install_redirect: String,
    /// Shared secret compared against `payload.token`. `None` disables the check.
    pub verification_token: Option<String>,
    /// Skip notification for payloads posted by bots.
    pub ignore_bots: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            install_redirect: String::new(),
            verification_token: None,
            ignore_bots: true,
        }
    }
}

impl DispatcherConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let install_redirect = env::var("INSTALL_REDIRECT").unwrap_or_default();
        let verification_token = non_empty("VERIFICATION_TOKEN");
        let ignore_bots = match env::var("IGNORE_BOTS") {
            Ok(value) => parse_bool("IGNORE_BOTS", &value)?,
            Err(_) => true,
        };
        Ok(Self {
            install_redirect,
            verification_token,
            ignore_bots,
        })
    }

    pub fn with_install_redirect(mut self, url: impl Into<String>) -> Self {
        self.install_redirect = url.into();
        self
    }

    pub fn with_verification_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.verification_token = (!token.is_empty()).then_some(token);
        self
    }

    pub fn with_ignore_bots(mut self, ignore_bots: bool) -> Self {
        self.ignore_bots = ignore_bots;
        self
    }
}

/// Slack app credentials used by [`crate::SlackClient`].
#[derive(Debug, Clone)]
pub struct SlackAppConfig {
    pub client_id: String,
    pub client_secret: String,
    pub scopes: String,
    pub user_scopes: Option<String>,
    pub redirect_uri: Option<String>,
    /// Web API base; `mock://` short-circuits every call.
    pub api_base: String,
    pub authorize_url: String,
}

impl SlackAppConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: DEFAULT_SCOPES.into(),
            user_scopes: None,
            redirect_uri: None,
            api_base: DEFAULT_API_BASE.into(),
            authorize_url: DEFAULT_AUTHORIZE_URL.into(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id =
            non_empty("SLACK_CLIENT_ID").ok_or(ConfigError::Missing("SLACK_CLIENT_ID"))?;
        let client_secret =
            non_empty("SLACK_CLIENT_SECRET").ok_or(ConfigError::Missing("SLACK_CLIENT_SECRET"))?;
        Ok(Self {
            client_id,
            client_secret,
            scopes: non_empty("SLACK_SCOPES").unwrap_or_else(|| DEFAULT_SCOPES.into()),
            user_scopes: non_empty("SLACK_USER_SCOPES"),
            redirect_uri: non_empty("SLACK_REDIRECT_URI"),
            api_base: non_empty("SLACK_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.into()),
            authorize_url: non_empty("SLACK_AUTHORIZE_URL")
                .unwrap_or_else(|| DEFAULT_AUTHORIZE_URL.into()),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn is_mock(&self) -> bool {
        self.api_base.starts_with("mock://")
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

pub(crate) fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}
