use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::auth::AuthRecord;
use crate::bot::BotHandle;
use crate::config::SlackAppConfig;
use crate::error::ClientError;
use crate::event::OAuthQuery;
use crate::payload::Payload;

pub type SharedOutboundClient = Arc<dyn OutboundClient>;

/// Outbound side of the Slack app: OAuth and reply handles.
#[async_trait]
pub trait OutboundClient: Send + Sync {
    /// URL the user is redirected to when starting an install.
    fn auth_url(&self, query: &OAuthQuery) -> String;

    /// Exchanges the OAuth `code` in `query` for workspace credentials.
    async fn install(&self, query: &OAuthQuery) -> Result<AuthRecord, ClientError>;

    fn bot(&self, auth: Option<&AuthRecord>, payload: &Payload) -> BotHandle;
}

/// [`OutboundClient`] backed by the Slack Web API.
pub struct SlackClient {
    http: reqwest::Client,
    config: SlackAppConfig,
}

impl SlackClient {
    pub fn new(config: SlackAppConfig) -> Self {
        Self::with_http(reqwest::Client::new(), config)
    }

    pub fn with_http(http: reqwest::Client, config: SlackAppConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &SlackAppConfig {
        &self.config
    }
}

#[async_trait]
impl OutboundClient for SlackClient {
    fn auth_url(&self, query: &OAuthQuery) -> String {
        let mut authorize = format!(
            "{}?client_id={}&scope={}",
            self.config.authorize_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.scopes),
        );
        if let Some(user_scope) = &self.config.user_scopes {
            authorize.push_str("&user_scope=");
            authorize.push_str(&urlencoding::encode(user_scope));
        }
        if let Some(redirect_uri) = &self.config.redirect_uri {
            authorize.push_str("&redirect_uri=");
            authorize.push_str(&urlencoding::encode(redirect_uri));
        }
        if let Some(state) = query.state() {
            authorize.push_str("&state=");
            authorize.push_str(&urlencoding::encode(state));
        }
        authorize
    }

    async fn install(&self, query: &OAuthQuery) -> Result<AuthRecord, ClientError> {
        let code = query.code().ok_or(ClientError::MissingField("code"))?;

        if self.config.is_mock() {
            let mut record = AuthRecord::new("T123", "xoxb-mock");
            record.scope = Some(self.config.scopes.clone());
            return Ok(record);
        }

        let url = format!(
            "{}/oauth.v2.access",
            self.config.api_base.trim_end_matches('/')
        );
        let mut params = vec![
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
        ];
        if let Some(redirect_uri) = &self.config.redirect_uri {
            params.push(("redirect_uri", redirect_uri.as_str()));
        }

        let body: OauthAccessResponse = self
            .http
            .post(&url)
            .form(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        body.into_record()
    }

    fn bot(&self, auth: Option<&AuthRecord>, payload: &Payload) -> BotHandle {
        BotHandle::new(self.http.clone(), self.config.api_base.clone(), auth, payload)
    }
}

#[derive(Debug, Deserialize)]
struct OauthAccessResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    bot_user_id: Option<String>,
    #[serde(default)]
    app_id: Option<String>,
    #[serde(default)]
    team: Option<IdName>,
    #[serde(default)]
    enterprise: Option<IdName>,
    #[serde(default)]
    authed_user: Option<IdName>,
    #[serde(default)]
    incoming_webhook: Option<IncomingWebhook>,
}

#[derive(Debug, Deserialize)]
struct IdName {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IncomingWebhook {
    #[serde(default)]
    url: Option<String>,
}

impl OauthAccessResponse {
    fn into_record(self) -> Result<AuthRecord, ClientError> {
        if !self.ok {
            return Err(ClientError::Api(
                self.error.unwrap_or_else(|| "slack oauth failed".into()),
            ));
        }
        let (team_id, team_name) = match self.team {
            Some(IdName { id: Some(id), name }) => (id, name),
            _ => return Err(ClientError::MissingField("team.id")),
        };
        let access_token = self
            .access_token
            .ok_or(ClientError::MissingField("access_token"))?;

        let mut record = AuthRecord::new(team_id, access_token);
        record.team_name = team_name;
        record.token_type = self.token_type;
        record.scope = self.scope;
        record.bot_user_id = self.bot_user_id;
        record.app_id = self.app_id;
        record.enterprise_id = self.enterprise.and_then(|e| e.id);
        record.authed_user_id = self.authed_user.and_then(|u| u.id);
        record.incoming_webhook_url = self.incoming_webhook.and_then(|w| w.url);
        Ok(record)
    }
}
