use serde_json::{Value, json};

use crate::auth::AuthRecord;
use crate::error::ClientError;
use crate::payload::Payload;

/// Reply handle given to listeners, bound to one workspace and one payload.
#[derive(Debug, Clone)]
pub struct BotHandle {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
    channel: Option<String>,
    response_url: Option<String>,
}

impl BotHandle {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        auth: Option<&AuthRecord>,
        payload: &Payload,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            token: auth.map(|auth| auth.access_token.clone()),
            channel: payload.channel(),
            response_url: payload.response_url(),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    pub fn response_url(&self) -> Option<&str> {
        self.response_url.as_deref()
    }

    fn is_mock(&self) -> bool {
        self.api_base.starts_with("mock://")
    }

    fn build_url(&self, method: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            method.trim_start_matches('/')
        )
    }

    /// Calls a Web API method with the workspace bot token.
    pub async fn call(&self, method: &str, body: Value) -> Result<Value, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotInstalled)?;

        if self.is_mock() {
            return Ok(json!({ "ok": true, "method": method, "request": body }));
        }

        let raw: Value = self
            .http
            .post(self.build_url(method))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !raw.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let error = raw
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            return Err(ClientError::Api(error.to_string()));
        }
        Ok(raw)
    }

    /// Posts `text` to the channel the payload came from.
    pub async fn say(&self, text: &str) -> Result<Value, ClientError> {
        let channel = self
            .channel
            .as_deref()
            .ok_or(ClientError::MissingField("channel"))?;
        self.call("chat.postMessage", json!({ "channel": channel, "text": text }))
            .await
    }

    /// Answers through the payload's `response_url` (slash commands, interactive messages).
    pub async fn respond(&self, message: Value) -> Result<(), ClientError> {
        let url = self
            .response_url
            .as_deref()
            .ok_or(ClientError::MissingField("response_url"))?;

        if self.is_mock() {
            tracing::debug!(%url, "mock response_url reply");
            return Ok(());
        }

        self.http
            .post(url)
            .json(&message)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
