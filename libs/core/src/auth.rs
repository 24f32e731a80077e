use serde::{Deserialize, Serialize};

/// Stored credentials for one installed Slack workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRecord {
    pub team_id: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authed_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_webhook_url: Option<String>,
}

impl AuthRecord {
    pub fn new(team_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            access_token: access_token.into(),
            team_name: None,
            token_type: None,
            scope: None,
            bot_user_id: None,
            app_id: None,
            enterprise_id: None,
            authed_user_id: None,
            incoming_webhook_url: None,
        }
    }

    /// Workspace id the record is stored under.
    pub fn workspace_id(&self) -> &str {
        &self.team_id
    }
}
