//! Classification of inbound Slack payloads.
//!
//! A POST body may be an Events API envelope, a URL verification challenge, a
//! slash command, an outgoing-webhook trigger or an interactive message
//! callback. Interactive callbacks arrive form-encoded with the real payload
//! serialized into a `payload` field. [`Payload::from_body`] unwraps that
//! field, resolves the workspace id and computes the discriminant once.

use serde_json::Value;

use crate::error::PayloadError;

/// Listener name that receives every emission.
pub const WILDCARD: &str = "*";
pub const EVENT: &str = "event";
pub const SLASH_COMMAND: &str = "slash_command";
pub const WEBHOOK: &str = "webhook";
pub const INTERACTIVE_MESSAGE: &str = "interactive_message";
pub const INSTALL_SUCCESS: &str = "install_success";
pub const INSTALL_ERROR: &str = "install_error";

/// Primary shape of a payload, checked in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadKind {
    Challenge,
    EventEnvelope { event_type: Option<String> },
    SlashCommand { command: String },
    WebhookTrigger { trigger_word: String },
    InteractiveMessage { callback_id: String },
    Unclassified,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Challenge => "challenge",
            PayloadKind::EventEnvelope { .. } => "event_envelope",
            PayloadKind::SlashCommand { .. } => "slash_command",
            PayloadKind::WebhookTrigger { .. } => "webhook_trigger",
            PayloadKind::InteractiveMessage { .. } => "interactive_message",
            PayloadKind::Unclassified => "unclassified",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    raw: Value,
    embedded: bool,
    workspace_id: Option<String>,
    token: Option<String>,
    challenge: Option<String>,
    bot_id: Option<String>,
    type_name: Option<String>,
    event: Option<Option<String>>,
    command: Option<String>,
    trigger_word: Option<String>,
    callback_id: Option<String>,
    kind: PayloadKind,
}

impl Payload {
    /// Builds the effective payload from a POST body.
    pub fn from_body(body: Value) -> Result<Self, PayloadError> {
        let embedded = match body.get("payload") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => {
                Some(serde_json::from_str::<Value>(s).map_err(PayloadError::InvalidJson)?)
            }
            Some(value @ Value::Object(_)) => Some(value.clone()),
            Some(_) => return Err(PayloadError::NotAString),
        };

        Ok(match embedded {
            Some(inner) => {
                let workspace_id = inner.get("team").and_then(|team| text(team, "id"));
                Self::classify(inner, true, workspace_id)
            }
            None => {
                let workspace_id = text(&body, "team_id");
                Self::classify(body, false, workspace_id)
            }
        })
    }

    fn classify(raw: Value, embedded: bool, workspace_id: Option<String>) -> Self {
        let event = raw
            .get("event")
            .filter(|event| truthy(event))
            .map(|event| text(event, "type"));
        // Events API envelopes carry the bot marker on the inner event.
        let bot_id = match raw.get("event").filter(|event| truthy(event)) {
            Some(event) => text(event, "bot_id"),
            None => text(&raw, "bot_id"),
        };
        let challenge = text(&raw, "challenge");
        let command = text(&raw, "command");
        let trigger_word = text(&raw, "trigger_word");
        let callback_id = text(&raw, "callback_id");

        let kind = if challenge.is_some() {
            PayloadKind::Challenge
        } else if let Some(event_type) = &event {
            PayloadKind::EventEnvelope {
                event_type: event_type.clone(),
            }
        } else if let Some(command) = &command {
            PayloadKind::SlashCommand {
                command: command.clone(),
            }
        } else if let Some(trigger_word) = &trigger_word {
            PayloadKind::WebhookTrigger {
                trigger_word: trigger_word.clone(),
            }
        } else if let Some(callback_id) = &callback_id {
            PayloadKind::InteractiveMessage {
                callback_id: callback_id.clone(),
            }
        } else {
            PayloadKind::Unclassified
        };

        Self {
            token: text(&raw, "token"),
            type_name: text(&raw, "type"),
            raw,
            embedded,
            workspace_id,
            challenge,
            bot_id,
            event,
            command,
            trigger_word,
            callback_id,
            kind,
        }
    }

    /// Listener names this payload is delivered to, in emission order.
    ///
    /// The wildcard always comes first; each remaining rule applies on its own,
    /// so an Events API envelope yields its `type` as well as `event`.
    pub fn listener_events(&self) -> Vec<String> {
        let mut events = vec![WILDCARD.to_string()];
        if let Some(type_name) = &self.type_name {
            events.push(type_name.clone());
        }
        if let Some(event_type) = &self.event {
            events.push(EVENT.to_string());
            if let Some(event_type) = event_type {
                events.push(event_type.clone());
            }
        }
        if let Some(command) = &self.command {
            events.push(SLASH_COMMAND.to_string());
            events.push(command.clone());
        }
        if let Some(trigger_word) = &self.trigger_word {
            events.push(WEBHOOK.to_string());
            events.push(trigger_word.clone());
        }
        if let Some(callback_id) = &self.callback_id {
            events.push(INTERACTIVE_MESSAGE.to_string());
            events.push(callback_id.clone());
        }
        events
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }

    pub fn kind(&self) -> &PayloadKind {
        &self.kind
    }

    /// True when the payload was unwrapped from a form-encoded `payload` field.
    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    pub fn workspace_id(&self) -> Option<&str> {
        self.workspace_id.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn challenge(&self) -> Option<&str> {
        self.challenge.as_deref()
    }

    pub fn bot_id(&self) -> Option<&str> {
        self.bot_id.as_deref()
    }

    pub fn is_from_bot(&self) -> bool {
        self.bot_id.is_some()
    }

    pub fn response_url(&self) -> Option<String> {
        text(&self.raw, "response_url")
    }

    /// Channel the payload originated from, across the supported shapes.
    pub fn channel(&self) -> Option<String> {
        text(&self.raw, "channel_id")
            .or_else(|| self.raw.get("channel").and_then(|c| text(c, "id")))
            .or_else(|| self.raw.get("event").and_then(|e| text(e, "channel")))
            .or_else(|| text(&self.raw, "channel"))
    }
}

fn text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
