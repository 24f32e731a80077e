//! Transport-normalised requests handed to the dispatcher.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    /// Anything else. The dispatcher ignores it.
    Other(String),
}

impl Method {
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            _ => Method::Other(method.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Other(other) => other.as_str(),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query string of an OAuth request (`code`, `state`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OAuthQuery(BTreeMap<String, String>);

impl OAuthQuery {
    pub fn new(params: BTreeMap<String, String>) -> Self {
        Self(params)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// The authorization code. Empty values count as absent.
    pub fn code(&self) -> Option<&str> {
        self.get("code").filter(|code| !code.is_empty())
    }

    pub fn state(&self) -> Option<&str> {
        self.get("state")
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

impl<K, V> FromIterator<(K, V)> for OAuthQuery
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub method: Method,
    pub query: OAuthQuery,
    pub body: Option<Value>,
}

impl InboundEvent {
    pub fn get(query: OAuthQuery) -> Self {
        Self {
            method: Method::Get,
            query,
            body: None,
        }
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::Post,
            query: OAuthQuery::default(),
            body: Some(body),
        }
    }

    pub fn other(method: impl Into<String>) -> Self {
        Self {
            method: Method::Other(method.into()),
            query: OAuthQuery::default(),
            body: None,
        }
    }
}
