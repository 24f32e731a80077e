//! Named listeners and what they receive.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::bot::BotHandle;
use crate::error::{InstallError, ListenerError};
use crate::event::OAuthQuery;
use crate::payload::Payload;
use crate::store::CredentialStore;

/// Arguments delivered with a listener event.
pub enum Emission<'a> {
    /// A classified inbound payload.
    Message {
        payload: &'a Payload,
        bot: &'a BotHandle,
        store: &'a dyn CredentialStore,
    },
    InstallSuccess {
        query: &'a OAuthQuery,
    },
    InstallError {
        error: &'a InstallError,
        query: &'a OAuthQuery,
    },
}

impl Emission<'_> {
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Emission::Message { payload, .. } => Some(payload),
            _ => None,
        }
    }

    pub fn bot(&self) -> Option<&BotHandle> {
        match self {
            Emission::Message { bot, .. } => Some(bot),
            _ => None,
        }
    }

    pub fn query(&self) -> Option<&OAuthQuery> {
        match self {
            Emission::InstallSuccess { query } | Emission::InstallError { query, .. } => {
                Some(query)
            }
            Emission::Message { .. } => None,
        }
    }
}

#[async_trait]
pub trait Listener: Send + Sync {
    /// `event` is the name the listener was reached through, so a wildcard
    /// listener can tell emissions apart.
    async fn on_emit(&self, event: &str, emission: &Emission<'_>) -> anyhow::Result<()>;
}

/// Adapts a synchronous closure into a [`Listener`].
pub struct FnListener<F>(F);

#[async_trait]
impl<F> Listener for FnListener<F>
where
    F: Fn(&str, &Emission<'_>) -> anyhow::Result<()> + Send + Sync,
{
    async fn on_emit(&self, event: &str, emission: &Emission<'_>) -> anyhow::Result<()> {
        (self.0)(event, emission)
    }
}

pub fn listener_fn<F>(f: F) -> Arc<dyn Listener>
where
    F: Fn(&str, &Emission<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(FnListener(f))
}

/// Listeners by event name, kept in registration order.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: HashMap<String, Vec<Arc<dyn Listener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, event: impl Into<String>, listener: Arc<dyn Listener>) {
        self.listeners.entry(event.into()).or_default().push(listener);
    }

    pub fn listeners(&self, event: &str) -> &[Arc<dyn Listener>] {
        self.listeners
            .get(event)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners(event).len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.values().all(Vec::is_empty)
    }

    /// Calls every listener for `event` in order, stopping at the first error.
    pub async fn emit(&self, event: &str, emission: &Emission<'_>) -> Result<(), ListenerError> {
        for listener in self.listeners(event) {
            listener
                .on_emit(event, emission)
                .await
                .map_err(|source| ListenerError {
                    event: event.to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}
