//! Request routing, OAuth installation and listener fan-out.

use std::sync::Arc;

use metrics::counter;
use serde_json::Value;
use slackhook_telemetry::with_common_fields;
use subtle::ConstantTimeEq;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, instrument, warn};

use crate::auth::AuthRecord;
use crate::client::SharedOutboundClient;
use crate::config::DispatcherConfig;
use crate::error::{InstallError, ListenerError};
use crate::event::{InboundEvent, Method, OAuthQuery};
use crate::listener::{Emission, Listener, ListenerRegistry};
use crate::payload::{INSTALL_ERROR, INSTALL_SUCCESS, Payload, WILDCARD};
use crate::store::{MemoryCredentialStore, SharedCredentialStore};

/// Response the transport should send back to Slack or the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Redirect(String),
    /// Redirect carrying `state` and a serialized error.
    InstallFailed { location: String },
    Unauthorized,
    /// Echo of a URL verification challenge.
    Challenge(String),
    Ack,
    BadRequest(String),
}

/// A reply plus the notification task it started, if any.
///
/// The reply never depends on `delivery`; await it only to observe completion.
#[derive(Debug)]
pub struct Handled {
    pub reply: Reply,
    pub delivery: Option<JoinHandle<()>>,
}

impl Handled {
    fn reply(reply: Reply) -> Self {
        Self {
            reply,
            delivery: None,
        }
    }
}

struct Inner {
    config: DispatcherConfig,
    store: SharedCredentialStore,
    client: SharedOutboundClient,
    listeners: ListenerRegistry,
}

#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

pub struct DispatcherBuilder {
    config: DispatcherConfig,
    store: Option<SharedCredentialStore>,
    client: SharedOutboundClient,
    listeners: ListenerRegistry,
}

impl DispatcherBuilder {
    pub fn new(client: SharedOutboundClient) -> Self {
        Self {
            config: DispatcherConfig::default(),
            store: None,
            client,
            listeners: ListenerRegistry::new(),
        }
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Defaults to [`MemoryCredentialStore`].
    pub fn store(mut self, store: SharedCredentialStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn on(mut self, event: impl Into<String>, listener: Arc<dyn Listener>) -> Self {
        self.listeners.register(event, listener);
        self
    }

    pub fn build(self) -> Dispatcher {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new()));
        Dispatcher {
            inner: Arc::new(Inner {
                config: self.config,
                store,
                client: self.client,
                listeners: self.listeners,
            }),
        }
    }
}

impl Dispatcher {
    pub fn builder(client: SharedOutboundClient) -> DispatcherBuilder {
        DispatcherBuilder::new(client)
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &SharedCredentialStore {
        &self.inner.store
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.inner.listeners
    }

    /// Routes GET to the OAuth flow and POST to the event flow.
    ///
    /// Other methods are ignored and yield `None`.
    pub async fn handle(&self, event: InboundEvent) -> Option<Handled> {
        match event.method {
            Method::Get => {
                counter!("slackhook_requests_total", "route" => "oauth").increment(1);
                Some(Handled::reply(self.oauth(event.query).await))
            }
            Method::Post => {
                counter!("slackhook_requests_total", "route" => "event").increment(1);
                let body = event
                    .body
                    .unwrap_or_else(|| Value::Object(Default::default()));
                Some(self.event(body))
            }
            Method::Other(method) => {
                debug!(%method, "ignoring request with unsupported method");
                None
            }
        }
    }

    /// OAuth entry point. Without `code` this only builds the authorize redirect.
    #[instrument(skip_all, fields(has_code = query.code().is_some()))]
    pub async fn oauth(&self, query: OAuthQuery) -> Reply {
        if query.code().is_none() {
            return Reply::Redirect(self.inner.client.auth_url(&query));
        }

        let redirect = format!(
            "{}?state={}",
            self.inner.config.install_redirect,
            urlencoding::encode(query.state().unwrap_or_default())
        );

        match self.install(&query).await {
            Ok(record) => {
                info!(workspace_id = %record.workspace_id(), "slack app installed");
                counter!("slackhook_installs_total", "outcome" => "success").increment(1);
                self.emit_install(INSTALL_SUCCESS, &Emission::InstallSuccess { query: &query })
                    .await;
                Reply::Redirect(redirect)
            }
            Err(err) => {
                warn!(error = %err, stage = err.stage(), "slack app install failed");
                counter!("slackhook_installs_total", "outcome" => "error").increment(1);
                self.emit_install(
                    INSTALL_ERROR,
                    &Emission::InstallError {
                        error: &err,
                        query: &query,
                    },
                )
                .await;
                let description = serde_json::to_string(&err.to_string()).unwrap_or_default();
                Reply::InstallFailed {
                    location: format!("{redirect}&error={}", urlencoding::encode(&description)),
                }
            }
        }
    }

    async fn install(&self, query: &OAuthQuery) -> Result<AuthRecord, InstallError> {
        let record = self
            .inner
            .client
            .install(query)
            .await
            .map_err(InstallError::Exchange)?;
        self.inner
            .store
            .save(record)
            .await
            .map_err(InstallError::Persist)
    }

    async fn emit_install(&self, name: &str, emission: &Emission<'_>) {
        for event in [WILDCARD, name] {
            if let Err(err) = self.inner.listeners.emit(event, emission).await {
                warn!(event = %err.event, error = %err.source, "install listener failed");
                return;
            }
        }
    }

    /// Event entry point. Must run inside a Tokio runtime.
    ///
    /// The reply is decided before any credential lookup; loading credentials
    /// and notifying listeners happen on a spawned task.
    pub fn event(&self, body: Value) -> Handled {
        let payload = match Payload::from_body(body) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "rejecting malformed slack payload");
                return Handled::reply(Reply::BadRequest(err.to_string()));
            }
        };

        if let Some(expected) = self.inner.config.verification_token.as_deref()
            && !token_matches(expected, payload.token())
        {
            warn!(
                workspace_id = payload.workspace_id().unwrap_or_default(),
                "verification token mismatch"
            );
            return Handled::reply(Reply::Unauthorized);
        }

        if let Some(challenge) = payload.challenge() {
            return Handled::reply(Reply::Challenge(challenge.to_string()));
        }

        if self.inner.config.ignore_bots && payload.is_from_bot() {
            debug!(bot_id = payload.bot_id().unwrap_or_default(), "ignoring bot message");
            return Handled::reply(Reply::Ack);
        }

        let dispatcher = self.clone();
        let delivery =
            tokio::spawn(async move { dispatcher.deliver(payload).await }.in_current_span());
        Handled {
            reply: Reply::Ack,
            delivery: Some(delivery),
        }
    }

    async fn deliver(&self, payload: Payload) {
        let span = tracing::info_span!(
            "slack.deliver",
            kind = payload.kind().as_str(),
            workspace_id = tracing::field::Empty,
            event = tracing::field::Empty,
        );
        with_common_fields(&span, payload.workspace_id(), None);

        async move {
            let auth = match payload.workspace_id() {
                Some(workspace_id) => match self.inner.store.get(workspace_id).await {
                    Ok(auth) => auth,
                    Err(err) => {
                        error!(error = %err, "credential lookup failed; dropping notification");
                        return;
                    }
                },
                None => {
                    debug!("payload has no workspace id; notifying without credentials");
                    None
                }
            };
            if auth.is_none() {
                debug!("no stored installation for workspace");
            }

            if let Err(err) = self.notify(&payload, auth.as_ref()).await {
                error!(
                    event = %err.event,
                    error = %err.source,
                    "listener failed; remaining notifications skipped"
                );
            }
        }
        .instrument(span)
        .await
    }

    /// Delivers `payload` to every listener registered for its event names.
    ///
    /// Stops at, and returns, the first listener error.
    pub async fn notify(
        &self,
        payload: &Payload,
        auth: Option<&AuthRecord>,
    ) -> Result<(), ListenerError> {
        let store = self.inner.store.as_ref();
        counter!("slackhook_notifications_total", "kind" => payload.kind().as_str()).increment(1);

        for event in payload.listener_events() {
            let bot = self.inner.client.bot(auth, payload);
            self.inner
                .listeners
                .emit(
                    &event,
                    &Emission::Message {
                        payload,
                        bot: &bot,
                        store,
                    },
                )
                .await?;
        }
        Ok(())
    }
}

fn token_matches(expected: &str, actual: Option<&str>) -> bool {
    match actual {
        Some(actual) => expected.as_bytes().ct_eq(actual.as_bytes()).into(),
        None => false,
    }
}
