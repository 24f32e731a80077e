#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use slackhook_core::{
    AuthRecord, BotHandle, ClientError, CredentialStore, Emission, Listener, MemoryCredentialStore,
    OAuthQuery, OutboundClient, Payload, StoreError,
};
use tokio::sync::Semaphore;

/// Store that counts calls and can hold `get` until released.
pub struct RecordingStore {
    inner: MemoryCredentialStore,
    gets: AtomicUsize,
    saves: AtomicUsize,
    gate: Option<Semaphore>,
    fail_saves: bool,
    fail_gets: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryCredentialStore::new(),
            gets: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
            gate: None,
            fail_saves: false,
            fail_gets: false,
        }
    }

    /// Every `get` waits for a permit added with [`RecordingStore::release`].
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub fn failing_saves() -> Self {
        Self {
            fail_saves: true,
            ..Self::new()
        }
    }

    pub fn failing_gets() -> Self {
        Self {
            fail_gets: true,
            ..Self::new()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn seed(&self, record: AuthRecord) {
        self.inner.save(record).await.unwrap();
    }
}

#[async_trait]
impl CredentialStore for RecordingStore {
    async fn get(&self, workspace_id: &str) -> Result<Option<AuthRecord>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|err| StoreError::Unavailable(err.to_string()))?
                .forget();
        }
        if self.fail_gets {
            return Err(StoreError::Unavailable("table offline".into()));
        }
        self.inner.get(workspace_id).await
    }

    async fn save(&self, record: AuthRecord) -> Result<AuthRecord, StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves {
            return Err(StoreError::Unavailable("table offline".into()));
        }
        self.inner.save(record).await
    }
}

/// Client with a fixed install outcome.
pub struct StubClient {
    install_result: Mutex<Option<Result<AuthRecord, ClientError>>>,
    pub bots: AtomicUsize,
}

impl StubClient {
    pub fn installing(record: AuthRecord) -> Self {
        Self {
            install_result: Mutex::new(Some(Ok(record))),
            bots: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: ClientError) -> Self {
        Self {
            install_result: Mutex::new(Some(Err(error))),
            bots: AtomicUsize::new(0),
        }
    }

    pub fn bot_count(&self) -> usize {
        self.bots.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutboundClient for StubClient {
    fn auth_url(&self, query: &OAuthQuery) -> String {
        format!(
            "https://slack.test/authorize?state={}",
            query.state().unwrap_or_default()
        )
    }

    async fn install(&self, _query: &OAuthQuery) -> Result<AuthRecord, ClientError> {
        self.install_result
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Err(ClientError::Api("already used".into())))
    }

    fn bot(&self, auth: Option<&AuthRecord>, payload: &Payload) -> BotHandle {
        self.bots.fetch_add(1, Ordering::SeqCst);
        BotHandle::new(reqwest::Client::new(), "mock://slack", auth, payload)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Message {
        event: String,
        payload: Value,
        token: Option<String>,
    },
    InstallSuccess {
        event: String,
        query: OAuthQuery,
    },
    InstallError {
        event: String,
        error: String,
        query: OAuthQuery,
    },
}

/// Listener that records everything it is handed.
#[derive(Default)]
pub struct Recorder {
    seen: Mutex<Vec<Seen>>,
    fail: bool,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.seen()
            .into_iter()
            .map(|seen| match seen {
                Seen::Message { event, .. }
                | Seen::InstallSuccess { event, .. }
                | Seen::InstallError { event, .. } => event,
            })
            .collect()
    }
}

#[async_trait]
impl Listener for Recorder {
    async fn on_emit(&self, event: &str, emission: &Emission<'_>) -> anyhow::Result<()> {
        let seen = match emission {
            Emission::Message { payload, bot, .. } => Seen::Message {
                event: event.to_string(),
                payload: payload.raw().clone(),
                token: bot.token().map(str::to_string),
            },
            Emission::InstallSuccess { query } => Seen::InstallSuccess {
                event: event.to_string(),
                query: (*query).clone(),
            },
            Emission::InstallError { error, query } => Seen::InstallError {
                event: event.to_string(),
                error: error.to_string(),
                query: (*query).clone(),
            },
        };
        self.seen.lock().unwrap().push(seen);
        if self.fail {
            anyhow::bail!("recorder configured to fail on {event}");
        }
        Ok(())
    }
}
