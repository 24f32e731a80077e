use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::auth::AuthRecord;
use crate::error::StoreError;

/// Shared credential store handle.
pub type SharedCredentialStore = Arc<dyn CredentialStore>;

/// Persists installation credentials keyed by workspace id.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, workspace_id: &str) -> Result<Option<AuthRecord>, StoreError>;

    /// Stores `record` under its workspace id and returns what was stored.
    async fn save(&self, record: AuthRecord) -> Result<AuthRecord, StoreError>;
}

/// Process-local store. Installations are lost on restart.
#[derive(Default)]
pub struct MemoryCredentialStore {
    records: DashMap<String, AuthRecord>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, workspace_id: &str) -> Result<Option<AuthRecord>, StoreError> {
        Ok(self
            .records
            .get(workspace_id)
            .map(|entry| entry.value().clone()))
    }

    async fn save(&self, record: AuthRecord) -> Result<AuthRecord, StoreError> {
        self.records
            .insert(record.workspace_id().to_string(), record.clone());
        Ok(record)
    }
}
