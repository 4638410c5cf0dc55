//! Attendant login state. No credentials are checked.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::LedgerError;
use crate::storage::{self, SnapshotStorage};

pub const SESSION_STORAGE_KEY: &str = "user-storage";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attendant {
    pub id: String,
    pub name: String,
}

impl Attendant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub is_authenticated: bool,
    pub user: Option<Attendant>,
}

/// Persists who is working the current shift.
pub struct SessionStore {
    state: SessionState,
    storage: Arc<dyn SnapshotStorage>,
}

impl SessionStore {
    pub fn open(storage: Arc<dyn SnapshotStorage>) -> Result<Self, LedgerError> {
        let state = storage::load_json(storage.as_ref(), SESSION_STORAGE_KEY)?.unwrap_or_default();
        Ok(Self { state, storage })
    }

    pub fn current(&self) -> Option<&Attendant> {
        self.state.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated
    }

    pub fn login(&mut self, user: Attendant) -> Result<(), LedgerError> {
        info!(user = %user.id, "attendant logged in");
        self.state = SessionState {
            is_authenticated: true,
            user: Some(user),
        };
        storage::save_json(self.storage.as_ref(), SESSION_STORAGE_KEY, &self.state)
    }

    pub fn logout(&mut self) -> Result<(), LedgerError> {
        info!("attendant logged out");
        self.state = SessionState::default();
        storage::save_json(self.storage.as_ref(), SESSION_STORAGE_KEY, &self.state)
    }
}
