//! Session store: per-chat dialog progress kept between stateless updates.
//!
//! Records are JSON documents under `session:<chat id>` in the injected
//! key-value store. The pending state is persisted as its legacy string so
//! records written before the state enum existed still load; a string that
//! names no known state is surfaced as [`Awaiting::Unrecognized`] and is
//! never written back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use teloxide::types::ChatId;
use tracing::{debug, warn};

use crate::dialogue::DialogState;
use crate::errors::StorageError;
use crate::profile::{ActivityLevel, Gender, ProfileField};
use crate::storage::KeyValueStore;

/// Partially collected profile fields plus dialog scratch data
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionDraft {
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub age: Option<f64>,
    pub gender: Option<Gender>,
    pub activity_level: Option<ActivityLevel>,
    /// Platform-provided display name of the user who opened the dialog
    pub display_name: Option<String>,
    /// Set when the dialog edits one field from the settings menu
    pub single_field: bool,
}

impl SessionDraft {
    /// The collected profile fields, in dialog order
    pub fn profile_fields(&self) -> Vec<ProfileField> {
        let mut fields = Vec::new();
        if let Some(v) = self.weight {
            fields.push(ProfileField::Weight(v));
        }
        if let Some(v) = self.height {
            fields.push(ProfileField::Height(v));
        }
        if let Some(v) = self.age {
            fields.push(ProfileField::Age(v));
        }
        if let Some(v) = self.gender {
            fields.push(ProfileField::Gender(v));
        }
        if let Some(v) = self.activity_level {
            fields.push(ProfileField::ActivityLevel(v));
        }
        fields
    }
}

/// What the chat is currently waiting for
#[derive(Clone, Debug, PartialEq)]
pub enum Awaiting {
    Idle,
    Pending(DialogState),
    /// A stored state name this version does not know
    Unrecognized(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub chat_id: ChatId,
    pub awaiting: Awaiting,
    pub data: SessionDraft,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn empty(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            awaiting: Awaiting::Idle,
            data: SessionDraft::default(),
            updated_at: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.awaiting == Awaiting::Idle
    }

    pub fn state(&self) -> Option<DialogState> {
        match self.awaiting {
            Awaiting::Pending(state) => Some(state),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    #[serde(default)]
    awaiting_input: Option<String>,
    #[serde(default)]
    data: SessionDraft,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    fn into_session(self, chat_id: ChatId) -> Session {
        let awaiting = match self.awaiting_input.as_deref().map(str::trim) {
            None | Some("") => Awaiting::Idle,
            Some(raw) => match raw.parse::<DialogState>() {
                Ok(state) => Awaiting::Pending(state),
                Err(raw) => Awaiting::Unrecognized(raw),
            },
        };

        Session {
            chat_id,
            awaiting,
            data: self.data,
            updated_at: self.updated_at,
        }
    }
}

/// Durable session store; holds no cache of its own
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(chat_id: ChatId) -> String {
        format!("session:{}", chat_id.0)
    }

    /// Current session, or an empty one.
    ///
    /// Unreadable storage and undecodable records both yield an empty
    /// session.
    pub async fn get(&self, chat_id: ChatId) -> Session {
        let raw = match self.store.get(&Self::key(chat_id)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Session::empty(chat_id),
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "Session read failed, treating as empty");
                return Session::empty(chat_id);
            }
        };

        match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) => record.into_session(chat_id),
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "Corrupt session record, treating as empty");
                Session::empty(chat_id)
            }
        }
    }

    /// Create or overwrite the session with a pending state and draft
    pub async fn start(
        &self,
        chat_id: ChatId,
        state: DialogState,
        data: SessionDraft,
    ) -> Result<Session, StorageError> {
        let updated_at = Utc::now();
        let record = SessionRecord {
            awaiting_input: Some(state.as_str().to_string()),
            data,
            updated_at: Some(updated_at),
        };

        let raw = serde_json::to_string(&record)?;
        self.store.put(&Self::key(chat_id), &raw).await?;
        debug!(chat_id = %chat_id, state = %state, "Session stored");

        Ok(Session {
            chat_id,
            awaiting: Awaiting::Pending(state),
            data: record.data,
            updated_at: Some(updated_at),
        })
    }

    /// Full overwrite, same as [`SessionStore::start`]; callers carry
    /// forward any draft fields they want to keep
    pub async fn update(
        &self,
        chat_id: ChatId,
        state: DialogState,
        data: SessionDraft,
    ) -> Result<Session, StorageError> {
        self.start(chat_id, state, data).await
    }

    /// Delete the session record; clearing an absent session is a no-op
    pub async fn clear(&self, chat_id: ChatId) -> Result<(), StorageError> {
        self.store.delete(&Self::key(chat_id)).await?;
        debug!(chat_id = %chat_id, "Session cleared");
        Ok(())
    }
}
