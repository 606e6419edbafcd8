//! Session store trait and in-memory store implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use pcommon::{BoxFuture, SessionId, UserId};

use crate::error::SessionError;
use crate::types::{LoadedSession, SessionRecord, SessionState};

pub use crate::backends::filesystem::FilesystemSessionStore;

pub const DEFAULT_SESSION_ROOT: &str = "sessions";

/// Per-user conversation persistence.
///
/// Sessions are keyed by `(user_id, session_id)`; two users never see each
/// other's state even when their session ids collide.
pub trait SessionStore: Send + Sync {
    fn load_session<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<LoadedSession, SessionError>>;

    fn save_session<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
        state: &'a SessionState,
    ) -> BoxFuture<'a, Result<(), SessionError>>;

    /// Writes the listing record of a session; the title comes from the
    /// opening message.
    fn create_session_record<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
        first_message: Option<&'a str>,
    ) -> BoxFuture<'a, Result<SessionRecord, SessionError>>;

    fn load_session_record<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<SessionRecord>, SessionError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStoreConfig {
    Filesystem { root: PathBuf },
    InMemory,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self::Filesystem {
            root: PathBuf::from(DEFAULT_SESSION_ROOT),
        }
    }
}

pub fn create_session_store(
    config: SessionStoreConfig,
) -> Result<Arc<dyn SessionStore>, SessionError> {
    match config {
        SessionStoreConfig::Filesystem { root } => Ok(Arc::new(FilesystemSessionStore::new(root)?)),
        SessionStoreConfig::InMemory => Ok(Arc::new(InMemorySessionStore::new())),
    }
}

type SessionKey = (UserId, SessionId);

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionKey, SessionState>>,
    records: Mutex<HashMap<SessionKey, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn load_session<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<LoadedSession, SessionError>> {
        Box::pin(async move {
            let sessions = self
                .sessions
                .lock()
                .map_err(|_| SessionError::storage("session store lock poisoned"))?;

            Ok(sessions
                .get(&(user_id.clone(), session_id.clone()))
                .cloned()
                .map(LoadedSession::existing)
                .unwrap_or_else(LoadedSession::new_session))
        })
    }

    fn save_session<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
        state: &'a SessionState,
    ) -> BoxFuture<'a, Result<(), SessionError>> {
        Box::pin(async move {
            let mut sessions = self
                .sessions
                .lock()
                .map_err(|_| SessionError::storage("session store lock poisoned"))?;
            sessions.insert((user_id.clone(), session_id.clone()), state.clone());
            Ok(())
        })
    }

    fn create_session_record<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
        first_message: Option<&'a str>,
    ) -> BoxFuture<'a, Result<SessionRecord, SessionError>> {
        Box::pin(async move {
            let record = SessionRecord::new(user_id.clone(), session_id.clone(), first_message);
            let mut records = self
                .records
                .lock()
                .map_err(|_| SessionError::storage("session record lock poisoned"))?;
            records.insert((user_id.clone(), session_id.clone()), record.clone());
            Ok(record)
        })
    }

    fn load_session_record<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<SessionRecord>, SessionError>> {
        Box::pin(async move {
            let records = self
                .records
                .lock()
                .map_err(|_| SessionError::storage("session record lock poisoned"))?;
            Ok(records
                .get(&(user_id.clone(), session_id.clone()))
                .cloned())
        })
    }
}
