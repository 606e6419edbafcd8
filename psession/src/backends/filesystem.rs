use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pcommon::{BoxFuture, SessionId, UserId};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::backend::SessionStore;
use crate::error::SessionError;
use crate::types::{LoadedSession, SessionRecord, SessionState};

/// JSON-file session store.
///
/// Layout under `root`: `sessions/<user>/<session>.json` for state and
/// `records/<user>/<session>.json` for listing records, with hex-encoded path
/// segments.
#[derive(Debug)]
pub struct FilesystemSessionStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FilesystemSessionStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SessionError> {
        let root = root.as_ref().to_path_buf();
        for dir in ["sessions", "records"] {
            fs::create_dir_all(root.join(dir)).map_err(|error| {
                SessionError::storage(format!("failed to create session store root: {error}"))
            })?;
        }
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, kind: &str, user_id: &UserId, session_id: &SessionId) -> PathBuf {
        self.root
            .join(kind)
            .join(hex_encode(user_id.as_str().as_bytes()))
            .join(format!("{}.json", hex_encode(session_id.as_str().as_bytes())))
    }

    fn state_path(&self, user_id: &UserId, session_id: &SessionId) -> PathBuf {
        self.path("sessions", user_id, session_id)
    }

    fn record_path(&self, user_id: &UserId, session_id: &SessionId) -> PathBuf {
        self.path("records", user_id, session_id)
    }
}

impl SessionStore for FilesystemSessionStore {
    fn load_session<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<LoadedSession, SessionError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| SessionError::storage("filesystem store lock poisoned"))?;
            Ok(
                read_json::<SessionState>(&self.state_path(user_id, session_id))?
                    .map(LoadedSession::existing)
                    .unwrap_or_else(LoadedSession::new_session),
            )
        })
    }

    fn save_session<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
        state: &'a SessionState,
    ) -> BoxFuture<'a, Result<(), SessionError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| SessionError::storage("filesystem store lock poisoned"))?;
            write_json(&self.state_path(user_id, session_id), state)
        })
    }

    fn create_session_record<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
        first_message: Option<&'a str>,
    ) -> BoxFuture<'a, Result<SessionRecord, SessionError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| SessionError::storage("filesystem store lock poisoned"))?;
            let record = SessionRecord::new(user_id.clone(), session_id.clone(), first_message);
            write_json(&self.record_path(user_id, session_id), &record)?;
            Ok(record)
        })
    }

    fn load_session_record<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<SessionRecord>, SessionError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| SessionError::storage("filesystem store lock poisoned"))?;
            read_json(&self.record_path(user_id, session_id))
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SessionError> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)
        .map_err(|error| SessionError::storage(format!("failed to read session file: {error}")))?;
    let value = serde_json::from_slice::<T>(&bytes).map_err(|error| {
        SessionError::storage(format!("failed to deserialize session file: {error}"))
    })?;
    Ok(Some(value))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SessionError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|error| {
        SessionError::storage(format!("failed to serialize session file: {error}"))
    })?;
    write_atomic(path, &bytes)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SessionError> {
    let Some(parent) = path.parent() else {
        return Err(SessionError::storage("session file missing parent directory"));
    };
    fs::create_dir_all(parent).map_err(|error| {
        SessionError::storage(format!("failed to create parent directory: {error}"))
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|error| {
        SessionError::storage(format!("failed to write temporary session file: {error}"))
    })?;

    if path.exists() {
        fs::remove_file(path).map_err(|error| {
            SessionError::storage(format!("failed to replace existing session file: {error}"))
        })?;
    }
    fs::rename(&tmp, path)
        .map_err(|error| SessionError::storage(format!("failed to finalize session file: {error}")))
}

fn hex_encode(input: &[u8]) -> String {
    let mut output = String::with_capacity(input.len() * 2);
    for byte in input {
        output.push(nibble_to_hex(byte >> 4));
        output.push(nibble_to_hex(byte & 0x0f));
    }
    output
}

fn nibble_to_hex(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        10..=15 => (b'a' + (nibble - 10)) as char,
        _ => '0',
    }
}
