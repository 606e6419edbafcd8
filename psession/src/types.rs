//! Durable conversation state and session listing records.

use std::time::{SystemTime, UNIX_EPOCH};

use pcommon::{SessionId, ToolExtraMap, UserId};
use pprovider::Message;
use serde::{Deserialize, Serialize};

pub const SESSION_TITLE_MAX_CHARS: usize = 80;
pub const DEFAULT_SESSION_TITLE: &str = "New session";

/// Everything a conversation needs to resume on the next inbound event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub tool_extra: ToolExtraMap,
    /// Uploaded files already sent to the model as inline content.
    #[serde(default)]
    pub inline_files: Vec<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Result of [`crate::SessionStore::load_session`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSession {
    /// True when nothing was stored for the session yet.
    pub is_new: bool,
    pub state: SessionState,
}

impl LoadedSession {
    pub fn new_session() -> Self {
        Self {
            is_new: true,
            state: SessionState::default(),
        }
    }

    pub fn existing(state: SessionState) -> Self {
        Self {
            is_new: false,
            state,
        }
    }
}

/// Listing entry written once, when a session receives its first turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub title: String,
    pub created_at_unix_secs: u64,
}

impl SessionRecord {
    pub fn new(user_id: UserId, session_id: SessionId, first_message: Option<&str>) -> Self {
        Self {
            user_id,
            session_id,
            title: session_title(first_message),
            created_at_unix_secs: unix_now_secs(),
        }
    }
}

/// Title derived from the opening message: its first 80 characters.
pub fn session_title(first_message: Option<&str>) -> String {
    match first_message.map(str::trim) {
        Some(text) if !text.is_empty() => text.chars().take(SESSION_TITLE_MAX_CHARS).collect(),
        _ => DEFAULT_SESSION_TITLE.to_string(),
    }
}

/// Raw bytes of an uploaded file destined for an image content block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineFile {
    pub file_name: String,
    pub format: String,
    pub data: Vec<u8>,
}

fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or_default()
}
