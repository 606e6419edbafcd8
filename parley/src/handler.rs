//! Inbound client events: heartbeat and conversation turns.

use std::sync::Arc;

use pchat::{ChatService, ChatTransport};
use pcommon::{SessionId, UserId};
use pprovider::{ContentBlock, Message};
use psession::{FileService, SessionStore, filter_inline_files};
use ptooling::{ToolExecutionContext, ToolFile};
use serde::{Deserialize, Serialize};

use crate::HandlerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Heartbeat,
    Converse,
}

impl EventType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "HEARTBEAT" => Some(Self::Heartbeat),
            "CONVERSE" => Some(Self::Converse),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundFile {
    pub file_name: String,
}

/// Client event body. Fields are validated by [`MessageHandler::handle`]
/// rather than by deserialization, so malformed events still reach the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub files: Vec<InboundFile>,
}

impl InboundEvent {
    pub fn converse(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            event_type: Some("CONVERSE".to_string()),
            message: Some(message.into()),
            files: Vec::new(),
        }
    }

    pub fn heartbeat(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            event_type: Some("HEARTBEAT".to_string()),
            ..Self::default()
        }
    }

    pub fn with_files<I, S>(mut self, file_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = file_names
            .into_iter()
            .map(|file_name| InboundFile {
                file_name: file_name.into(),
            })
            .collect();
        self
    }

    pub fn from_json(body: &str) -> Result<Self, HandlerError> {
        serde_json::from_str(body)
            .map_err(|err| HandlerError::invalid_event(format!("malformed event body: {err}")))
    }
}

#[derive(Clone)]
pub struct MessageHandler {
    chat: ChatService,
    sessions: Arc<dyn SessionStore>,
    files: Arc<dyn FileService>,
}

impl MessageHandler {
    pub fn new(
        chat: ChatService,
        sessions: Arc<dyn SessionStore>,
        files: Arc<dyn FileService>,
    ) -> Self {
        Self {
            chat,
            sessions,
            files,
        }
    }

    pub fn chat(&self) -> &ChatService {
        &self.chat
    }

    /// Handles one inbound event. Errors are logged before they are returned.
    pub async fn handle(
        &self,
        user_id: &UserId,
        event: InboundEvent,
        transport: &dyn ChatTransport,
    ) -> Result<(), HandlerError> {
        tracing::info!(
            user_id = %user_id,
            session_id = event.session_id.as_deref(),
            event_type = event.event_type.as_deref(),
            files = event.files.len(),
            "received event"
        );

        let result = self.dispatch(user_id, event, transport).await;
        if let Err(err) = &result {
            tracing::error!(user_id = %user_id, error = %err, "error processing event");
        }
        result
    }

    async fn dispatch(
        &self,
        user_id: &UserId,
        event: InboundEvent,
        transport: &dyn ChatTransport,
    ) -> Result<(), HandlerError> {
        let session_id = match event.session_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => SessionId::new(id),
            _ => return Err(HandlerError::invalid_event("session id is required")),
        };

        let event_type = event.event_type.clone().unwrap_or_default();
        match EventType::parse(&event_type) {
            Some(EventType::Heartbeat) => {
                transport.send_heartbeat(self.chat.model()).await?;
                Ok(())
            }
            Some(EventType::Converse) => self.converse(user_id, &session_id, event, transport).await,
            None => Err(HandlerError::invalid_event(format!(
                "unknown event type: {event_type}"
            ))),
        }
    }

    async fn converse(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        event: InboundEvent,
        transport: &dyn ChatTransport,
    ) -> Result<(), HandlerError> {
        let loaded = self.sessions.load_session(user_id, session_id).await?;
        let mut state = loaded.state;

        let tool_files = event
            .files
            .iter()
            .map(|file| ToolFile::from_path(&file.file_name))
            .collect::<Vec<_>>();
        let requested = tool_files
            .iter()
            .map(|file| file.original.clone())
            .collect::<Vec<_>>();

        let to_inline = filter_inline_files(&requested, &state.inline_files);
        state.inline_files.extend(to_inline.iter().cloned());
        let inline = self
            .files
            .inline_file_data(user_id, session_id, &to_inline)
            .await
            .map_err(|err| HandlerError::files(err.to_string()))?;

        let message = event.message.filter(|text| !text.is_empty());
        let mut content = Vec::with_capacity(inline.len() + 1);
        if let Some(text) = &message {
            content.push(ContentBlock::text(text.clone()));
        }
        content.extend(
            inline
                .into_iter()
                .map(|file| ContentBlock::image(file.format, file.data)),
        );
        if !content.is_empty() {
            state.messages.push(Message::user(content));
        }

        let context = ToolExecutionContext::new(user_id.clone(), session_id.clone())
            .with_files(tool_files);
        let outcome = self
            .chat
            .run_turn(&context, &mut state.messages, &mut state.tool_extra, transport)
            .await?;

        if loaded.is_new {
            self.sessions
                .create_session_record(user_id, session_id, message.as_deref())
                .await?;
        }
        self.sessions
            .save_session(user_id, session_id, &state)
            .await?;

        transport.send_loop(outcome.is_complete()).await?;
        Ok(())
    }
}
