//! Outbound delivery of text and tool status to the client connection.
//!
//! ```rust
//! use pchat::{BufferedTransport, ChatTransport, JsonLinesTransport};
//!
//! fn accepts_transport(_transport: &dyn ChatTransport) {}
//!
//! accepts_transport(&BufferedTransport::new());
//! accepts_transport(&JsonLinesTransport::new(std::io::stdout()));
//! ```

use std::io::Write;
use std::sync::Mutex;

use pcommon::{BoxFuture, ToolExtraMap};
use serde::{Deserialize, Serialize};

use crate::ChatError;

pub type ChatFuture<'a, T> = BoxFuture<'a, T>;

pub trait ChatTransport: Send + Sync {
    fn send_text<'a>(&'a self, text: &'a str) -> ChatFuture<'a, Result<(), ChatError>>;

    fn send_heartbeat<'a>(&'a self, model_id: &'a str) -> ChatFuture<'a, Result<(), ChatError>>;

    fn send_tool_running<'a>(
        &'a self,
        payloads: &'a ToolExtraMap,
    ) -> ChatFuture<'a, Result<(), ChatError>>;

    fn send_tool_finished<'a>(
        &'a self,
        payloads: &'a ToolExtraMap,
    ) -> ChatFuture<'a, Result<(), ChatError>>;

    /// Tells the client whether the turn is done or another turn follows.
    fn send_loop<'a>(&'a self, done: bool) -> ChatFuture<'a, Result<(), ChatError>>;
}

/// Wire shape of every message sent to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Text { text: String },
    Heartbeat { model: String },
    ToolRunning { tools: ToolExtraMap },
    ToolFinished { tools: ToolExtraMap },
    Loop { done: bool },
}

/// Keeps every outbound message in memory, in send order.
#[derive(Debug, Default)]
pub struct BufferedTransport {
    messages: Mutex<Vec<OutboundMessage>>,
}

impl BufferedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    pub fn texts(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|message| match message {
                OutboundMessage::Text { text } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, message: OutboundMessage) -> Result<(), ChatError> {
        self.messages
            .lock()
            .map_err(|_| ChatError::transport("buffered transport lock poisoned"))?
            .push(message);
        Ok(())
    }
}

impl ChatTransport for BufferedTransport {
    fn send_text<'a>(&'a self, text: &'a str) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.record(OutboundMessage::Text {
                text: text.to_string(),
            })
        })
    }

    fn send_heartbeat<'a>(&'a self, model_id: &'a str) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.record(OutboundMessage::Heartbeat {
                model: model_id.to_string(),
            })
        })
    }

    fn send_tool_running<'a>(
        &'a self,
        payloads: &'a ToolExtraMap,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.record(OutboundMessage::ToolRunning {
                tools: payloads.clone(),
            })
        })
    }

    fn send_tool_finished<'a>(
        &'a self,
        payloads: &'a ToolExtraMap,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.record(OutboundMessage::ToolFinished {
                tools: payloads.clone(),
            })
        })
    }

    fn send_loop<'a>(&'a self, done: bool) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move { self.record(OutboundMessage::Loop { done }) })
    }
}

/// Writes each outbound message as one JSON line.
#[derive(Debug)]
pub struct JsonLinesTransport<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesTransport<W>
where
    W: Write + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> Result<W, ChatError> {
        self.writer
            .into_inner()
            .map_err(|_| ChatError::transport("json lines transport lock poisoned"))
    }

    fn write(&self, message: &OutboundMessage) -> Result<(), ChatError> {
        let line = serde_json::to_string(message)
            .map_err(|err| ChatError::transport(format!("failed to encode message: {err}")))?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ChatError::transport("json lines transport lock poisoned"))?;
        writeln!(writer, "{line}")
            .and_then(|_| writer.flush())
            .map_err(|err| ChatError::transport(err.to_string()))
    }
}

impl<W> ChatTransport for JsonLinesTransport<W>
where
    W: Write + Send,
{
    fn send_text<'a>(&'a self, text: &'a str) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.write(&OutboundMessage::Text {
                text: text.to_string(),
            })
        })
    }

    fn send_heartbeat<'a>(&'a self, model_id: &'a str) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.write(&OutboundMessage::Heartbeat {
                model: model_id.to_string(),
            })
        })
    }

    fn send_tool_running<'a>(
        &'a self,
        payloads: &'a ToolExtraMap,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.write(&OutboundMessage::ToolRunning {
                tools: payloads.clone(),
            })
        })
    }

    fn send_tool_finished<'a>(
        &'a self,
        payloads: &'a ToolExtraMap,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.write(&OutboundMessage::ToolFinished {
                tools: payloads.clone(),
            })
        })
    }

    fn send_loop<'a>(&'a self, done: bool) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move { self.write(&OutboundMessage::Loop { done }) })
    }
}
