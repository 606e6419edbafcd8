//! Conversation turn orchestration over a streaming model provider.
//!
//! A turn renders the system prompt, streams one assistant response while
//! forwarding text to the client, and runs at most one tool cycle. Transient
//! provider failures are retried with capped exponential backoff.

mod aggregator;
mod cycle;
mod error;
mod hooks;
mod prompt;
mod service;
mod transport;
mod types;

pub mod prelude {
    pub use crate::{
        AggregatedResponse, BufferedTransport, ChatError, ChatErrorKind, ChatService,
        ChatServiceBuilder, ChatTransport, NoopTurnHooks, OutboundMessage, SchemaSource,
        StreamAggregator, SystemPrompt, TurnHooks, TurnOutcome,
    };
    pub use pcommon::{SessionId, ToolExtraMap, UserId};
    pub use ptooling::{ToolExecutionContext, ToolRuntime};
}

pub use aggregator::{AggregatedResponse, StreamAggregator};
pub use cycle::{ToolCallResult, ToolCycle, ToolCycleOutcome};
pub use error::{ChatError, ChatErrorKind};
pub use hooks::{NoopTurnHooks, TurnHooks};
pub use prompt::{
    ARTIFACT_INSTRUCTIONS, ASSISTANT_INSTRUCTIONS, ColumnSchema, SchemaSource, SystemPrompt,
    TabularFormat,
};
pub use service::{ChatService, ChatServiceBuilder, STREAM_OPERATION};
pub use transport::{
    BufferedTransport, ChatFuture, ChatTransport, JsonLinesTransport, OutboundMessage,
};
pub use types::TurnOutcome;
