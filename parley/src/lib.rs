//! Unified facade over the parley workspace crates.
//!
//! This crate is the single dependency for most deployments. It re-exports
//! the workspace crates and wires a [`MessageHandler`] from environment
//! configuration.
//!
//! ```rust,no_run
//! use parley::{AppConfig, BufferedTransport, InboundEvent, UserId, build_runtime};
//!
//! # async fn run() -> Result<(), parley::HandlerError> {
//! let config = AppConfig::from_env()?;
//! let runtime = build_runtime(&config)?;
//! let transport = BufferedTransport::new();
//!
//! runtime
//!     .handler
//!     .handle(
//!         &UserId::from("user-1"),
//!         InboundEvent::converse("session-1", "What is in my spreadsheet?"),
//!         &transport,
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod handler;

pub mod prelude;
pub mod providers;
pub mod runtime;

pub use pchat;
pub use pcommon;
pub use pobserve;
pub use pprovider;
pub use psession;
pub use ptooling;

pub use config::{AppConfig, DEFAULT_FILES_ROOT, DEFAULT_SKILLS_DIR};
pub use error::{HandlerError, HandlerErrorKind};
pub use handler::{EventType, InboundEvent, InboundFile, MessageHandler};

pub use pchat::{
    BufferedTransport, ChatError, ChatErrorKind, ChatService, ChatServiceBuilder, ChatTransport,
    JsonLinesTransport, OutboundMessage, SystemPrompt, TurnHooks, TurnOutcome,
};
pub use pcommon::{BoxFuture, InferenceOptions, SessionId, ToolExtraMap, UserId};
pub use pobserve::{
    MetricsObservabilityHooks, SafeProviderHooks, SafeToolHooks, SafeTurnHooks,
    TracingObservabilityHooks,
};
pub use pprovider::{
    ContentBlock, Message, ModelProvider, ModelRequest, ProviderError, ProviderErrorKind,
    ProviderId, RetryPolicy, Role, StreamEvent,
};
pub use psession::{
    FileService, FilesystemFileService, FilesystemSessionStore, InMemorySessionStore,
    SessionError, SessionState, SessionStore,
};
pub use ptooling::{
    RemoteFunctionId, RemoteInvoker, SkillLibrary, ToolCatalog, ToolDispatcher, ToolError,
    ToolExecutionContext, ToolResultEnvelope, ToolRuntime,
};

pub use runtime::{
    RuntimeBundle, build_chat_service, build_dispatcher, build_runtime, build_runtime_with,
    build_tool_catalog,
};
