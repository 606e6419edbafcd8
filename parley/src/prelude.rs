//! Common imports for most parley deployments.

pub use crate::{
    AppConfig, BufferedTransport, ChatService, ChatTransport, HandlerError, HandlerErrorKind,
    InboundEvent, Message, MessageHandler, ModelProvider, RemoteInvoker, RuntimeBundle,
    SessionId, SessionStore, ToolDispatcher, TurnOutcome, UserId, build_runtime,
    build_runtime_with,
};
