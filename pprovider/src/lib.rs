//! Inference provider contracts, transcript types, and retry policy.
//!
//! ```rust
//! use pprovider::{Message, ModelRequest, RetryPolicy, Role};
//!
//! let request = ModelRequest::new("claude-sonnet", vec![Message::user_text("hello")]);
//! assert_eq!(request.messages[0].role, Role::User);
//! assert_eq!(RetryPolicy::default().max_attempts, 5);
//! ```

pub mod adapters;
pub mod prelude;

mod error;
mod model;
mod provider;
mod resilience;
mod stream;

pub use error::{ProviderError, ProviderErrorKind};
pub use model::{
    ContentBlock, Message, ModelRequest, ProviderId, Role, StopReason, TokenUsage, ToolSpec,
    ToolStatus,
};
pub use provider::{ModelProvider, ProviderFuture};
pub use resilience::{
    AbortReason, MAX_RETRY_ATTEMPTS, NoopOperationHooks, ProviderOperationHooks, RetryDecision,
    RetryPolicy,
};
pub use stream::{
    BlockDelta, BlockStart, BoxedEventStream, ModelEventStream, StreamEvent, VecEventStream,
};

#[cfg(feature = "provider-anthropic")]
pub use adapters::anthropic::{AnthropicProvider, AnthropicSseDecoder};
