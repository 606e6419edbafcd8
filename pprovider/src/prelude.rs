//! Common `pprovider` imports for downstream crates.

pub use crate::{
    AbortReason, BlockDelta, BlockStart, BoxedEventStream, ContentBlock, Message,
    ModelEventStream, ModelProvider, ModelRequest, NoopOperationHooks, ProviderError,
    ProviderErrorKind, ProviderFuture, ProviderId, ProviderOperationHooks, RetryDecision,
    RetryPolicy, Role, StopReason, StreamEvent, TokenUsage, ToolSpec, ToolStatus,
    VecEventStream,
};
pub use pcommon::{BoxFuture, ExtraMap, InferenceOptions};
