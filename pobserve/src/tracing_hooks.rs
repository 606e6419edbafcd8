//! Tracing-based observability hooks for provider, tool runtime, and turn phases.
//!
//! ```rust
//! use pobserve::TracingObservabilityHooks;
//! use pchat::TurnHooks;
//!
//! fn accepts_turn_hooks(_hooks: &dyn TurnHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_turn_hooks(&hooks);
//! ```

use std::time::Duration;

use pchat::{ChatError, TurnHooks, TurnOutcome};
use pcommon::SessionId;
use pprovider::{ProviderError, ProviderId, ProviderOperationHooks};
use ptooling::{
    ToolError, ToolExecutionContext, ToolRequest, ToolResultEnvelope, ToolRuntimeHooks,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, attempt: u32) {
        tracing::info!(
            phase = "provider",
            event = "attempt_start",
            provider = %provider,
            operation,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "provider",
            event = "retry_scheduled",
            provider = %provider,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        tracing::info!(
            phase = "provider",
            event = "success",
            provider = %provider,
            operation,
            attempts
        );
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider = %provider,
            operation,
            attempts,
            error_kind = ?error.kind,
            input_too_large = error.is_input_too_large(),
            error = %error
        );
    }
}

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_execution_start(&self, request: &ToolRequest, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "tool",
            event = "execution_start",
            tool_name = request.name,
            tool_use_id = request.id,
            session_id = %context.session_id,
            user_id = %context.user_id
        );
    }

    fn on_execution_success(
        &self,
        request: &ToolRequest,
        context: &ToolExecutionContext,
        envelope: &ToolResultEnvelope,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "tool",
            event = "execution_success",
            tool_name = request.name,
            tool_use_id = request.id,
            session_id = %context.session_id,
            status = envelope.status.as_str(),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_execution_failure(
        &self,
        request: &ToolRequest,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "tool",
            event = "execution_failure",
            tool_name = request.name,
            tool_use_id = request.id,
            session_id = %context.session_id,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            infrastructure = error.is_infrastructure(),
            error = %error
        );
    }
}

impl TurnHooks for TracingObservabilityHooks {
    fn on_turn_start(&self, session_id: &SessionId) {
        tracing::info!(phase = "turn", event = "turn_start", session_id = %session_id);
    }

    fn on_tool_cycle(&self, session_id: &SessionId, tool_calls: usize) {
        tracing::info!(
            phase = "turn",
            event = "tool_cycle",
            session_id = %session_id,
            tool_calls
        );
    }

    fn on_turn_complete(&self, session_id: &SessionId, outcome: TurnOutcome, elapsed: Duration) {
        tracing::info!(
            phase = "turn",
            event = "turn_complete",
            session_id = %session_id,
            done = outcome.is_complete(),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_turn_failure(&self, session_id: &SessionId, error: &ChatError, elapsed: Duration) {
        tracing::error!(
            phase = "turn",
            event = "turn_failure",
            session_id = %session_id,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }
}
