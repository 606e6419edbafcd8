//! Runtime hooks for tool execution lifecycle events.
//!
//! ```rust
//! use ptooling::{NoopToolRuntimeHooks, ToolRuntimeHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn ToolRuntimeHooks) {}
//!
//! let hooks = NoopToolRuntimeHooks;
//! assert_hooks_trait(&hooks);
//! ```

use std::time::Duration;

use crate::{ToolError, ToolExecutionContext, ToolRequest, ToolResultEnvelope};

pub trait ToolRuntimeHooks: Send + Sync {
    fn on_execution_start(&self, _request: &ToolRequest, _context: &ToolExecutionContext) {}

    /// Called for every envelope, including `error` status envelopes.
    fn on_execution_success(
        &self,
        _request: &ToolRequest,
        _context: &ToolExecutionContext,
        _envelope: &ToolResultEnvelope,
        _elapsed: Duration,
    ) {
    }

    fn on_execution_failure(
        &self,
        _request: &ToolRequest,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopToolRuntimeHooks;

impl ToolRuntimeHooks for NoopToolRuntimeHooks {}
