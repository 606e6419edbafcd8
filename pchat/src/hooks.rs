//! Turn lifecycle hooks.
//!
//! ```rust
//! use pchat::{NoopTurnHooks, TurnHooks};
//!
//! fn accepts_hooks(_hooks: &dyn TurnHooks) {}
//!
//! accepts_hooks(&NoopTurnHooks);
//! ```

use std::time::Duration;

use pcommon::SessionId;

use crate::{ChatError, TurnOutcome};

pub trait TurnHooks: Send + Sync {
    fn on_turn_start(&self, _session_id: &SessionId) {}

    fn on_tool_cycle(&self, _session_id: &SessionId, _tool_calls: usize) {}

    fn on_turn_complete(&self, _session_id: &SessionId, _outcome: TurnOutcome, _elapsed: Duration) {
    }

    fn on_turn_failure(&self, _session_id: &SessionId, _error: &ChatError, _elapsed: Duration) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTurnHooks;

impl TurnHooks for NoopTurnHooks {}
