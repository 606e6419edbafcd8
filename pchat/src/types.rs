//! Turn results.

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The assistant answered without requesting tools.
    Complete,
    /// Tools ran and their results were appended; the caller must run another
    /// turn over the same transcript.
    ToolCycleExecuted { tool_calls: usize },
}

impl TurnOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}
