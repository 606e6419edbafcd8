//! Reassembles streamed response events into complete assistant content.
//!
//! ```rust
//! use pchat::StreamAggregator;
//! use pprovider::{BlockDelta, BlockStart, StreamEvent};
//!
//! let mut aggregator = StreamAggregator::new();
//! let events = vec![
//!     StreamEvent::ContentBlockStart { index: 0, block: BlockStart::Text },
//!     StreamEvent::ContentBlockDelta { index: 0, delta: BlockDelta::Text("Hel".into()) },
//!     StreamEvent::ContentBlockDelta { index: 0, delta: BlockDelta::Text("lo".into()) },
//!     StreamEvent::ContentBlockStop { index: 0 },
//! ];
//!
//! let increments = events
//!     .into_iter()
//!     .filter_map(|event| aggregator.push(event))
//!     .collect::<Vec<_>>();
//! assert_eq!(increments, vec!["Hel", "lo"]);
//!
//! let response = aggregator.finish();
//! assert_eq!(response.message.text(), "Hello");
//! assert!(!response.execution_requested());
//! ```

use std::collections::BTreeMap;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use pprovider::{
    BlockDelta, BlockStart, BoxedEventStream, ContentBlock, Message, ProviderError, StopReason,
    StreamEvent, TokenUsage,
};
use ptooling::{ToolInput, ToolRequest};

#[derive(Debug)]
enum BlockBuffer {
    Text(String),
    ToolUse {
        id: String,
        name: String,
        input_json: String,
    },
}

#[derive(Debug)]
enum CompletedBlock {
    Text(String),
    ToolUse(ToolRequest),
}

/// Per-attempt accumulator. Single pass: a new attempt needs a new aggregator.
#[derive(Debug, Default)]
pub struct StreamAggregator {
    open: BTreeMap<usize, BlockBuffer>,
    completed: BTreeMap<usize, CompletedBlock>,
    stop_reason: Option<StopReason>,
    usage: Option<TokenUsage>,
}

/// Assistant output of one fully drained stream.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedResponse {
    pub message: Message,
    pub tool_requests: Vec<ToolRequest>,
    pub stop_reason: Option<StopReason>,
    pub usage: Option<TokenUsage>,
}

impl AggregatedResponse {
    /// True iff at least one tool-use block completed.
    pub fn execution_requested(&self) -> bool {
        !self.tool_requests.is_empty()
    }
}

impl StreamAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event and returns the displayable text it carries, if any.
    pub fn push(&mut self, event: StreamEvent) -> Option<String> {
        match event {
            StreamEvent::ContentBlockStart { index, block } => {
                let buffer = match block {
                    BlockStart::Text => BlockBuffer::Text(String::new()),
                    BlockStart::ToolUse { id, name } => BlockBuffer::ToolUse {
                        id,
                        name,
                        input_json: String::new(),
                    },
                };
                self.open.insert(index, buffer);
                None
            }
            StreamEvent::ContentBlockDelta { index, delta } => self.apply_delta(index, delta),
            StreamEvent::ContentBlockStop { index } => {
                self.close(index);
                None
            }
            StreamEvent::MessageStop { stop_reason } => {
                self.stop_reason = Some(stop_reason);
                None
            }
            StreamEvent::Metadata { usage } => {
                self.usage = Some(usage);
                None
            }
            StreamEvent::MessageStart { .. } => None,
        }
    }

    /// Drives `events` through the aggregator, yielding text increments as they arrive.
    pub fn text_increments<'s>(
        &'s mut self,
        mut events: BoxedEventStream<'s>,
    ) -> impl Stream<Item = Result<String, ProviderError>> + Send + 's {
        try_stream! {
            while let Some(event) = events.next().await {
                if let Some(text) = self.push(event?) {
                    yield text;
                }
            }
        }
    }

    /// Consumes the aggregator once the stream is exhausted.
    ///
    /// Text blocks still open are kept, since their text was already shown.
    /// Tool-use blocks that never stopped are dropped.
    pub fn finish(mut self) -> AggregatedResponse {
        let open = std::mem::take(&mut self.open);
        for (index, buffer) in open {
            if let BlockBuffer::Text(text) = buffer {
                self.completed.insert(index, CompletedBlock::Text(text));
            }
        }

        let mut content = Vec::new();
        let mut tool_requests = Vec::new();
        for block in self.completed.into_values() {
            match block {
                CompletedBlock::Text(text) if text.is_empty() => {}
                CompletedBlock::Text(text) => content.push(ContentBlock::Text { text }),
                CompletedBlock::ToolUse(request) => {
                    content.push(request.to_content_block());
                    tool_requests.push(request);
                }
            }
        }

        AggregatedResponse {
            message: Message::assistant(content),
            tool_requests,
            stop_reason: self.stop_reason,
            usage: self.usage,
        }
    }

    fn apply_delta(&mut self, index: usize, delta: BlockDelta) -> Option<String> {
        match delta {
            BlockDelta::Text(text) => {
                let buffer = self
                    .open
                    .entry(index)
                    .or_insert_with(|| BlockBuffer::Text(String::new()));
                match buffer {
                    BlockBuffer::Text(accumulated) => {
                        accumulated.push_str(&text);
                        (!text.is_empty()).then_some(text)
                    }
                    BlockBuffer::ToolUse { .. } => None,
                }
            }
            BlockDelta::ToolInput(fragment) => {
                if let Some(BlockBuffer::ToolUse { input_json, .. }) = self.open.get_mut(&index) {
                    input_json.push_str(&fragment);
                }
                None
            }
        }
    }

    fn close(&mut self, index: usize) {
        let Some(buffer) = self.open.remove(&index) else {
            return;
        };

        let block = match buffer {
            BlockBuffer::Text(text) => CompletedBlock::Text(text),
            BlockBuffer::ToolUse {
                id,
                name,
                input_json,
            } => CompletedBlock::ToolUse(ToolRequest::new(id, name, ToolInput::parse(&input_json))),
        };
        self.completed.insert(index, block);
    }
}
