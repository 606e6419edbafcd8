//! Streaming event contracts and in-memory stream utilities.
//!
//! ```rust
//! use pprovider::{BlockDelta, BoxedEventStream, StreamEvent, VecEventStream};
//!
//! let stream = VecEventStream::new(vec![Ok(StreamEvent::ContentBlockDelta {
//!     index: 0,
//!     delta: BlockDelta::Text("hello".into()),
//! })]);
//! let _boxed: BoxedEventStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::{ProviderError, Role, StopReason, TokenUsage};

/// Block header announced by `ContentBlockStart`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStart {
    Text,
    ToolUse { id: String, name: String },
}

/// Partial payload carried by `ContentBlockDelta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockDelta {
    Text(String),
    /// Raw fragment of the tool input JSON document.
    ToolInput(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    MessageStart { role: Role },
    ContentBlockStart { index: usize, block: BlockStart },
    ContentBlockDelta { index: usize, delta: BlockDelta },
    ContentBlockStop { index: usize },
    MessageStop { stop_reason: StopReason },
    Metadata { usage: TokenUsage },
}

/// Provider stream contract.
///
/// Invariants for consumers:
/// - Events are emitted in source order, and that order is authoritative.
/// - For one block index events arrive as start, zero or more deltas, stop.
///   A text block may omit its start event.
/// - An `Err` item ends the useful part of the stream.
/// - Once the stream yields `None`, it must not yield additional items.
pub trait ModelEventStream: Stream<Item = Result<StreamEvent, ProviderError>> + Send {}

impl<T> ModelEventStream for T where T: Stream<Item = Result<StreamEvent, ProviderError>> + Send {}

pub type BoxedEventStream<'a> = Pin<Box<dyn ModelEventStream + 'a>>;

#[derive(Debug)]
pub struct VecEventStream {
    events: VecDeque<Result<StreamEvent, ProviderError>>,
}

impl VecEventStream {
    pub fn new(events: Vec<Result<StreamEvent, ProviderError>>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

impl Stream for VecEventStream {
    type Item = Result<StreamEvent, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<StreamEvent, ProviderError>>> {
        Poll::Ready(self.events.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    #[tokio::test]
    async fn vec_event_stream_yields_events_in_order() {
        let mut stream = VecEventStream::new(vec![
            Ok(StreamEvent::MessageStart {
                role: Role::Assistant,
            }),
            Err(ProviderError::stream("connection reset")),
        ]);

        assert_eq!(
            stream.next().await,
            Some(Ok(StreamEvent::MessageStart {
                role: Role::Assistant
            }))
        );
        assert_eq!(
            stream.next().await,
            Some(Err(ProviderError::stream("connection reset")))
        );
        assert_eq!(stream.next().await, None);
    }
}
