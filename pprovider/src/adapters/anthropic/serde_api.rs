//! Anthropic Messages API wire types and mapping to provider-agnostic types.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    BlockDelta, BlockStart, ContentBlock, Message, ModelRequest, ProviderError, Role, StopReason,
    StreamEvent, TokenUsage, ToolSpec, ToolStatus,
};

pub(crate) fn build_api_request(request: &ModelRequest, stream: bool) -> Value {
    let mut body = json!({
        "model": request.model,
        "max_tokens": request.options.max_tokens,
        "temperature": request.options.temperature,
        "messages": request.messages.iter().map(message_to_api).collect::<Vec<_>>(),
        "stream": stream,
    });

    if let Some(system) = &request.system {
        body["system"] = Value::String(system.clone());
    }

    if !request.tools.is_empty() {
        body["tools"] = Value::Array(request.tools.iter().map(tool_to_api).collect());
    }

    body
}

fn message_to_api(message: &Message) -> Value {
    let role = match message.role {
        Role::User => "user",
        Role::Assistant => "assistant",
    };

    json!({
        "role": role,
        "content": message.content.iter().map(block_to_api).collect::<Vec<_>>(),
    })
}

fn block_to_api(block: &ContentBlock) -> Value {
    match block {
        ContentBlock::Text { text } => json!({ "type": "text", "text": text }),
        ContentBlock::Image { format, bytes } => json!({
            "type": "image",
            "source": {
                "type": "base64",
                "media_type": media_type(format),
                "data": STANDARD.encode(bytes),
            },
        }),
        ContentBlock::ToolUse { id, name, input } => json!({
            "type": "tool_use",
            "id": id,
            "name": name,
            "input": input,
        }),
        ContentBlock::ToolResult {
            tool_use_id,
            status,
            content,
            ..
        } => json!({
            "type": "tool_result",
            "tool_use_id": tool_use_id,
            "content": tool_result_content(content),
            "is_error": *status == ToolStatus::Error,
        }),
    }
}

fn tool_to_api(tool: &ToolSpec) -> Value {
    json!({
        "name": tool.name,
        "description": tool.description,
        "input_schema": tool.input_schema,
    })
}

fn media_type(format: &str) -> String {
    match format.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        other => format!("image/{other}"),
    }
}

/// Tool envelopes carry either `{"text": ..}`, a list of such objects, or a
/// bare string; anything else is forwarded as its JSON text.
fn tool_result_content(content: &Value) -> Value {
    match content {
        Value::String(text) => json!([{ "type": "text", "text": text }]),
        Value::Object(map) if map.contains_key("text") => {
            json!([{ "type": "text", "text": value_text(&map["text"]) }])
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| match item.get("text") {
                    Some(text) => json!({ "type": "text", "text": value_text(text) }),
                    None => json!({ "type": "text", "text": item.to_string() }),
                })
                .collect(),
        ),
        other => json!([{ "type": "text", "text": other.to_string() }]),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiStreamEvent {
    MessageStart {
        message: ApiMessageStart,
    },
    ContentBlockStart {
        index: usize,
        content_block: ApiBlockStart,
    },
    ContentBlockDelta {
        index: usize,
        delta: ApiDelta,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        delta: ApiMessageDelta,
        #[serde(default)]
        usage: Option<ApiUsage>,
    },
    MessageStop,
    Error {
        error: ApiErrorBody,
    },
    #[serde(other)]
    Ignored,
}

#[derive(Debug, Deserialize)]
struct ApiMessageStart {
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiBlockStart {
    Text,
    ToolUse {
        id: String,
        name: String,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiDelta {
    TextDelta {
        text: String,
    },
    InputJsonDelta {
        partial_json: String,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct ApiMessageDelta {
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(rename = "type", default)]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub(crate) error: ApiErrorBody,
}

/// Incremental decoder from SSE text to [`StreamEvent`] values.
///
/// `message_delta` carries the stop reason while `message_stop` carries
/// nothing, so the reason is held until the stop arrives.
#[derive(Debug, Default)]
pub struct AnthropicSseDecoder {
    buffer: String,
    input_tokens: u32,
    stop_reason: Option<StopReason>,
}

impl AnthropicSseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chunk(&mut self, chunk: &str) -> Vec<Result<StreamEvent, ProviderError>> {
        self.buffer.push_str(chunk);
        let mut events = Vec::new();

        while let Some(newline_index) = self.buffer.find('\n') {
            let line = self.buffer.drain(..=newline_index).collect::<String>();
            if let Some(event) = self.decode_line(line.trim()) {
                events.push(event);
            }
        }

        events
    }

    pub fn finish(&mut self) -> Vec<Result<StreamEvent, ProviderError>> {
        let rest = std::mem::take(&mut self.buffer);
        self.decode_line(rest.trim()).into_iter().collect()
    }

    fn decode_line(&mut self, line: &str) -> Option<Result<StreamEvent, ProviderError>> {
        let payload = line.strip_prefix("data:")?.trim();
        if payload.is_empty() {
            return None;
        }

        let event = match serde_json::from_str::<ApiStreamEvent>(payload) {
            Ok(event) => event,
            Err(err) => {
                return Some(Err(ProviderError::stream(format!(
                    "malformed stream event: {err}"
                ))));
            }
        };

        match event {
            ApiStreamEvent::MessageStart { message } => {
                self.input_tokens = message.usage.unwrap_or_default().input_tokens;
                Some(Ok(StreamEvent::MessageStart {
                    role: Role::Assistant,
                }))
            }
            ApiStreamEvent::ContentBlockStart {
                index,
                content_block,
            } => {
                let block = match content_block {
                    ApiBlockStart::Text => BlockStart::Text,
                    ApiBlockStart::ToolUse { id, name } => BlockStart::ToolUse { id, name },
                    ApiBlockStart::Unsupported => return None,
                };
                Some(Ok(StreamEvent::ContentBlockStart { index, block }))
            }
            ApiStreamEvent::ContentBlockDelta { index, delta } => {
                let delta = match delta {
                    ApiDelta::TextDelta { text } => BlockDelta::Text(text),
                    ApiDelta::InputJsonDelta { partial_json } => BlockDelta::ToolInput(partial_json),
                    ApiDelta::Unsupported => return None,
                };
                Some(Ok(StreamEvent::ContentBlockDelta { index, delta }))
            }
            ApiStreamEvent::ContentBlockStop { index } => {
                Some(Ok(StreamEvent::ContentBlockStop { index }))
            }
            ApiStreamEvent::MessageDelta { delta, usage } => {
                if let Some(reason) = delta.stop_reason {
                    self.stop_reason = Some(StopReason::parse(&reason));
                }
                let usage = usage.unwrap_or_default();
                Some(Ok(StreamEvent::Metadata {
                    usage: TokenUsage {
                        input_tokens: self.input_tokens,
                        output_tokens: usage.output_tokens,
                    },
                }))
            }
            ApiStreamEvent::MessageStop => Some(Ok(StreamEvent::MessageStop {
                stop_reason: self.stop_reason.take().unwrap_or(StopReason::EndTurn),
            })),
            ApiStreamEvent::Error { error } => Some(Err(map_api_error(None, error))),
            ApiStreamEvent::Ignored => None,
        }
    }
}

pub(crate) fn map_api_error(status: Option<u16>, error: ApiErrorBody) -> ProviderError {
    let message = if error.kind.is_empty() {
        error.message
    } else {
        format!("{}: {}", error.kind, error.message)
    };

    match (status, error.kind.as_str()) {
        (Some(413), _) => ProviderError::input_too_large(message),
        (Some(401 | 403), _) | (_, "authentication_error" | "permission_error") => {
            ProviderError::authentication(message)
        }
        (Some(429), _) | (_, "rate_limit_error") => ProviderError::rate_limited(message),
        (Some(408 | 504), _) => ProviderError::timeout(message),
        (Some(502 | 503 | 529), _) | (_, "overloaded_error" | "api_error") => {
            ProviderError::unavailable(message)
        }
        (Some(400 | 422), _) | (_, "invalid_request_error") => {
            if mentions_oversized_input(&message) {
                ProviderError::input_too_large(message)
            } else {
                ProviderError::invalid_request(message)
            }
        }
        (None, _) => ProviderError::stream(message),
        _ => ProviderError::transport(message),
    }
}

fn mentions_oversized_input(message: &str) -> bool {
    let lower = message.to_lowercase();
    OVERSIZED_INPUT_PHRASES
        .iter()
        .any(|phrase| lower.contains(phrase))
}

const OVERSIZED_INPUT_PHRASES: &[&str] = &[
    "input is too long",
    "prompt is too long",
    "request too large",
];

#[cfg(test)]
mod tests {
    use pcommon::ExtraMap;

    use super::*;
    use crate::ProviderErrorKind;

    #[test]
    fn request_body_maps_blocks_and_tools() {
        let request = ModelRequest::new(
            "claude-sonnet",
            vec![
                Message::user(vec![
                    ContentBlock::text("look"),
                    ContentBlock::image("jpg", vec![1, 2, 3]),
                ]),
                Message::assistant(vec![ContentBlock::ToolUse {
                    id: "toolu_1".to_string(),
                    name: "get_skill".to_string(),
                    input: json!({"skill_name": "xlsx"}),
                }]),
                Message::user(vec![ContentBlock::ToolResult {
                    tool_use_id: "toolu_1".to_string(),
                    status: ToolStatus::Error,
                    content: json!({"text": "missing"}),
                    extra: ExtraMap::new(),
                }]),
            ],
        )
        .with_system("be useful")
        .with_tools(vec![ToolSpec::new("get_skill", "Load a skill", json!({"type": "object"}))]);

        let body = build_api_request(&request, true);
        assert_eq!(body["system"], "be useful");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 5120);
        assert_eq!(body["messages"][0]["content"][1]["source"]["media_type"], "image/jpeg");
        assert_eq!(body["messages"][0]["content"][1]["source"]["data"], "AQID");
        assert_eq!(body["messages"][1]["content"][0]["input"]["skill_name"], "xlsx");
        assert_eq!(body["messages"][2]["content"][0]["is_error"], true);
        assert_eq!(body["messages"][2]["content"][0]["content"][0]["text"], "missing");
        assert_eq!(body["tools"][0]["name"], "get_skill");
    }

    #[test]
    fn decoder_handles_events_split_across_chunks() {
        let mut decoder = AnthropicSseDecoder::new();
        let mut events = decoder.push_chunk(
            "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"usage\":{\"input_tokens\":12}}}\n\n",
        );
        events.extend(decoder.push_chunk("data: {\"type\":\"content_block_delta\",\"index\":0,"));
        events.extend(decoder.push_chunk("\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}\n"));
        events.extend(decoder.push_chunk(
            "data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"tool_use\"},\"usage\":{\"output_tokens\":3}}\n",
        ));
        events.extend(decoder.push_chunk("data: {\"type\":\"ping\"}\n"));
        events.extend(decoder.push_chunk("data: {\"type\":\"message_stop\"}"));
        events.extend(decoder.finish());

        let events = events
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .expect("events should decode");

        assert_eq!(
            events,
            vec![
                StreamEvent::MessageStart {
                    role: Role::Assistant
                },
                StreamEvent::ContentBlockDelta {
                    index: 0,
                    delta: BlockDelta::Text("Hi".to_string()),
                },
                StreamEvent::Metadata {
                    usage: TokenUsage {
                        input_tokens: 12,
                        output_tokens: 3,
                    },
                },
                StreamEvent::MessageStop {
                    stop_reason: StopReason::ToolUse,
                },
            ]
        );
    }

    #[test]
    fn decoder_maps_tool_use_blocks() {
        let mut decoder = AnthropicSseDecoder::new();
        let events = decoder.push_chunk(concat!(
            "data: {\"type\":\"content_block_start\",\"index\":1,\"content_block\":{\"type\":\"tool_use\",\"id\":\"toolu_9\",\"name\":\"web_search\",\"input\":{}}}\n",
            "data: {\"type\":\"content_block_delta\",\"index\":1,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"{\\\"q\\\":\"}}\n",
            "data: {\"type\":\"content_block_stop\",\"index\":1}\n",
        ));

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            Ok(StreamEvent::ContentBlockStart {
                index: 1,
                block: BlockStart::ToolUse {
                    id: "toolu_9".to_string(),
                    name: "web_search".to_string(),
                },
            })
        );
        assert_eq!(
            events[1],
            Ok(StreamEvent::ContentBlockDelta {
                index: 1,
                delta: BlockDelta::ToolInput("{\"q\":".to_string()),
            })
        );
    }

    #[test]
    fn stream_error_event_maps_to_provider_error() {
        let mut decoder = AnthropicSseDecoder::new();
        let events = decoder.push_chunk(
            "data: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n",
        );

        let error = events[0].clone().expect_err("error event should fail");
        assert_eq!(error.kind, ProviderErrorKind::Unavailable);
    }

    #[test]
    fn http_errors_classify_oversized_prompts() {
        let error = map_api_error(
            Some(400),
            ApiErrorBody {
                kind: "invalid_request_error".to_string(),
                message: "prompt is too long: 210000 tokens > 200000 maximum".to_string(),
            },
        );
        assert!(error.is_input_too_large());

        let error = map_api_error(
            Some(429),
            ApiErrorBody {
                kind: "rate_limit_error".to_string(),
                message: "slow down".to_string(),
            },
        );
        assert_eq!(error.kind, ProviderErrorKind::RateLimited);

        let error = map_api_error(
            Some(413),
            ApiErrorBody {
                kind: "request_too_large".to_string(),
                message: "Request exceeds the maximum allowed number of bytes".to_string(),
            },
        );
        assert!(error.is_input_too_large());
    }

    #[test]
    fn slow_upstream_errors_stay_retryable() {
        let policy = crate::RetryPolicy::default().without_jitter();

        let timeout = map_api_error(
            Some(504),
            ApiErrorBody {
                kind: String::new(),
                message: "upstream request took too long to respond".to_string(),
            },
        );
        assert_eq!(timeout.kind, ProviderErrorKind::Timeout);
        assert!(!timeout.is_input_too_large());
        assert!(matches!(
            policy.decide(1, &timeout),
            crate::RetryDecision::Retry { .. }
        ));

        let mut decoder = AnthropicSseDecoder::new();
        let events = decoder.push_chunk(
            "data: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Queue wait took too long\"}}\n",
        );
        let overloaded = events[0].clone().expect_err("error event should fail");
        assert_eq!(overloaded.kind, ProviderErrorKind::Unavailable);
        assert!(matches!(
            policy.decide(1, &overloaded),
            crate::RetryDecision::Retry { .. }
        ));

        let bad_request = map_api_error(
            Some(400),
            ApiErrorBody {
                kind: "invalid_request_error".to_string(),
                message: "tool schema took too long to validate".to_string(),
            },
        );
        assert_eq!(bad_request.kind, ProviderErrorKind::InvalidRequest);
    }
}
