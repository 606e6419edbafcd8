#![cfg(feature = "provider-anthropic")]

use pprovider::{
    AnthropicProvider, AnthropicSseDecoder, BlockDelta, BlockStart, ContentBlock, Message,
    ModelProvider, ModelRequest, ProviderErrorKind, ProviderId, StopReason, StreamEvent,
};
use serde_json::json;

const TOOL_USE_TRANSCRIPT: &str = concat!(
    "event: message_start\n",
    "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\",\"role\":\"assistant\",\"usage\":{\"input_tokens\":40,\"output_tokens\":1}}}\n\n",
    "event: content_block_start\n",
    "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n\n",
    "event: content_block_delta\n",
    "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Loading skill\"}}\n\n",
    "event: content_block_stop\n",
    "data: {\"type\":\"content_block_stop\",\"index\":0}\n\n",
    "event: content_block_start\n",
    "data: {\"type\":\"content_block_start\",\"index\":1,\"content_block\":{\"type\":\"tool_use\",\"id\":\"toolu_1\",\"name\":\"get_skill\",\"input\":{}}}\n\n",
    "event: content_block_delta\n",
    "data: {\"type\":\"content_block_delta\",\"index\":1,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"{\\\"skill_name\\\":\"}}\n\n",
    "event: content_block_delta\n",
    "data: {\"type\":\"content_block_delta\",\"index\":1,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"\\\"xlsx\\\"}\"}}\n\n",
    "event: content_block_stop\n",
    "data: {\"type\":\"content_block_stop\",\"index\":1}\n\n",
    "event: message_delta\n",
    "data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"tool_use\"},\"usage\":{\"output_tokens\":21}}\n\n",
    "event: message_stop\n",
    "data: {\"type\":\"message_stop\"}\n\n",
);

#[test]
fn decoder_replays_a_full_tool_use_response() {
    let mut decoder = AnthropicSseDecoder::new();
    let mut events = Vec::new();

    // Feed the transcript in small uneven slices to exercise line buffering.
    let bytes = TOOL_USE_TRANSCRIPT.as_bytes();
    for chunk in bytes.chunks(17) {
        let text = std::str::from_utf8(chunk).expect("transcript is ascii");
        events.extend(decoder.push_chunk(text));
    }
    events.extend(decoder.finish());

    let events = events
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .expect("transcript should decode");

    let input_fragments = events
        .iter()
        .filter_map(|event| match event {
            StreamEvent::ContentBlockDelta {
                index: 1,
                delta: BlockDelta::ToolInput(fragment),
            } => Some(fragment.as_str()),
            _ => None,
        })
        .collect::<String>();
    assert_eq!(input_fragments, "{\"skill_name\":\"xlsx\"}");

    assert!(events.contains(&StreamEvent::ContentBlockStart {
        index: 1,
        block: BlockStart::ToolUse {
            id: "toolu_1".to_string(),
            name: "get_skill".to_string(),
        },
    }));
    assert_eq!(
        events.last(),
        Some(&StreamEvent::MessageStop {
            stop_reason: StopReason::ToolUse
        })
    );
}

#[test]
fn request_body_is_streaming_and_carries_transcript() {
    let request = ModelRequest::new(
        "claude-sonnet",
        vec![
            Message::user_text("hi"),
            Message::assistant(vec![ContentBlock::text("hello")]),
        ],
    )
    .with_system("system text");

    let body = AnthropicProvider::request_body(&request);
    assert_eq!(body["stream"], json!(true));
    assert_eq!(body["system"], json!("system text"));
    assert_eq!(body["messages"][1]["role"], json!("assistant"));
    assert!(body.get("tools").is_none());
}

#[tokio::test]
async fn provider_rejects_invalid_requests_before_sending() {
    let provider = AnthropicProvider::new(reqwest::Client::new())
        .with_base_url("http://127.0.0.1:9")
        .with_api_key("test-key");
    assert_eq!(provider.id(), ProviderId::Anthropic);

    let result = provider
        .stream(ModelRequest::new("claude-sonnet", Vec::new()))
        .await;

    let error = match result {
        Ok(_) => panic!("empty transcript should be rejected"),
        Err(error) => error,
    };
    assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
}
