//! Tool requests, result envelopes, and execution context.

use pcommon::{ExtraMap, SessionId, UserId};
use pprovider::{ContentBlock, ToolStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::ToolError;

/// Structured tool input reconstructed from streamed JSON fragments.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInput {
    Json(Value),
    /// The concatenated fragments did not parse; kept for diagnostics.
    Malformed { raw: String, reason: String },
}

impl ToolInput {
    /// Parses a complete input buffer. An empty buffer means "no arguments".
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::Json(Value::Object(Default::default()));
        }

        match serde_json::from_str(raw) {
            Ok(value) => Self::Json(value),
            Err(err) => Self::Malformed {
                raw: raw.to_string(),
                reason: err.to_string(),
            },
        }
    }

    /// Value recorded in the transcript; malformed input is recorded as `{}`.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Malformed { .. } => Value::Object(Default::default()),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

/// A completed tool-use block, valid only within one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub id: String,
    pub name: String,
    pub input: ToolInput,
}

impl ToolRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: ToolInput) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn to_content_block(&self) -> ContentBlock {
        ContentBlock::ToolUse {
            id: self.id.clone(),
            name: self.name.clone(),
            input: self.input.to_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultEnvelope {
    pub status: ToolStatus,
    pub content: Value,
    #[serde(default)]
    pub extra: ExtraMap,
}

impl ToolResultEnvelope {
    pub fn new(status: ToolStatus, content: Value) -> Self {
        Self {
            status,
            content,
            extra: ExtraMap::new(),
        }
    }

    pub fn success_text(text: impl Into<String>) -> Self {
        Self::new(ToolStatus::Success, json!({ "text": text.into() }))
    }

    pub fn error_text(text: impl Into<String>) -> Self {
        Self::new(ToolStatus::Error, json!({ "text": text.into() }))
    }

    pub fn with_extra(mut self, extra: ExtraMap) -> Self {
        self.extra = extra;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    /// Parses a remote executor response `{status, content?, extra?}`.
    pub fn from_remote_payload(payload: Value) -> Result<Self, ToolError> {
        let Value::Object(mut map) = payload else {
            return Err(ToolError::invalid_response(
                "remote tool response must be a JSON object",
            ));
        };

        let status = match map.get("status").and_then(Value::as_str) {
            Some("success") => ToolStatus::Success,
            Some("error") => ToolStatus::Error,
            Some(other) => {
                return Err(ToolError::invalid_response(format!(
                    "unknown remote tool status '{other}'"
                )));
            }
            None => {
                return Err(ToolError::invalid_response(
                    "remote tool response is missing 'status'",
                ));
            }
        };

        let content = map
            .remove("content")
            .unwrap_or_else(|| Value::Object(Default::default()));
        let extra = match map.remove("extra") {
            Some(Value::Object(extra)) => extra,
            Some(Value::Null) | None => ExtraMap::new(),
            Some(_) => {
                return Err(ToolError::invalid_response(
                    "remote tool 'extra' must be a JSON object",
                ));
            }
        };

        Ok(Self {
            status,
            content,
            extra,
        })
    }

    pub fn to_content_block(&self, tool_use_id: impl Into<String>) -> ContentBlock {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            status: self.status,
            content: self.content.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// A user file visible to tools under a sanitized name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFile {
    pub original: String,
    pub sanitized: String,
}

impl ToolFile {
    /// Builds the entry from a client-supplied path, keeping only the basename.
    pub fn from_path(path: &str) -> Self {
        let original = path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(path)
            .to_string();
        let sanitized = original
            .chars()
            .map(|ch| {
                if ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-') {
                    ch
                } else {
                    '_'
                }
            })
            .collect();

        Self {
            original,
            sanitized,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExecutionContext {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub files: Vec<ToolFile>,
}

impl ToolExecutionContext {
    pub fn new(user_id: impl Into<UserId>, session_id: impl Into<SessionId>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            files: Vec::new(),
        }
    }

    pub fn with_files(mut self, files: Vec<ToolFile>) -> Self {
        self.files = files;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_input_parses_valid_and_empty_buffers() {
        assert_eq!(
            ToolInput::parse("{\"skill_name\":\"demo\"}"),
            ToolInput::Json(json!({"skill_name": "demo"}))
        );
        assert_eq!(ToolInput::parse("  "), ToolInput::Json(json!({})));
    }

    #[test]
    fn malformed_input_is_recorded_as_empty_object() {
        let input = ToolInput::parse("{\"skill_name\":");
        assert!(input.is_malformed());
        assert_eq!(input.to_value(), json!({}));
    }

    #[test]
    fn remote_payload_defaults_missing_content_and_extra() {
        let envelope = ToolResultEnvelope::from_remote_payload(json!({"status": "success"}))
            .expect("payload should parse");
        assert!(envelope.is_success());
        assert_eq!(envelope.content, json!({}));
        assert!(envelope.extra.is_empty());
    }

    #[test]
    fn remote_payload_keeps_extra_metadata() {
        let envelope = ToolResultEnvelope::from_remote_payload(json!({
            "status": "error",
            "content": [{"text": "boom"}],
            "extra": {"images": ["plot.png"]},
        }))
        .expect("payload should parse");

        assert_eq!(envelope.status, ToolStatus::Error);
        assert_eq!(envelope.content, json!([{"text": "boom"}]));
        assert_eq!(envelope.extra["images"], json!(["plot.png"]));
    }

    #[test]
    fn remote_payload_without_status_is_invalid() {
        let error = ToolResultEnvelope::from_remote_payload(json!({"content": {}}))
            .expect_err("missing status should fail");
        assert_eq!(error.kind, crate::ToolErrorKind::InvalidResponse);

        let error = ToolResultEnvelope::from_remote_payload(json!("ok"))
            .expect_err("non-object should fail");
        assert_eq!(error.kind, crate::ToolErrorKind::InvalidResponse);
    }

    #[test]
    fn tool_file_sanitizes_basename() {
        let file = ToolFile::from_path("uploads/Q3 report (final).csv");
        assert_eq!(file.original, "Q3 report (final).csv");
        assert_eq!(file.sanitized, "Q3_report__final_.csv");
    }

    #[test]
    fn envelope_becomes_tool_result_block() {
        let block = ToolResultEnvelope::error_text("Tool x not found.").to_content_block("t1");
        match block {
            ContentBlock::ToolResult {
                tool_use_id,
                status,
                content,
                ..
            } => {
                assert_eq!(tool_use_id, "t1");
                assert_eq!(status, ToolStatus::Error);
                assert_eq!(content["text"], "Tool x not found.");
            }
            other => panic!("unexpected block {other:?}"),
        }
    }
}
