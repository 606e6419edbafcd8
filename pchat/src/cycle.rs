//! One tool-execution round: ordered dispatch and result pairing.

use pcommon::{ExtraMap, ToolExtraMap};
use pprovider::{ContentBlock, Message};
use ptooling::{ToolExecutionContext, ToolRequest, ToolResultEnvelope, ToolRuntime};
use serde_json::{Value, json};

/// Tool requests collected from one assistant message, in block order.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCycle {
    requests: Vec<ToolRequest>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    pub tool_use_id: String,
    pub name: String,
    pub envelope: ToolResultEnvelope,
}

/// Envelopes of a finished cycle, paired one-to-one with the requests.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCycleOutcome {
    pub results: Vec<ToolCallResult>,
}

impl ToolCycle {
    pub fn new(requests: Vec<ToolRequest>) -> Self {
        Self { requests }
    }

    pub fn requests(&self) -> &[ToolRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// `{"status":"running","name":..,"input":..}` per tool-use id.
    pub fn running_payloads(&self) -> ToolExtraMap {
        self.requests
            .iter()
            .map(|request| {
                let mut payload = ExtraMap::new();
                payload.insert("status".to_string(), json!("running"));
                payload.insert("name".to_string(), Value::String(request.name.clone()));
                payload.insert("input".to_string(), request.input.to_value());
                (request.id.clone(), payload)
            })
            .collect()
    }

    /// Executes every request sequentially, in order.
    ///
    /// Infrastructure failures of a single call become an `error` envelope so
    /// each tool-use still receives its result.
    pub async fn execute(
        &self,
        runtime: &dyn ToolRuntime,
        context: &ToolExecutionContext,
    ) -> ToolCycleOutcome {
        let mut results = Vec::with_capacity(self.requests.len());
        for request in &self.requests {
            let envelope = match runtime.execute(request, context).await {
                Ok(envelope) => envelope,
                Err(err) => {
                    tracing::error!(
                        tool = %request.name,
                        tool_use_id = %request.id,
                        session_id = %context.session_id,
                        error_kind = ?err.kind,
                        error = %err,
                        "tool invocation failed"
                    );
                    ToolResultEnvelope::error_text(format!(
                        "Tool {} failed: {}",
                        request.name, err.message
                    ))
                }
            };

            results.push(ToolCallResult {
                tool_use_id: request.id.clone(),
                name: request.name.clone(),
                envelope,
            });
        }

        ToolCycleOutcome { results }
    }
}

impl ToolCycleOutcome {
    /// User message carrying one `tool_result` block per request, in order.
    pub fn user_message(&self) -> Message {
        Message::user(
            self.results
                .iter()
                .map(|result| result.envelope.to_content_block(&result.tool_use_id))
                .collect::<Vec<ContentBlock>>(),
        )
    }

    /// `{"status": "success"|"error"}` merged with each envelope's `extra`.
    pub fn finished_payloads(&self) -> ToolExtraMap {
        self.results
            .iter()
            .map(|result| {
                let mut payload = ExtraMap::new();
                payload.insert(
                    "status".to_string(),
                    json!(result.envelope.status.as_str()),
                );
                for (key, value) in &result.envelope.extra {
                    payload.insert(key.clone(), value.clone());
                }
                (result.tool_use_id.clone(), payload)
            })
            .collect()
    }
}
