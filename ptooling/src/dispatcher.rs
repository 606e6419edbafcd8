//! Tool runtime trait and the catalog-backed dispatcher.
//!
//! Requests resolve through the [`ToolCatalog`] to either the local skill
//! library or a remote function. Multiple requests of one turn are executed
//! by the caller, one at a time, in tool-use order.

use std::sync::Arc;
use std::time::Instant;

use pprovider::ToolSpec;
use serde_json::{Value, json};

use crate::{
    NoopToolRuntimeHooks, RemoteFunctionId, RemoteInvoker, SkillLibrary, ToolCatalog, ToolError,
    ToolExecutionContext, ToolFuture, ToolInput, ToolKind, ToolRequest, ToolResultEnvelope,
    ToolRuntimeHooks,
};

/// Executes one tool request and returns a normalized envelope.
///
/// Resolution failures are returned as `error` envelopes. `Err` is reserved for
/// infrastructure failures of the remote path.
pub trait ToolRuntime: Send + Sync {
    fn tool_specs(&self) -> Vec<ToolSpec>;

    fn execute<'a>(
        &'a self,
        request: &'a ToolRequest,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolResultEnvelope, ToolError>>;
}

#[derive(Clone)]
pub struct ToolDispatcher {
    catalog: Arc<ToolCatalog>,
    skills: SkillLibrary,
    invoker: Arc<dyn RemoteInvoker>,
    hooks: Arc<dyn ToolRuntimeHooks>,
}

impl ToolDispatcher {
    pub fn new(
        catalog: Arc<ToolCatalog>,
        skills: SkillLibrary,
        invoker: Arc<dyn RemoteInvoker>,
    ) -> Self {
        Self {
            catalog,
            skills,
            invoker,
            hooks: Arc::new(NoopToolRuntimeHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn catalog(&self) -> Arc<ToolCatalog> {
        Arc::clone(&self.catalog)
    }

    async fn dispatch(
        &self,
        request: &ToolRequest,
        context: &ToolExecutionContext,
    ) -> Result<ToolResultEnvelope, ToolError> {
        let Some(kind) = self.catalog.resolve(&request.name) else {
            return Ok(ToolResultEnvelope::error_text(format!(
                "Tool {} not found.",
                request.name
            )));
        };

        let input = match &request.input {
            ToolInput::Json(value) => value,
            ToolInput::Malformed { reason, .. } => {
                return Ok(ToolResultEnvelope::error_text(format!(
                    "Invalid input for tool {}: {reason}",
                    request.name
                )));
            }
        };

        match kind {
            ToolKind::LocalSkill => Ok(self.skills.load_from_input(input)),
            ToolKind::Remote(function) => {
                self.invoke_remote(function, request, input, context).await
            }
        }
    }

    async fn invoke_remote(
        &self,
        function: &RemoteFunctionId,
        request: &ToolRequest,
        input: &Value,
        context: &ToolExecutionContext,
    ) -> Result<ToolResultEnvelope, ToolError> {
        let payload = remote_payload(request, input, context);
        tracing::debug!(
            tool = %request.name,
            tool_use_id = %request.id,
            function = %function,
            payload = %payload,
            "invoking remote tool"
        );

        let response = self
            .invoker
            .invoke(function, payload)
            .await
            .map_err(|err| {
                err.with_tool_name(&request.name)
                    .with_tool_use_id(&request.id)
            })?;
        tracing::debug!(
            tool = %request.name,
            tool_use_id = %request.id,
            response = %response,
            "remote tool responded"
        );

        ToolResultEnvelope::from_remote_payload(response).map_err(|err| {
            err.with_tool_name(&request.name)
                .with_tool_use_id(&request.id)
        })
    }
}

impl ToolRuntime for ToolDispatcher {
    fn tool_specs(&self) -> Vec<ToolSpec> {
        self.catalog.specs()
    }

    fn execute<'a>(
        &'a self,
        request: &'a ToolRequest,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolResultEnvelope, ToolError>> {
        Box::pin(async move {
            self.hooks.on_execution_start(request, context);
            let started = Instant::now();

            let result = self.dispatch(request, context).await;
            match &result {
                Ok(envelope) => {
                    self.hooks
                        .on_execution_success(request, context, envelope, started.elapsed())
                }
                Err(err) => {
                    self.hooks
                        .on_execution_failure(request, context, err, started.elapsed())
                }
            }

            result
        })
    }
}

/// Wire request sent to remote executors.
pub fn remote_payload(
    request: &ToolRequest,
    input: &Value,
    context: &ToolExecutionContext,
) -> Value {
    json!({
        "tool_use_id": request.id,
        "name": request.name,
        "input": input,
        "user_id": context.user_id,
        "session_id": context.session_id,
        "files": context.files,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pprovider::ToolStatus;

    use super::*;
    use crate::{ToolErrorKind, ToolFile};

    #[derive(Default)]
    struct RecordingInvoker {
        calls: Mutex<Vec<(String, Value)>>,
        response: Option<Value>,
    }

    impl RecordingInvoker {
        fn answering(response: Value) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                response: Some(response),
            }
        }
    }

    impl RemoteInvoker for RecordingInvoker {
        fn invoke<'a>(
            &'a self,
            function: &'a RemoteFunctionId,
            payload: Value,
        ) -> ToolFuture<'a, Result<Value, ToolError>> {
            Box::pin(async move {
                self.calls
                    .lock()
                    .expect("calls lock")
                    .push((function.to_string(), payload));
                self.response
                    .clone()
                    .ok_or_else(|| ToolError::transport("connection reset"))
            })
        }
    }

    fn dispatcher(invoker: Arc<RecordingInvoker>) -> ToolDispatcher {
        let mut catalog = ToolCatalog::new();
        catalog.register_skill_tool();
        catalog.register_code_interpreter(RemoteFunctionId::new("ci-fn"));
        ToolDispatcher::new(
            Arc::new(catalog),
            SkillLibrary::new(std::env::temp_dir().join("ptooling-no-skills")),
            invoker,
        )
    }

    fn context() -> ToolExecutionContext {
        ToolExecutionContext::new("user-1", "session-1")
            .with_files(vec![ToolFile::from_path("data/sales 2024.csv")])
    }

    #[tokio::test]
    async fn unknown_tool_returns_not_found_envelope() {
        let invoker = Arc::new(RecordingInvoker::default());
        let request = ToolRequest::new("t1", "calculator", ToolInput::Json(json!({})));

        let envelope = dispatcher(Arc::clone(&invoker))
            .execute(&request, &context())
            .await
            .expect("unknown tool is recoverable");

        assert_eq!(envelope.status, ToolStatus::Error);
        assert_eq!(envelope.content, json!({"text": "Tool calculator not found."}));
        assert!(invoker.calls.lock().expect("calls lock").is_empty());
    }

    #[tokio::test]
    async fn malformed_input_returns_error_envelope_without_invoking() {
        let invoker = Arc::new(RecordingInvoker::answering(json!({"status": "success"})));
        let request = ToolRequest::new(
            "t2",
            "code_interpreter",
            ToolInput::parse("{\"code\": \"print("),
        );

        let envelope = dispatcher(Arc::clone(&invoker))
            .execute(&request, &context())
            .await
            .expect("malformed input is recoverable");

        assert_eq!(envelope.status, ToolStatus::Error);
        let text = envelope.content["text"].as_str().expect("text content");
        assert!(text.starts_with("Invalid input for tool code_interpreter: "));
        assert!(invoker.calls.lock().expect("calls lock").is_empty());
    }

    #[tokio::test]
    async fn remote_tool_receives_full_payload() {
        let invoker = Arc::new(RecordingInvoker::answering(json!({
            "status": "success",
            "content": [{"text": "42"}],
            "extra": {"files": ["out.png"]},
        })));
        let request = ToolRequest::new(
            "t3",
            "code_interpreter",
            ToolInput::Json(json!({"code": "print(6*7)"})),
        );

        let envelope = dispatcher(Arc::clone(&invoker))
            .execute(&request, &context())
            .await
            .expect("remote call should succeed");

        assert!(envelope.is_success());
        assert_eq!(envelope.extra["files"], json!(["out.png"]));

        let calls = invoker.calls.lock().expect("calls lock");
        assert_eq!(calls.len(), 1);
        let (function, payload) = &calls[0];
        assert_eq!(function, "ci-fn");
        assert_eq!(payload["tool_use_id"], "t3");
        assert_eq!(payload["name"], "code_interpreter");
        assert_eq!(payload["input"], json!({"code": "print(6*7)"}));
        assert_eq!(payload["user_id"], "user-1");
        assert_eq!(payload["session_id"], "session-1");
        assert_eq!(
            payload["files"],
            json!([{"original": "sales 2024.csv", "sanitized": "sales_2024.csv"}])
        );
    }

    #[tokio::test]
    async fn remote_transport_failure_propagates_with_context() {
        let invoker = Arc::new(RecordingInvoker::default());
        let request = ToolRequest::new(
            "t4",
            "code_interpreter",
            ToolInput::Json(json!({"code": "1"})),
        );

        let error = dispatcher(invoker)
            .execute(&request, &context())
            .await
            .expect_err("transport failure should propagate");

        assert_eq!(error.kind, ToolErrorKind::Transport);
        assert_eq!(error.tool_name.as_deref(), Some("code_interpreter"));
        assert_eq!(error.tool_use_id.as_deref(), Some("t4"));
    }

    #[tokio::test]
    async fn remote_response_without_status_is_invalid() {
        let invoker = Arc::new(RecordingInvoker::answering(json!({"content": {}})));
        let request = ToolRequest::new(
            "t5",
            "code_interpreter",
            ToolInput::Json(json!({"code": "1"})),
        );

        let error = dispatcher(invoker)
            .execute(&request, &context())
            .await
            .expect_err("invalid response should propagate");

        assert_eq!(error.kind, ToolErrorKind::InvalidResponse);
    }

    #[tokio::test]
    async fn missing_skill_bundle_is_not_found_envelope() {
        let invoker = Arc::new(RecordingInvoker::default());
        let request = ToolRequest::new(
            "t6",
            "get_skill",
            ToolInput::Json(json!({"skill_name": "absent"})),
        );

        let envelope = dispatcher(invoker)
            .execute(&request, &context())
            .await
            .expect("missing skill is recoverable");

        assert_eq!(envelope.status, ToolStatus::Error);
        assert_eq!(
            envelope.content["text"],
            "Skill 'absent' instructions not found."
        );
    }
}
