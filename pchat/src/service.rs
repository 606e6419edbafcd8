//! Turn orchestration: request, stream, optional tool cycle, retry.
//!
//! One turn moves through building the request, draining the stream and, when
//! the assistant asked for tools, a single tool cycle. Retries cover building
//! and streaming only; a failed attempt leaves no assistant content behind.

use std::sync::Arc;
use std::time::Instant;

use futures_timer::Delay;
use futures_util::{StreamExt, pin_mut};
use pcommon::{InferenceOptions, ToolExtraMap};
use pprovider::{
    Message, ModelProvider, ModelRequest, NoopOperationHooks, ProviderError,
    ProviderOperationHooks, RetryDecision, RetryPolicy,
};
use ptooling::{ToolExecutionContext, ToolRuntime};

use crate::{
    AggregatedResponse, ChatError, ChatTransport, NoopTurnHooks, SchemaSource, StreamAggregator,
    SystemPrompt, ToolCycle, TurnHooks, TurnOutcome,
};

pub const STREAM_OPERATION: &str = "stream";

#[derive(Clone)]
pub struct ChatService {
    provider: Arc<dyn ModelProvider>,
    tools: Arc<dyn ToolRuntime>,
    model: String,
    options: InferenceOptions,
    retry_policy: RetryPolicy,
    prompt: SystemPrompt,
    schema_source: Option<Arc<dyn SchemaSource>>,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
    turn_hooks: Arc<dyn TurnHooks>,
}

pub struct ChatServiceBuilder {
    provider: Arc<dyn ModelProvider>,
    tools: Arc<dyn ToolRuntime>,
    model: String,
    options: InferenceOptions,
    retry_policy: RetryPolicy,
    prompt: SystemPrompt,
    schema_source: Option<Arc<dyn SchemaSource>>,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
    turn_hooks: Arc<dyn TurnHooks>,
}

impl ChatServiceBuilder {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        tools: Arc<dyn ToolRuntime>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            options: InferenceOptions::default(),
            retry_policy: RetryPolicy::default(),
            prompt: SystemPrompt::default(),
            schema_source: None,
            provider_hooks: Arc::new(NoopOperationHooks),
            turn_hooks: Arc::new(NoopTurnHooks),
        }
    }

    pub fn options(mut self, options: InferenceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn prompt(mut self, prompt: SystemPrompt) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn schema_source(mut self, schema_source: Arc<dyn SchemaSource>) -> Self {
        self.schema_source = Some(schema_source);
        self
    }

    pub fn provider_hooks(mut self, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.provider_hooks = hooks;
        self
    }

    pub fn turn_hooks(mut self, hooks: Arc<dyn TurnHooks>) -> Self {
        self.turn_hooks = hooks;
        self
    }

    pub fn build(self) -> Result<ChatService, ChatError> {
        if self.model.trim().is_empty() {
            return Err(ChatError::invalid_request("model must not be empty"));
        }

        Ok(ChatService {
            provider: self.provider,
            tools: self.tools,
            model: self.model,
            options: self.options,
            retry_policy: self.retry_policy,
            prompt: self.prompt,
            schema_source: self.schema_source,
            provider_hooks: self.provider_hooks,
            turn_hooks: self.turn_hooks,
        })
    }
}

enum AttemptFailure {
    Provider(ProviderError),
    Transport(ChatError),
}

impl ChatService {
    pub fn builder(
        provider: Arc<dyn ModelProvider>,
        tools: Arc<dyn ToolRuntime>,
        model: impl Into<String>,
    ) -> ChatServiceBuilder {
        ChatServiceBuilder::new(provider, tools, model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Runs one turn over `messages`, appending the assistant message and,
    /// after a tool cycle, the tool-result user message.
    ///
    /// Returns [`TurnOutcome::Complete`] when no tools were requested.
    pub async fn run_turn(
        &self,
        context: &ToolExecutionContext,
        messages: &mut Vec<Message>,
        tool_extra: &mut ToolExtraMap,
        transport: &dyn ChatTransport,
    ) -> Result<TurnOutcome, ChatError> {
        self.turn_hooks.on_turn_start(&context.session_id);
        let started = Instant::now();

        let result = self
            .run_turn_inner(context, messages, tool_extra, transport)
            .await;
        match &result {
            Ok(outcome) => {
                self.turn_hooks
                    .on_turn_complete(&context.session_id, *outcome, started.elapsed())
            }
            Err(err) => {
                self.turn_hooks
                    .on_turn_failure(&context.session_id, err, started.elapsed())
            }
        }

        result
    }

    async fn run_turn_inner(
        &self,
        context: &ToolExecutionContext,
        messages: &mut Vec<Message>,
        tool_extra: &mut ToolExtraMap,
        transport: &dyn ChatTransport,
    ) -> Result<TurnOutcome, ChatError> {
        let response = self.stream_with_retry(context, messages, transport).await?;
        let execution_requested = response.execution_requested();
        if !response.message.content.is_empty() {
            messages.push(response.message);
        }

        if !execution_requested {
            return Ok(TurnOutcome::Complete);
        }

        let cycle = ToolCycle::new(response.tool_requests);
        self.turn_hooks
            .on_tool_cycle(&context.session_id, cycle.len());

        let running = cycle.running_payloads();
        transport.send_tool_running(&running).await?;
        tool_extra.extend(running);

        let outcome = cycle.execute(self.tools.as_ref(), context).await;
        messages.push(outcome.user_message());

        let finished = outcome.finished_payloads();
        transport.send_tool_finished(&finished).await?;
        for (tool_use_id, extra) in finished {
            tool_extra.entry(tool_use_id).or_default().extend(extra);
        }

        Ok(TurnOutcome::ToolCycleExecuted {
            tool_calls: cycle.len(),
        })
    }

    async fn stream_with_retry(
        &self,
        context: &ToolExecutionContext,
        messages: &[Message],
        transport: &dyn ChatTransport,
    ) -> Result<AggregatedResponse, ChatError> {
        let provider_id = self.provider.id();
        let mut attempt = 0_u32;

        loop {
            attempt += 1;
            self.provider_hooks
                .on_attempt_start(provider_id, STREAM_OPERATION, attempt);

            let request = self.build_request(context, messages).await;
            let error = match self.stream_once(request, transport).await {
                Ok(response) => {
                    self.provider_hooks
                        .on_success(provider_id, STREAM_OPERATION, attempt);
                    return Ok(response);
                }
                Err(AttemptFailure::Transport(err)) => return Err(err),
                Err(AttemptFailure::Provider(err)) => err,
            };

            match self.retry_policy.decide(attempt, &error) {
                RetryDecision::Retry { delay } => {
                    self.provider_hooks.on_retry_scheduled(
                        provider_id,
                        STREAM_OPERATION,
                        attempt,
                        delay,
                        &error,
                    );
                    transport
                        .send_text(&self.retry_policy.retry_status_line(attempt))
                        .await?;
                    Delay::new(delay).await;
                }
                RetryDecision::Abort(reason) => {
                    self.provider_hooks
                        .on_failure(provider_id, STREAM_OPERATION, attempt, &error);
                    transport.send_text(reason.status_line()).await?;
                    return Err(ChatError::aborted(reason, &error));
                }
            }
        }
    }

    async fn stream_once(
        &self,
        request: ModelRequest,
        transport: &dyn ChatTransport,
    ) -> Result<AggregatedResponse, AttemptFailure> {
        let events = self
            .provider
            .stream(request)
            .await
            .map_err(AttemptFailure::Provider)?;

        let mut aggregator = StreamAggregator::new();
        {
            let increments = aggregator.text_increments(events);
            pin_mut!(increments);
            while let Some(text) = increments.next().await {
                let text = text.map_err(AttemptFailure::Provider)?;
                transport
                    .send_text(&text)
                    .await
                    .map_err(AttemptFailure::Transport)?;
            }
        }

        Ok(aggregator.finish())
    }

    /// Request for the current transcript; never fails.
    pub async fn build_request(
        &self,
        context: &ToolExecutionContext,
        messages: &[Message],
    ) -> ModelRequest {
        let system = self
            .prompt
            .render(context, self.schema_source.as_deref())
            .await;

        ModelRequest::new(self.model.clone(), messages.to_vec())
            .with_system(system)
            .with_tools(self.tools.tool_specs())
            .with_options(self.options)
    }
}
