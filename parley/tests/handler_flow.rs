use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use parley::prelude::*;
use parley::{
    ContentBlock, FilesystemFileService, InMemorySessionStore, OutboundMessage, build_runtime_with,
};
use pprovider::{
    BlockDelta, BlockStart, BoxedEventStream, ModelRequest, ProviderError, ProviderFuture,
    ProviderId, StopReason, StreamEvent, VecEventStream,
};
use ptooling::{RemoteFunctionId, ToolError, ToolFuture};
use serde_json::{Value, json};

struct ScriptedProvider {
    responses: Mutex<VecDeque<Vec<StreamEvent>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Vec<StreamEvent>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }
}

impl ModelProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Custom("scripted")
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            self.requests.lock().expect("requests lock").push(request);
            let events = self
                .responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .ok_or_else(|| ProviderError::other("no scripted response left"))?;
            let stream = VecEventStream::new(events.into_iter().map(Ok).collect());
            Ok(Box::pin(stream) as BoxedEventStream<'a>)
        })
    }
}

/// Answers every remote call with a fixed success payload.
struct EchoInvoker {
    calls: Mutex<Vec<Value>>,
}

impl RemoteInvoker for EchoInvoker {
    fn invoke<'a>(
        &'a self,
        _function: &'a RemoteFunctionId,
        payload: Value,
    ) -> ToolFuture<'a, Result<Value, ToolError>> {
        Box::pin(async move {
            self.calls.lock().expect("calls lock").push(payload);
            Ok(json!({
                "status": "success",
                "content": {"text": "42"},
                "extra": {"images": ["plot.png"]}
            }))
        })
    }
}

fn text_reply(text: &str) -> Vec<StreamEvent> {
    vec![
        StreamEvent::ContentBlockStart {
            index: 0,
            block: BlockStart::Text,
        },
        StreamEvent::ContentBlockDelta {
            index: 0,
            delta: BlockDelta::Text(text.to_string()),
        },
        StreamEvent::ContentBlockStop { index: 0 },
        StreamEvent::MessageStop {
            stop_reason: StopReason::EndTurn,
        },
    ]
}

fn code_interpreter_call() -> Vec<StreamEvent> {
    vec![
        StreamEvent::ContentBlockStart {
            index: 0,
            block: BlockStart::ToolUse {
                id: "toolu_ci".to_string(),
                name: "code_interpreter".to_string(),
            },
        },
        StreamEvent::ContentBlockDelta {
            index: 0,
            delta: BlockDelta::ToolInput("{\"code\":\"print(6*7)\"}".to_string()),
        },
        StreamEvent::ContentBlockStop { index: 0 },
        StreamEvent::MessageStop {
            stop_reason: StopReason::ToolUse,
        },
    ]
}

fn temp_root() -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("parley-handler-{unique}"))
}

struct Fixture {
    runtime: RuntimeBundle,
    provider: Arc<ScriptedProvider>,
    invoker: Arc<EchoInvoker>,
    root: PathBuf,
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

fn fixture(responses: Vec<Vec<StreamEvent>>) -> Fixture {
    let root = temp_root();
    let uploads = root.join("uploads");
    let session_dir = uploads.join("user-1").join("session-1");
    std::fs::create_dir_all(&session_dir).expect("upload dir should be created");
    std::fs::write(session_dir.join("chart.png"), [1_u8, 2, 3]).expect("image should be written");
    std::fs::write(session_dir.join("sales.csv"), "region,units\nnorth,3\n")
        .expect("csv should be written");

    let config = AppConfig::from_lookup(|key| match key {
        "AWS_REGION" => Some("us-east-1".to_string()),
        "INFERENCE_MODEL" => Some("claude-sonnet".to_string()),
        "TOOL_CODE_INTERPRETER" => Some("code-fn".to_string()),
        _ => None,
    })
    .expect("config should load");

    let provider = ScriptedProvider::new(responses);
    let invoker = Arc::new(EchoInvoker {
        calls: Mutex::new(Vec::new()),
    });
    let runtime = build_runtime_with(
        &config,
        provider.clone(),
        invoker.clone(),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(FilesystemFileService::new(uploads)),
    )
    .expect("runtime should build");

    Fixture {
        runtime,
        provider,
        invoker,
        root,
    }
}

fn user() -> UserId {
    UserId::from("user-1")
}

fn session() -> SessionId {
    SessionId::from("session-1")
}

#[tokio::test]
async fn heartbeat_reports_model_without_touching_session() {
    let fixture = fixture(Vec::new());
    let transport = BufferedTransport::new();

    fixture
        .runtime
        .handler
        .handle(&user(), InboundEvent::heartbeat("session-1"), &transport)
        .await
        .expect("heartbeat should succeed");

    assert_eq!(
        transport.messages(),
        vec![OutboundMessage::Heartbeat {
            model: "claude-sonnet".to_string()
        }]
    );
    let loaded = fixture
        .runtime
        .sessions
        .load_session(&user(), &session())
        .await
        .expect("load should succeed");
    assert!(loaded.is_new);
}

#[tokio::test]
async fn converse_inlines_images_once_and_persists_the_session() {
    let fixture = fixture(vec![text_reply("A bar chart."), text_reply("Still a chart.")]);
    let transport = BufferedTransport::new();

    fixture
        .runtime
        .handler
        .handle(
            &user(),
            InboundEvent::converse("session-1", "What is this?")
                .with_files(["chart.png", "sales.csv"]),
            &transport,
        )
        .await
        .expect("first turn should succeed");

    let loaded = fixture
        .runtime
        .sessions
        .load_session(&user(), &session())
        .await
        .expect("load should succeed");
    assert!(!loaded.is_new);
    assert_eq!(loaded.state.inline_files, vec!["chart.png"]);
    assert_eq!(
        loaded.state.messages[0].content,
        vec![
            ContentBlock::text("What is this?"),
            ContentBlock::image("png", vec![1, 2, 3]),
        ]
    );
    assert_eq!(loaded.state.messages[1].text(), "A bar chart.");

    let record = fixture
        .runtime
        .sessions
        .load_session_record(&user(), &session())
        .await
        .expect("record should load")
        .expect("record should exist");
    assert_eq!(record.title, "What is this?");

    let system = {
        let requests = fixture.provider.requests.lock().expect("requests lock");
        requests[0].system.clone().expect("system prompt")
    };
    assert!(system.contains("The following files are available for the tools: chart.png, sales.csv"));
    assert!(system.contains("Schema of the CSV file sales.csv:\n<schema>region: object\nunits: int64</schema>"));

    assert_eq!(
        transport.messages().last(),
        Some(&OutboundMessage::Loop { done: true })
    );

    fixture
        .runtime
        .handler
        .handle(
            &user(),
            InboundEvent::converse("session-1", "And now?").with_files(["chart.png"]),
            &transport,
        )
        .await
        .expect("second turn should succeed");

    let loaded = fixture
        .runtime
        .sessions
        .load_session(&user(), &session())
        .await
        .expect("load should succeed");
    assert_eq!(loaded.state.messages.len(), 4);
    assert_eq!(
        loaded.state.messages[2].content,
        vec![ContentBlock::text("And now?")]
    );
}

#[tokio::test]
async fn tool_cycle_keeps_the_loop_open() {
    let fixture = fixture(vec![code_interpreter_call()]);
    let transport = BufferedTransport::new();

    fixture
        .runtime
        .handler
        .handle(
            &user(),
            InboundEvent::converse("session-1", "compute 6*7"),
            &transport,
        )
        .await
        .expect("turn should succeed");

    assert_eq!(
        transport.messages().last(),
        Some(&OutboundMessage::Loop { done: false })
    );

    let calls = fixture.invoker.calls.lock().expect("calls lock").clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["tool_use_id"], json!("toolu_ci"));
    assert_eq!(calls[0]["user_id"], json!("user-1"));
    assert_eq!(calls[0]["input"], json!({"code": "print(6*7)"}));

    let state = fixture
        .runtime
        .sessions
        .load_session(&user(), &session())
        .await
        .expect("load should succeed")
        .state;
    assert_eq!(state.messages.len(), 3);
    assert_eq!(state.tool_extra["toolu_ci"]["status"], json!("success"));
    assert_eq!(state.tool_extra["toolu_ci"]["images"], json!(["plot.png"]));
}

#[tokio::test]
async fn invalid_events_are_rejected_before_any_output() {
    let fixture = fixture(Vec::new());
    let transport = BufferedTransport::new();

    let missing = fixture
        .runtime
        .handler
        .handle(
            &user(),
            InboundEvent {
                session_id: Some("  ".to_string()),
                event_type: Some("CONVERSE".to_string()),
                ..InboundEvent::default()
            },
            &transport,
        )
        .await
        .expect_err("blank session id should fail");
    assert_eq!(missing.kind, HandlerErrorKind::InvalidEvent);

    let body = r#"{"session_id": "session-1", "event_type": "DANCE"}"#;
    let unknown = fixture
        .runtime
        .handler
        .handle(
            &user(),
            InboundEvent::from_json(body).expect("body should parse"),
            &transport,
        )
        .await
        .expect_err("unknown event type should fail");
    assert_eq!(unknown.kind, HandlerErrorKind::InvalidEvent);
    assert!(unknown.message.contains("DANCE"));

    assert!(transport.messages().is_empty());
}
