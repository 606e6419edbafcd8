//! Runtime wiring: one handler per process, built from [`AppConfig`].

use std::sync::Arc;

use pchat::{ChatService, SystemPrompt};
use pobserve::{SafeProviderHooks, SafeToolHooks, SafeTurnHooks, TracingObservabilityHooks};
use pprovider::ModelProvider;
use psession::{
    FileSchemaSource, FileService, FilesystemFileService, SessionStore, SessionStoreConfig,
    create_session_store,
};
use ptooling::{RemoteInvoker, SkillLibrary, ToolCatalog, ToolDispatcher};

use crate::providers::{build_provider, build_remote_invoker, http_client};
use crate::{AppConfig, HandlerError, MessageHandler};

#[derive(Clone)]
pub struct RuntimeBundle {
    pub handler: MessageHandler,
    pub sessions: Arc<dyn SessionStore>,
    pub files: Arc<dyn FileService>,
}

/// Remote tools first, in configuration order, then the skill tool.
pub fn build_tool_catalog(config: &AppConfig) -> ToolCatalog {
    let mut catalog = ToolCatalog::new();
    if let Some(function) = &config.code_interpreter {
        catalog.register_code_interpreter(function.clone());
    }
    if let Some(function) = &config.web_search {
        catalog.register_web_search(function.clone());
    }
    catalog.register_skill_tool();
    catalog
}

pub fn build_dispatcher(config: &AppConfig, invoker: Arc<dyn RemoteInvoker>) -> ToolDispatcher {
    ToolDispatcher::new(
        Arc::new(build_tool_catalog(config)),
        SkillLibrary::new(config.skills_dir.clone()),
        invoker,
    )
    .with_hooks(Arc::new(SafeToolHooks::new(TracingObservabilityHooks)))
}

pub fn build_chat_service(
    config: &AppConfig,
    provider: Arc<dyn ModelProvider>,
    tools: ToolDispatcher,
    files: Arc<dyn FileService>,
) -> Result<ChatService, HandlerError> {
    Ok(
        ChatService::builder(provider, Arc::new(tools), config.model_id.clone())
            .options(config.options)
            .prompt(SystemPrompt::new().with_artifacts(config.artifacts_enabled))
            .schema_source(Arc::new(FileSchemaSource::new(files)))
            .provider_hooks(Arc::new(SafeProviderHooks::new(TracingObservabilityHooks)))
            .turn_hooks(Arc::new(SafeTurnHooks::new(TracingObservabilityHooks)))
            .build()?,
    )
}

/// Builds the production runtime: Anthropic provider, HTTP remote tools and
/// filesystem-backed sessions and uploads.
pub fn build_runtime(config: &AppConfig) -> Result<RuntimeBundle, HandlerError> {
    let http = http_client()?;
    let provider = build_provider(config, http.clone())?;
    let invoker = build_remote_invoker(config, http);
    let sessions = create_session_store(SessionStoreConfig::Filesystem {
        root: config.session_root.clone(),
    })?;
    let files: Arc<dyn FileService> =
        Arc::new(FilesystemFileService::new(config.files_root.clone()));

    build_runtime_with(config, provider, invoker, sessions, files)
}

pub fn build_runtime_with(
    config: &AppConfig,
    provider: Arc<dyn ModelProvider>,
    invoker: Arc<dyn RemoteInvoker>,
    sessions: Arc<dyn SessionStore>,
    files: Arc<dyn FileService>,
) -> Result<RuntimeBundle, HandlerError> {
    tracing::info!(
        model = %config.model_id,
        storage_region = %config.storage_region,
        inference_region = %config.inference_region,
        code_interpreter = config.code_interpreter.is_some(),
        web_search = config.web_search.is_some(),
        artifacts = config.artifacts_enabled,
        "building runtime"
    );

    let dispatcher = build_dispatcher(config, invoker);
    let chat = build_chat_service(config, provider, dispatcher, Arc::clone(&files))?;

    Ok(RuntimeBundle {
        handler: MessageHandler::new(chat, Arc::clone(&sessions), Arc::clone(&files)),
        sessions,
        files,
    })
}
