//! Provider and remote invoker construction from process configuration.

use std::sync::Arc;
use std::time::Duration;

use pprovider::ModelProvider;
use ptooling::{HttpRemoteInvoker, RemoteInvoker};
use reqwest::Client;

use crate::{AppConfig, HandlerError};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared HTTP client. Only connection setup is bounded; response streams may
/// run as long as the model keeps producing.
pub fn http_client() -> Result<Client, HandlerError> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .build()
        .map_err(|err| HandlerError::config(format!("failed to build http client: {err}")))
}

pub fn build_provider(
    config: &AppConfig,
    http: Client,
) -> Result<Arc<dyn ModelProvider>, HandlerError> {
    build_anthropic_provider(config, http)
}

pub fn build_remote_invoker(config: &AppConfig, http: Client) -> Arc<dyn RemoteInvoker> {
    let invoker = HttpRemoteInvoker::new(http);
    match &config.tool_endpoint {
        Some(endpoint) => Arc::new(invoker.with_base_url(endpoint.clone())),
        None => Arc::new(invoker),
    }
}

#[cfg(feature = "provider-anthropic")]
fn build_anthropic_provider(
    config: &AppConfig,
    http: Client,
) -> Result<Arc<dyn ModelProvider>, HandlerError> {
    let mut provider = pprovider::AnthropicProvider::new(http);
    if let Some(endpoint) = &config.inference_endpoint {
        provider = provider.with_base_url(endpoint.clone());
    }
    if let Some(api_key) = &config.api_key {
        provider = provider.with_api_key(api_key.clone());
    }
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "provider-anthropic"))]
fn build_anthropic_provider(
    _config: &AppConfig,
    _http: Client,
) -> Result<Arc<dyn ModelProvider>, HandlerError> {
    Err(HandlerError::config(
        "provider-anthropic feature is not enabled on parley",
    ))
}
