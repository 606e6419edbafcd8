//! Anthropic Messages API streaming provider over reqwest.

mod serde_api;

use async_stream::try_stream;
use futures_util::StreamExt;
use reqwest::{Client, Response};

use crate::{
    BoxedEventStream, ModelProvider, ModelRequest, ProviderError, ProviderFuture, ProviderId,
};

pub use serde_api::AnthropicSseDecoder;

use serde_api::{ApiErrorBody, ApiErrorEnvelope, build_api_request, map_api_error};

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone)]
pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AnthropicProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: ANTHROPIC_BASE_URL.to_string(),
            api_key: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Wire body for a streaming Messages call.
    pub fn request_body(request: &ModelRequest) -> serde_json::Value {
        build_api_request(request, true)
    }

    fn endpoint(&self) -> String {
        format!("{}/messages", self.base_url.trim_end_matches('/'))
    }

    async fn parse_error(response: Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|envelope| envelope.error)
            .unwrap_or_else(|_| ApiErrorBody {
                kind: String::new(),
                message: format!("Anthropic request failed with status {status}: {body}"),
            });

        map_api_error(Some(status.as_u16()), error)
    }
}

impl ModelProvider for AnthropicProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            request.validate()?;
            let body = Self::request_body(&request);

            let mut builder = self
                .client
                .post(self.endpoint())
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body);
            if let Some(api_key) = &self.api_key {
                builder = builder.header("x-api-key", api_key);
            }

            let response = builder.send().await.map_err(|err| {
                if err.is_timeout() {
                    ProviderError::timeout(err.to_string())
                } else {
                    ProviderError::transport(err.to_string())
                }
            })?;

            if !response.status().is_success() {
                return Err(Self::parse_error(response).await);
            }

            let stream = try_stream! {
                let mut chunks = response.bytes_stream();
                let mut decoder = AnthropicSseDecoder::new();
                // Holds the tail of a multi-byte character split across chunks.
                let mut pending = Vec::<u8>::new();

                while let Some(item) = chunks.next().await {
                    let bytes = item.map_err(|err| ProviderError::stream(err.to_string()))?;
                    pending.extend_from_slice(&bytes);

                    let valid_len = match std::str::from_utf8(&pending) {
                        Ok(text) => text.len(),
                        Err(err) if err.error_len().is_none() => err.valid_up_to(),
                        Err(err) => Err::<usize, ProviderError>(ProviderError::stream(err.to_string()))?,
                    };
                    let text = String::from_utf8(pending.drain(..valid_len).collect())
                        .map_err(|err| ProviderError::stream(err.to_string()))?;

                    for event in decoder.push_chunk(&text) {
                        yield event?;
                    }
                }

                for event in decoder.finish() {
                    yield event?;
                }
            };

            Ok(Box::pin(stream) as BoxedEventStream<'a>)
        })
    }
}
