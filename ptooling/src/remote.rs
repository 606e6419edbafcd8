//! Remote function invocation seam and HTTP implementation.

use serde_json::Value;

use crate::{RemoteFunctionId, ToolError, ToolFuture};

/// Synchronous request/response call to a deployed remote function.
///
/// No caller-side timeout is applied; a hung function blocks the caller for
/// as long as the underlying transport allows.
pub trait RemoteInvoker: Send + Sync {
    fn invoke<'a>(
        &'a self,
        function: &'a RemoteFunctionId,
        payload: Value,
    ) -> ToolFuture<'a, Result<Value, ToolError>>;
}

#[cfg(feature = "remote-http")]
pub use http::HttpRemoteInvoker;

#[cfg(feature = "remote-http")]
mod http {
    use reqwest::Client;
    use serde_json::Value;

    use crate::{RemoteFunctionId, RemoteInvoker, ToolError, ToolFuture};

    /// Posts the payload as JSON to `{base_url}/{function}`, or to the function
    /// id itself when it is already an absolute URL.
    #[derive(Clone)]
    pub struct HttpRemoteInvoker {
        client: Client,
        base_url: Option<String>,
    }

    impl HttpRemoteInvoker {
        pub fn new(client: Client) -> Self {
            Self {
                client,
                base_url: None,
            }
        }

        pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
            self.base_url = Some(base_url.into());
            self
        }

        pub fn endpoint(&self, function: &RemoteFunctionId) -> Result<String, ToolError> {
            let id = function.as_str();
            if id.starts_with("http://") || id.starts_with("https://") {
                return Ok(id.to_string());
            }

            match &self.base_url {
                Some(base) => Ok(format!(
                    "{}/{}",
                    base.trim_end_matches('/'),
                    id.trim_start_matches('/')
                )),
                None => Err(ToolError::transport(format!(
                    "no endpoint configured for remote function '{id}'"
                ))),
            }
        }
    }

    impl RemoteInvoker for HttpRemoteInvoker {
        fn invoke<'a>(
            &'a self,
            function: &'a RemoteFunctionId,
            payload: Value,
        ) -> ToolFuture<'a, Result<Value, ToolError>> {
            Box::pin(async move {
                let endpoint = self.endpoint(function)?;
                let response = self
                    .client
                    .post(endpoint)
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|err| ToolError::transport(err.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ToolError::transport(format!(
                        "remote function '{function}' failed with status {status}: {body}"
                    )));
                }

                response
                    .json::<Value>()
                    .await
                    .map_err(|err| ToolError::invalid_response(err.to_string()))
            })
        }
    }

}
