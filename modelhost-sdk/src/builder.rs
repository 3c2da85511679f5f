use std::sync::{Arc, RwLock};
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use reqwest::Url;

use crate::config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT};
use crate::transport::{ReqwestTransport, Transport};
use crate::{Error, ModelHostClient, Result};

/// A builder for constructing a [`ModelHostClient`].
///
/// This builder allows for flexible configuration of the client, including
/// the base URL of the model server, an API key, the default model, the
/// request timeout, and a custom transport layer.
///
/// - Uses either the `MODELHOST_URL` environment variable or `http://127.0.0.1:11434`.
/// - Uses either the `MODELHOST_API_KEY` environment variable or nothing.
/// - Uses either the `MODELHOST_MODEL` environment variable or `llama3.2:3b`.
/// - Uses a `reqwest`-based transport by default - [`ReqwestTransport`].
pub struct ModelHostClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    default_model: Option<String>,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport + Send + Sync>>,
}

impl ModelHostClientBuilder {
    /// Creates a new [`ModelHostClientBuilder`]. This method is called by
    /// [`ModelHostClient::builder`].
    pub(crate) fn new() -> Self {
        ModelHostClientBuilder {
            base_url: None,
            api_key: None,
            default_model: None,
            timeout: None,
            transport: None,
        }
    }

    /// Sets the base URL of the model server.
    ///
    /// If not set, the builder will try to read from the `MODELHOST_URL`
    /// environment variable, defaulting to `http://127.0.0.1:11434` if the
    /// environment variable is not found.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the API key for authentication with the server.
    ///
    /// If not set, the builder will try to read from the `MODELHOST_API_KEY`
    /// environment variable.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the model used by convenience calls that don't name one.
    ///
    /// If not set, the builder will try to read from the `MODELHOST_MODEL`
    /// environment variable, defaulting to `llama3.2:3b` if the environment
    /// variable is not found. Can be changed later with
    /// [`ModelHostClient::set_default_model`].
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Sets the total request timeout for non-streaming calls (default 30s).
    /// Streaming calls are open-ended and only bounded by the transport's
    /// connect timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets a custom transport implementation for the client.
    ///
    /// This allows for using different HTTP clients or mock implementations
    /// for testing. If not set, a `reqwest`-based transport
    /// \([`ReqwestTransport`]\) will be used.
    ///
    /// For testing, you can use [`MockTransport`](crate::transport::MockTransport)
    /// or your own mock [`Transport`] implementations.
    pub fn transport(mut self, transport: Arc<dyn Transport + Send + Sync>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the [`ModelHostClient`] with the configured options.
    ///
    /// If no transport is provided, it constructs a default `reqwest`-based
    /// transport using the configured [`api_key`](ModelHostClientBuilder::api_key).
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Client`](variant@Error::Client) if the base URL is
    /// invalid or if there's an issue initializing [`ReqwestTransport`].
    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub fn build(self) -> Result<ModelHostClient> {
        let base_url_str = self.base_url.unwrap_or_else(|| {
            std::env::var("MODELHOST_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
        });
        let base_url = Url::parse(&base_url_str)
            .map_err(|e| Error::Client(format!("Invalid base URL: {}", e)))?;

        let default_model = self.default_model.unwrap_or_else(|| {
            std::env::var("MODELHOST_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string())
        });

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);

        let transport = if let Some(t) = self.transport {
            t
        } else {
            let api_key = self
                .api_key
                .or_else(|| std::env::var("MODELHOST_API_KEY").ok());
            Arc::new(ReqwestTransport::new(api_key)?)
        };

        Ok(ModelHostClient {
            transport,
            config: Arc::new(RwLock::new(ClientConfig {
                base_url,
                default_model,
                timeout,
            })),
        })
    }
}

impl std::fmt::Debug for ModelHostClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHostClientBuilder")
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
