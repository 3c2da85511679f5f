use std::pin::Pin;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Client;

use crate::transport::Transport;
use crate::types::{HttpRequest, HttpResponse, HttpVerb};
use crate::{Error, Result};

/// TCP connection timeout. Connecting to a loopback address either succeeds
/// or fails fast; anything longer just delays the offline verdict.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A [`Transport`] implementation backed by the `reqwest` crate.
///
/// This is the default transport used by
/// [`ModelHostClient`](crate::ModelHostClient) if no custom transport is
/// provided. Non-2xx responses are surfaced as [`Error::Http`] carrying the
/// status code and body text so callers can distinguish "model not found"
/// from transport-level failures.
pub struct ReqwestTransport {
    client: Client,
    api_key: Option<String>,
}

impl ReqwestTransport {
    /// Creates a new `ReqwestTransport`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Client`] if the `reqwest` client cannot be built.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;
        Ok(Self { client, api_key })
    }

    /// Builds and sends a reqwest request, handling common logic.
    async fn dispatch(&self, request: HttpRequest) -> Result<reqwest::Response> {
        let url = request
            .base
            .join(&request.path)
            .map_err(|e| Error::Client(e.to_string()))?;

        let mut request_builder = match request.verb {
            HttpVerb::GET => self.client.get(url),
            HttpVerb::POST => self.client.post(url),
            HttpVerb::DELETE => self.client.delete(url),
        };

        if let Some(timeout) = request.timeout {
            request_builder = request_builder.timeout(timeout);
        }

        if let Some(api_key) = &self.api_key {
            request_builder = request_builder.bearer_auth(api_key);
        }

        if let Some(body) = request.body {
            request_builder = request_builder.json(&body);
        }

        let response = request_builder.send().await.map_err(Error::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    /// Sends a non-streaming HTTP request using `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the request fails at the connection
    /// level, or [`Error::Http`] for a non-2xx response.
    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    async fn send_http_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.dispatch(request).await?;
        let response_bytes = response.bytes().await.map_err(Error::Transport)?;
        Ok(HttpResponse {
            body: Some(response_bytes),
        })
    }

    /// Sends a streaming HTTP request using `reqwest` and returns a stream of
    /// response bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the request fails at the connection
    /// level, or [`Error::Http`] for a non-2xx response.
    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    async fn send_http_stream_request(
        &self,
        request: HttpRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>> {
        let response = self.dispatch(request).await?;
        let stream = response
            .bytes_stream()
            .map(|item| item.map_err(Error::Transport))
            .boxed();
        Ok(stream)
    }
}
