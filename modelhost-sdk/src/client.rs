//! Client operations against the model server.
//!
//! Every method snapshots the configuration once at call start, so
//! `set_base_url` / `set_default_model` apply to subsequent calls only and
//! never redirect a request already in flight.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use futures::StreamExt;
use reqwest::Url;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "metrics")]
use metrics::counter;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::builder::ModelHostClientBuilder;
use crate::config::ClientConfig;
use crate::types::chat::{
    ChatMessage, ChatRequest, ChatResponse, ChatStream, SimpleChatRequest, StreamingChatRequest,
};
use crate::types::generate::{
    GenerateOptions, GenerateRequest, GenerateResponse, GenerateStream, GenerateStreamEvent,
    SimpleGenerateRequest, StreamingGenerateRequest,
};
use crate::types::{
    DeleteRequest, EmbeddingsRequest, EmbeddingsResponse, HttpRequest, ListModelsResponse,
    ModelDescriptor, ModelInfoRequest, PullRequest, PullStream, PullStreamEvent,
    RunningModelsResponse, ServerStatus, VersionResponse,
};
use crate::ModelHostClient;
use crate::{Error, Result};

impl ModelHostClient {
    pub fn builder() -> ModelHostClientBuilder {
        ModelHostClientBuilder::new()
    }

    /// Returns the current configuration snapshot.
    pub fn config(&self) -> ClientConfig {
        self.snapshot()
    }

    /// Updates the server base URL. Takes effect for subsequent calls;
    /// requests already dispatched keep the URL they were built with.
    pub fn set_base_url(&self, base_url: impl AsRef<str>) -> Result<()> {
        let parsed = Url::parse(base_url.as_ref())
            .map_err(|e| Error::Client(format!("Invalid base URL: {}", e)))?;
        self.config
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .base_url = parsed;
        Ok(())
    }

    /// Updates the model used by convenience calls that don't name one.
    pub fn set_default_model(&self, model: impl Into<String>) {
        self.config
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .default_model = model.into();
    }

    /// Updates the timeout applied to non-streaming requests.
    pub fn set_timeout(&self, timeout: Duration) {
        self.config
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .timeout = timeout;
    }

    // Config updates are last-writer-wins; poisoning carries no invariant
    // worth propagating, so a poisoned lock is simply read through.
    fn snapshot(&self) -> ClientConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// HTTP 404 on a model-scoped call means the name is unknown to the
    /// server, which callers must be able to tell apart from transport
    /// failures.
    fn model_scoped(error: Error, model: &str) -> Error {
        match error {
            Error::Http { status: 404, .. } => Error::NotFound(model.to_string()),
            other => other,
        }
    }

    // --- Server and model management ---

    /// Queries the server's health and version.
    ///
    /// An unreachable server is an expected condition: this returns
    /// `running == false` instead of an error.
    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn status(&self) -> ServerStatus {
        match self.try_status().await {
            Ok(status) => status,
            Err(_) => ServerStatus::offline(),
        }
    }

    async fn try_status(&self) -> Result<ServerStatus> {
        let config = self.snapshot();
        let request =
            HttpRequest::new(config.base_url.clone(), "/api/version").timeout(config.timeout);
        let response = self.transport.send_http_request(request).await?;

        let version = match response.body {
            Some(bytes) => Some(VersionResponse::from_bytes(bytes)?.version),
            None => None,
        };

        // A reachable server with an unreadable process list still counts
        // as running.
        let loaded_models = self
            .running_model_names(&config)
            .await
            .unwrap_or_default();

        Ok(ServerStatus {
            running: true,
            version,
            loaded_models,
        })
    }

    async fn running_model_names(&self, config: &ClientConfig) -> Result<Vec<String>> {
        let request =
            HttpRequest::new(config.base_url.clone(), "/api/ps").timeout(config.timeout);
        let response = self.transport.send_http_request(request).await?;
        match response.body {
            Some(bytes) => Ok(RunningModelsResponse::from_bytes(bytes)?
                .models
                .into_iter()
                .map(|m| m.model)
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    /// Lists the models available on the server, in the order the server
    /// reports them. Transport failures degrade to an empty list.
    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn list_models(&self) -> Vec<ModelDescriptor> {
        self.try_list_models().await.unwrap_or_default()
    }

    /// Like [`list_models`](Self::list_models), reduced to the model names.
    pub async fn list_model_names(&self) -> Vec<String> {
        self.list_models().await.into_iter().map(|m| m.name).collect()
    }

    async fn try_list_models(&self) -> Result<Vec<ModelDescriptor>> {
        let config = self.snapshot();
        let request = HttpRequest::new(config.base_url, "/api/tags").timeout(config.timeout);
        let response = self.transport.send_http_request(request).await?;
        match response.body {
            Some(bytes) => Ok(ListModelsResponse::from_bytes(bytes)?.models),
            None => Err(Error::Protocol("Missing response body".into())),
        }
    }

    /// Fetches the server-defined metadata for a model.
    ///
    /// The metadata schema belongs to the server, so it is surfaced as an
    /// opaque JSON map rather than a typed struct.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the server doesn't recognize the name.
    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn model_info(
        &self,
        name: &str,
    ) -> Result<serde_json::Map<String, serde_json::Value>> {
        let config = self.snapshot();
        let request = HttpRequest::new(config.base_url, "/api/show")
            .post()
            .body(ModelInfoRequest {
                name: name.to_string(),
            })?
            .timeout(config.timeout);

        let response = self
            .transport
            .send_http_request(request)
            .await
            .map_err(|e| Self::model_scoped(e, name))?;

        let bytes = response
            .body
            .ok_or_else(|| Error::Protocol("Missing response body".into()))?;
        match serde_json::from_slice::<serde_json::Value>(&bytes)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(Error::Protocol("Expected a JSON object".into())),
        }
    }

    /// Starts a model download and returns the raw progress event stream.
    ///
    /// Dropping the stream aborts the underlying connection.
    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn pull_model_stream(&self, name: &str) -> Result<PullStream> {
        #[cfg(feature = "metrics")]
        counter!("modelhost_client.pull_requests_total").increment(1);

        let config = self.snapshot();
        let request = HttpRequest::new(config.base_url, "/api/pull")
            .post()
            .body(PullRequest {
                name: name.to_string(),
                stream: true,
            })?;

        let byte_stream = self
            .transport
            .send_http_stream_request(request)
            .await
            .map_err(|e| Self::model_scoped(e, name))?;
        Ok(PullStream::from_bytes_stream(byte_stream))
    }

    /// Downloads a model, reporting progress through `on_progress`.
    ///
    /// The callback receives a non-decreasing completion fraction in
    /// `0.0..=1.0`, ending with `1.0` once the server confirms success.
    /// Other client calls are not blocked while the download runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown model, [`Error::Server`]
    /// when the server reports a download failure, and [`Error::Protocol`]
    /// when the connection ends before the server confirms completion.
    #[cfg_attr(feature = "tracing", instrument(skip(self, on_progress)))]
    pub async fn pull_model<F>(&self, name: &str, mut on_progress: F) -> Result<()>
    where
        F: FnMut(f64),
    {
        let mut stream = self.pull_model_stream(name).await?;
        let mut last_fraction = 0.0_f64;
        let mut completed = false;

        while let Some(event) = stream.next().await {
            match event? {
                PullStreamEvent::Progress(progress) => {
                    // Layers download one after another with their own byte
                    // counts; suppress the fraction reset between layers.
                    if let Some(fraction) = progress.fraction() {
                        if fraction > last_fraction {
                            last_fraction = fraction;
                            on_progress(fraction);
                        }
                    }
                    if progress.status == "success" {
                        completed = true;
                    }
                }
                PullStreamEvent::Error(err) => return Err(Error::Server(err)),
                PullStreamEvent::Partial { .. } => continue,
            }
        }

        if !completed {
            return Err(Error::Protocol(format!(
                "Pull of '{}' ended before completion",
                name
            )));
        }
        if last_fraction < 1.0 {
            on_progress(1.0);
        }
        Ok(())
    }

    /// Removes a model from the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the name is absent from the server.
    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn delete_model(&self, name: &str) -> Result<bool> {
        let config = self.snapshot();
        let request = HttpRequest::new(config.base_url, "/api/delete")
            .delete()
            .body(DeleteRequest {
                name: name.to_string(),
            })?
            .timeout(config.timeout);

        self.transport
            .send_http_request(request)
            .await
            .map_err(|e| Self::model_scoped(e, name))?;
        Ok(true)
    }

    // --- Chat and generation, request-struct tier ---

    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn chat_simple(&self, request: SimpleChatRequest) -> Result<ChatResponse> {
        #[cfg(feature = "metrics")]
        counter!("modelhost_client.chat_requests_total", "type" => "non_streaming").increment(1);

        let config = self.snapshot();
        let model = request.model.clone();
        let chat_request = ChatRequest::from(request);
        let request = HttpRequest::new(config.base_url, "/api/chat")
            .post()
            .body(chat_request)?
            .timeout(config.timeout);

        let response = self
            .transport
            .send_http_request(request)
            .await
            .map_err(|e| Self::model_scoped(e, &model))?;

        match response.body {
            Some(bytes) => ChatResponse::from_bytes(bytes),
            None => Err(Error::Protocol("Missing response body".into())),
        }
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn chat_stream(&self, request: StreamingChatRequest) -> Result<ChatStream> {
        #[cfg(feature = "metrics")]
        counter!("modelhost_client.chat_requests_total", "type" => "streaming").increment(1);

        let config = self.snapshot();
        let model = request.model.clone();
        let chat_request = ChatRequest::from(request);
        let request = HttpRequest::new(config.base_url, "/api/chat")
            .post()
            .body(chat_request)?;

        let byte_stream = self
            .transport
            .send_http_stream_request(request)
            .await
            .map_err(|e| Self::model_scoped(e, &model))?;
        Ok(ChatStream::from_bytes_stream(byte_stream))
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn generate_simple(
        &self,
        request: SimpleGenerateRequest,
    ) -> Result<GenerateResponse> {
        #[cfg(feature = "metrics")]
        counter!("modelhost_client.generate_requests_total", "type" => "non_streaming")
            .increment(1);

        let config = self.snapshot();
        let model = request.model.clone();
        let generate_request = GenerateRequest::from(request);
        let request = HttpRequest::new(config.base_url, "/api/generate")
            .post()
            .body(generate_request)?
            .timeout(config.timeout);

        let response = self
            .transport
            .send_http_request(request)
            .await
            .map_err(|e| Self::model_scoped(e, &model))?;

        match response.body {
            Some(bytes) => GenerateResponse::from_bytes(bytes),
            None => Err(Error::Protocol("Missing response body".into())),
        }
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn generate_stream(
        &self,
        request: StreamingGenerateRequest,
    ) -> Result<GenerateStream> {
        #[cfg(feature = "metrics")]
        counter!("modelhost_client.generate_requests_total", "type" => "streaming").increment(1);

        let config = self.snapshot();
        let model = request.model.clone();
        let generate_request = GenerateRequest::from(request);
        let request = HttpRequest::new(config.base_url, "/api/generate")
            .post()
            .body(generate_request)?;

        let byte_stream = self
            .transport
            .send_http_stream_request(request)
            .await
            .map_err(|e| Self::model_scoped(e, &model))?;
        Ok(GenerateStream::from_bytes_stream(byte_stream))
    }

    // --- Convenience tier; all fall back to the configured default model ---

    /// Single-turn text completion; returns the full generated text.
    pub async fn complete(
        &self,
        prompt: &str,
        model: Option<&str>,
        options: Option<GenerateOptions>,
    ) -> Result<String> {
        let config = self.snapshot();
        let mut request = SimpleGenerateRequest::new(config.resolve_model(model), prompt.into());
        request.options = options;
        Ok(self.generate_simple(request).await?.response)
    }

    /// Multi-turn completion over the full ordered message history; returns
    /// the assistant's reply text. The caller owns conversation state.
    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: Option<&str>,
        options: Option<GenerateOptions>,
    ) -> Result<String> {
        let config = self.snapshot();
        let request = SimpleChatRequest {
            model: config.resolve_model(model),
            messages,
            options,
        };
        Ok(self.chat_simple(request).await?.message.content)
    }

    /// Single-turn multimodal completion: sends an image plus an instruction
    /// and returns the generated text. The image bytes are base64-encoded
    /// into the request.
    #[cfg_attr(feature = "tracing", instrument(skip(self, image)))]
    pub async fn analyze(
        &self,
        image: &[u8],
        prompt: &str,
        model: Option<&str>,
    ) -> Result<String> {
        let encoded = BASE64_STANDARD.encode(image);
        let config = self.snapshot();
        let request = SimpleGenerateRequest::new(config.resolve_model(model), prompt.into())
            .images(vec![encoded]);
        Ok(self.generate_simple(request).await?.response)
    }

    /// Streaming completion: invokes `on_token` once per generated fragment,
    /// in arrival order, and returns once the stream ends. `on_token` is
    /// never invoked after this method returns.
    pub async fn stream<F>(
        &self,
        prompt: &str,
        on_token: F,
        model: Option<&str>,
        images: Option<Vec<String>>,
    ) -> Result<()>
    where
        F: FnMut(&str),
    {
        self.stream_with_cancel(prompt, on_token, model, images, CancellationToken::new())
            .await
    }

    /// Like [`stream`](Self::stream), resolving to [`Error::Cancelled`] when
    /// `cancel` is triggered. Dropping the future aborts the connection
    /// either way.
    #[cfg_attr(feature = "tracing", instrument(skip(self, on_token, cancel)))]
    pub async fn stream_with_cancel<F>(
        &self,
        prompt: &str,
        mut on_token: F,
        model: Option<&str>,
        images: Option<Vec<String>>,
        cancel: CancellationToken,
    ) -> Result<()>
    where
        F: FnMut(&str),
    {
        let config = self.snapshot();
        let mut request =
            StreamingGenerateRequest::new(config.resolve_model(model), prompt.into());
        if let Some(images) = images {
            request = request.images(images);
        }

        let mut stream = self.generate_stream(request).await?;
        loop {
            tokio::select! {
                // Cancellation wins over a ready chunk.
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                event = stream.next() => match event {
                    None => return Ok(()),
                    Some(event) => match event? {
                        GenerateStreamEvent::Chunk(chunk) => {
                            if !chunk.response.is_empty() {
                                on_token(&chunk.response);
                            }
                            if chunk.done {
                                return Ok(());
                            }
                        }
                        GenerateStreamEvent::Error(err) => return Err(Error::Server(err)),
                        GenerateStreamEvent::Partial { .. } => continue,
                    },
                },
            }
        }
    }

    /// Computes a fixed-length embedding vector for `text`.
    #[cfg_attr(feature = "tracing", instrument(skip(self, text)))]
    pub async fn embed(&self, text: &str, model: Option<&str>) -> Result<Vec<f64>> {
        #[cfg(feature = "metrics")]
        counter!("modelhost_client.embeddings_requests_total").increment(1);

        let config = self.snapshot();
        let model = config.resolve_model(model);
        let request = HttpRequest::new(config.base_url, "/api/embeddings")
            .post()
            .body(EmbeddingsRequest {
                model: model.clone(),
                prompt: text.to_string(),
            })?
            .timeout(config.timeout);

        let response = self
            .transport
            .send_http_request(request)
            .await
            .map_err(|e| Self::model_scoped(e, &model))?;

        match response.body {
            Some(bytes) => Ok(EmbeddingsResponse::from_bytes(bytes)?.embedding),
            None => Err(Error::Protocol("Missing response body".into())),
        }
    }
}
