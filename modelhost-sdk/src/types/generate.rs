//! Data structures for the single-turn generation endpoint.

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use modelhost_sdk_macros::FromBytes;
use serde::{Deserialize, Serialize};

use crate::parser::{GenericStreamParser, StreamEventExt};
use crate::Result;

/// The wire request for text generation.
///
/// Supports a plain prompt, optional base64-encoded images for multimodal
/// models, a system message, and sampling options. Both streaming and
/// non-streaming responses are driven by the `stream` flag.
#[derive(Serialize, Default, Debug, Clone)]
pub struct GenerateRequest {
    /// The name of the model to use for generation.
    pub model: String,
    /// The primary prompt for the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// A suffix to be appended to the generated text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Optional base64-encoded images to include in the prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// A system message to guide the model's behavior.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// If `true`, the response arrives as a series of [`GenerateStreamEvent`]s.
    /// If `false`, a single [`GenerateResponse`] is returned.
    pub stream: bool,
    /// If `true`, the raw prompt is used without any templating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,
    /// Additional sampling options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

/// Sampling configuration for generation and chat calls.
///
/// Every field is optional; absent fields are omitted from the request body
/// and defaulted by the server, never by the client.
#[derive(Serialize, Default, Debug, Clone)]
pub struct GenerateOptions {
    /// The random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    /// Sampling temperature; higher values mean more random output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// The top-k sampling parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// The nucleus (top-p) sampling threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// The minimum-p sampling parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_p: Option<f32>,
    /// Strings that stop the generation when produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// The size of the context window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
    /// The maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

/// A complete (non-streaming) generation response, or one chunk of a
/// streaming response.
#[derive(Deserialize, Serialize, Default, FromBytes, Debug, Clone)]
pub struct GenerateResponse {
    /// The name of the model that generated the response.
    pub model: String,
    /// The timestamp when the response was created.
    #[serde(default)]
    pub created_at: String,
    /// The generated text; a single fragment in streaming mode.
    pub response: String,
    /// Indicates whether the generation is complete.
    pub done: bool,
    /// Why the generation finished (e.g. "stop", "length").
    #[serde(default)]
    pub done_reason: Option<String>,
    /// The total duration of the generation in nanoseconds.
    #[serde(default)]
    pub total_duration: u64,
    /// The duration spent loading the model in nanoseconds.
    #[serde(default)]
    pub load_duration: u64,
    /// The number of prompt tokens evaluated.
    #[serde(default)]
    pub prompt_eval_count: u64,
    /// The duration spent evaluating the prompt in nanoseconds.
    #[serde(default)]
    pub prompt_eval_duration: u64,
    /// The number of tokens generated.
    #[serde(default)]
    pub eval_count: u64,
    /// The duration spent generating tokens in nanoseconds.
    #[serde(default)]
    pub eval_duration: u64,
}

/// A convenience wrapper for a [`GenerateRequest`] with a non-streaming
/// response.
#[derive(Serialize, Default, Debug, Clone)]
pub struct SimpleGenerateRequest {
    pub model: String,
    pub prompt: Option<String>,
    pub suffix: Option<String>,
    pub images: Option<Vec<String>>,
    pub system: Option<String>,
    pub raw: Option<bool>,
    pub options: Option<GenerateOptions>,
}

impl SimpleGenerateRequest {
    /// Creates a new [`SimpleGenerateRequest`].
    pub fn new(model: String, prompt: String) -> Self {
        Self {
            model,
            prompt: Some(prompt),
            ..Default::default()
        }
    }

    /// Sets the system message for the request.
    pub fn system(mut self, system: String) -> Self {
        self.system = Some(system);
        self
    }

    /// Sets the images for the request. Each image is a base64-encoded string.
    pub fn images(mut self, images: Vec<String>) -> Self {
        self.images = Some(images);
        self
    }

    /// Sets the sampling options for the request.
    pub fn options(mut self, options: GenerateOptions) -> Self {
        self.options = Some(options);
        self
    }
}

impl From<SimpleGenerateRequest> for GenerateRequest {
    fn from(request: SimpleGenerateRequest) -> GenerateRequest {
        GenerateRequest {
            model: request.model,
            prompt: request.prompt,
            suffix: request.suffix,
            images: request.images,
            system: request.system,
            raw: request.raw,
            options: request.options,
            stream: false,
        }
    }
}

/// A convenience wrapper for a [`GenerateRequest`] with a streaming response.
#[derive(Serialize, Default, Debug, Clone)]
pub struct StreamingGenerateRequest {
    pub model: String,
    pub prompt: Option<String>,
    pub suffix: Option<String>,
    pub images: Option<Vec<String>>,
    pub system: Option<String>,
    pub raw: Option<bool>,
    pub options: Option<GenerateOptions>,
}

impl StreamingGenerateRequest {
    /// Creates a new [`StreamingGenerateRequest`].
    pub fn new(model: String, prompt: String) -> Self {
        Self {
            model,
            prompt: Some(prompt),
            ..Default::default()
        }
    }

    /// Sets the system message for the request.
    pub fn system(mut self, system: String) -> Self {
        self.system = Some(system);
        self
    }

    /// Sets the images for the request. Each image is a base64-encoded string.
    pub fn images(mut self, images: Vec<String>) -> Self {
        self.images = Some(images);
        self
    }

    /// Sets the sampling options for the request.
    pub fn options(mut self, options: GenerateOptions) -> Self {
        self.options = Some(options);
        self
    }
}

impl From<StreamingGenerateRequest> for GenerateRequest {
    fn from(request: StreamingGenerateRequest) -> GenerateRequest {
        GenerateRequest {
            model: request.model,
            prompt: request.prompt,
            suffix: request.suffix,
            images: request.images,
            system: request.system,
            raw: request.raw,
            options: request.options,
            stream: true,
        }
    }
}

/// An event received from a streaming generation response.
#[derive(Debug)]
pub enum GenerateStreamEvent {
    /// A fragment of the generated text.
    Chunk(GenerateResponse),
    /// An error reported by the server mid-stream.
    Error(String),
    /// A line that could not be parsed.
    Partial {
        partial: String,
        error: Option<String>,
    },
}

/// A stream of [`GenerateStreamEvent`]s for streaming text generation.
pub struct GenerateStream {
    pub inner: Pin<Box<dyn Stream<Item = Result<GenerateStreamEvent>> + Send>>,
}

impl Stream for GenerateStream {
    type Item = Result<GenerateStreamEvent>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl GenerateStream {
    pub fn from_bytes_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + Unpin + 'static,
    {
        let parser = GenericStreamParser::<S, GenerateResponse, GenerateStreamEvent>::new(stream);
        GenerateStream {
            inner: Box::pin(parser),
        }
    }
}

impl StreamEventExt<GenerateResponse> for GenerateStreamEvent {
    fn from_message(msg: GenerateResponse) -> Self {
        GenerateStreamEvent::Chunk(msg)
    }

    fn from_error(err: String) -> Self {
        GenerateStreamEvent::Error(err)
    }

    fn partial(partial: String, error: Option<String>) -> Self {
        GenerateStreamEvent::Partial { partial, error }
    }
}
