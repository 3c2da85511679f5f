//! Model management types: listing, metadata, download progress, deletion,
//! and server status.

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use modelhost_sdk_macros::FromBytes;
use serde::{Deserialize, Serialize};

use crate::parser::{GenericStreamParser, StreamEventExt};
use crate::Result;

/// Response from listing all models available on the server.
#[derive(Deserialize, Serialize, Default, FromBytes, Debug)]
pub struct ListModelsResponse {
    /// Models in the order the server reports them.
    pub models: Vec<ModelDescriptor>,
}

/// An immutable snapshot of a single model as reported by the server.
#[derive(Deserialize, Serialize, Default, Debug, Clone)]
pub struct ModelDescriptor {
    /// The model name with tag (e.g. "llama3.2:3b").
    pub name: String,
    /// The size of the model in bytes.
    #[serde(default)]
    pub size: u64,
    /// The content digest of the model.
    #[serde(default)]
    pub digest: String,
    /// The timestamp when the model was last modified (ISO 8601 format).
    #[serde(default)]
    pub modified_at: String,
    /// Detailed information about the model, when the server provides it.
    #[serde(default)]
    pub details: Option<ModelDetails>,
}

/// Detailed information about a model.
#[derive(Deserialize, Serialize, Default, Debug, Clone)]
pub struct ModelDetails {
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub families: Vec<String>,
    /// The parameter size of the model (e.g. "3B").
    #[serde(default)]
    pub parameter_size: String,
    /// The quantization level of the model (e.g. "Q4_0").
    #[serde(default)]
    pub quantization_level: String,
}

/// Response from listing models currently loaded on the server.
#[derive(Deserialize, Serialize, Default, FromBytes, Debug)]
pub struct RunningModelsResponse {
    pub models: Vec<RunningModel>,
}

/// A model currently loaded into server memory.
#[derive(Deserialize, Serialize, Default, Debug, Clone)]
pub struct RunningModel {
    /// The name of the loaded model.
    pub model: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: String,
    /// The timestamp when the model is expected to be unloaded.
    #[serde(default)]
    pub expires_at: String,
    /// The VRAM usage of the model in bytes.
    #[serde(default)]
    pub size_vram: u64,
}

/// Response from the server's version endpoint.
#[derive(Deserialize, Serialize, Default, FromBytes, Debug)]
pub struct VersionResponse {
    pub version: String,
}

/// A point-in-time view of the server, recomputed on every status call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerStatus {
    /// Whether the server answered the status request at all.
    pub running: bool,
    pub version: Option<String>,
    /// Names of the models currently loaded into memory.
    pub loaded_models: Vec<String>,
}

impl ServerStatus {
    /// Status reported when the server cannot be reached. An unreachable
    /// server is an expected condition, not an error.
    pub fn offline() -> Self {
        Self::default()
    }
}

/// Request body for querying a model's server-defined metadata.
#[derive(Serialize, Default, Debug, Clone)]
pub struct ModelInfoRequest {
    pub name: String,
}

/// Request body for downloading a model.
#[derive(Serialize, Default, Debug, Clone)]
pub struct PullRequest {
    pub name: String,
    pub stream: bool,
}

/// One progress line of a streaming model download.
#[derive(Deserialize, Serialize, Default, Debug, Clone)]
pub struct PullProgress {
    /// Status message, "success" once the download completed.
    #[serde(default)]
    pub status: String,
    /// Digest of the layer currently being downloaded.
    #[serde(default)]
    pub digest: Option<String>,
    /// Total size of the current layer in bytes.
    #[serde(default)]
    pub total: Option<u64>,
    /// Bytes of the current layer downloaded so far.
    #[serde(default)]
    pub completed: Option<u64>,
}

impl PullProgress {
    /// Completion fraction of the current layer in `0.0..=1.0`, when the
    /// server reported byte counts for it.
    pub fn fraction(&self) -> Option<f64> {
        match (self.total, self.completed) {
            (Some(total), Some(completed)) if total > 0 => {
                Some((completed as f64 / total as f64).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }
}

/// Request body for removing a model from the server.
#[derive(Serialize, Default, Debug, Clone)]
pub struct DeleteRequest {
    pub name: String,
}

/// An event received while a model download streams progress.
#[derive(Debug)]
pub enum PullStreamEvent {
    /// A progress line.
    Progress(PullProgress),
    /// An error reported by the server mid-download.
    Error(String),
    /// A line that could not be parsed.
    Partial {
        partial: String,
        error: Option<String>,
    },
}

/// A stream of [`PullStreamEvent`]s for a model download in progress.
pub struct PullStream {
    pub inner: Pin<Box<dyn Stream<Item = Result<PullStreamEvent>> + Send>>,
}

impl Stream for PullStream {
    type Item = Result<PullStreamEvent>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl PullStream {
    pub fn from_bytes_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + Unpin + 'static,
    {
        let parser = GenericStreamParser::<S, PullProgress, PullStreamEvent>::new(stream);
        PullStream {
            inner: Box::pin(parser),
        }
    }
}

impl StreamEventExt<PullProgress> for PullStreamEvent {
    fn from_message(msg: PullProgress) -> Self {
        PullStreamEvent::Progress(msg)
    }

    fn from_error(err: String) -> Self {
        PullStreamEvent::Error(err)
    }

    fn partial(partial: String, error: Option<String>) -> Self {
        PullStreamEvent::Partial { partial, error }
    }
}
