use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

#[cfg(feature = "tracing")]
use tracing::instrument;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use futures::{Stream, StreamExt};
use reqwest::Url;
use serde::Serialize;

use crate::transport::Transport;
use crate::types::{HttpRequest, HttpResponse, HttpVerb};
use crate::Result;

/// A request observed by the mock, captured at dispatch time.
///
/// The captured `base` is the URL the client resolved from its configuration
/// snapshot when the call started, which lets tests assert that configuration
/// changes never affect requests already dispatched.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub base: Url,
    pub path: String,
    pub verb: HttpVerb,
    pub body: Option<serde_json::Value>,
}

/// A mock implementation of the [`Transport`] trait for testing purposes.
///
/// Canned responses and NDJSON stream bodies are queued per endpoint path.
/// Every dispatched request is recorded and can be inspected afterwards,
/// enabling isolated testing of client logic without network calls.
#[derive(Clone, Default)]
pub struct MockTransport {
    /// Queued results for non-streaming requests, keyed by path.
    responses: Arc<Mutex<HashMap<String, VecDeque<Result<HttpResponse>>>>>,
    /// Queued results for streaming requests, keyed by path. Each `Ok` entry
    /// is a sequence of lines emitted as one newline-terminated chunk each.
    streams: Arc<Mutex<HashMap<String, VecDeque<Result<Vec<String>>>>>>,
    /// Every request dispatched through the mock, in order.
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    /// Creates a new, empty [`MockTransport`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a raw [`HttpResponse`] for the next non-streaming request to
    /// `path`.
    pub fn with_response(self, path: impl Into<String>, response: HttpResponse) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(path.into())
            .or_default()
            .push_back(Ok(response));
        self
    }

    /// Queues a JSON body for the next non-streaming request to `path`.
    pub fn with_json_response<T: Serialize>(self, path: impl Into<String>, body: &T) -> Self {
        let bytes = serde_json::to_vec(body).expect("mock response must serialize");
        self.with_response(
            path,
            HttpResponse {
                body: Some(Bytes::from(bytes)),
            },
        )
    }

    /// Queues a failure for the next non-streaming request to `path`.
    pub fn with_error(self, path: impl Into<String>, error: crate::Error) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(path.into())
            .or_default()
            .push_back(Err(error));
        self
    }

    /// Queues a sequence of raw NDJSON lines for the next streaming request
    /// to `path`. Each line is delivered as a separate chunk with a trailing
    /// newline.
    pub fn with_stream_lines(self, path: impl Into<String>, lines: Vec<String>) -> Self {
        self.streams
            .lock()
            .unwrap()
            .entry(path.into())
            .or_default()
            .push_back(Ok(lines));
        self
    }

    /// Queues a sequence of JSON values for the next streaming request to
    /// `path`, serialized one per line.
    pub fn with_json_stream<T: Serialize>(self, path: impl Into<String>, items: Vec<T>) -> Self {
        let lines = items
            .iter()
            .map(|item| serde_json::to_string(item).expect("mock stream item must serialize"))
            .collect();
        self.with_stream_lines(path, lines)
    }

    /// Queues a failure for the next streaming request to `path`.
    pub fn with_stream_error(self, path: impl Into<String>, error: crate::Error) -> Self {
        self.streams
            .lock()
            .unwrap()
            .entry(path.into())
            .or_default()
            .push_back(Err(error));
        self
    }

    /// All requests dispatched through this mock so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: &HttpRequest) {
        self.requests.lock().unwrap().push(RecordedRequest {
            base: request.base.clone(),
            path: request.path.clone(),
            verb: request.verb,
            body: request.body.clone(),
        });
    }
}

#[async_trait]
impl Transport for MockTransport {
    /// Mocks a non-streaming HTTP request.
    ///
    /// Pops the next queued result for the request path; when nothing is
    /// queued, an empty [`HttpResponse`] is returned.
    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    async fn send_http_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.record(&request);
        let queued = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front);
        match queued {
            Some(result) => result,
            None => Ok(HttpResponse { body: None }),
        }
    }

    /// Mocks a streaming HTTP request.
    ///
    /// Pops the next queued line sequence for the request path; when nothing
    /// is queued, an empty stream is returned.
    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    async fn send_http_stream_request(
        &self,
        request: HttpRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>> {
        self.record(&request);
        let queued = self
            .streams
            .lock()
            .unwrap()
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front);
        match queued {
            Some(Ok(lines)) => {
                let byte_stream = stream::iter(lines)
                    .map(|line| Ok(Bytes::from(format!("{}\n", line))))
                    .boxed();
                Ok(byte_stream)
            }
            Some(Err(error)) => Err(error),
            None => Ok(stream::empty().boxed()),
        }
    }
}
