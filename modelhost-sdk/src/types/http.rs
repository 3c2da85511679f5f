use std::time::Duration;

use bytes::Bytes;
use reqwest::Url;
use serde::Serialize;

use crate::Result;

/// A transport-agnostic HTTP request.
///
/// The base URL is resolved from the client's configuration snapshot when the
/// request is built, so configuration changes never redirect a request that
/// has already been dispatched.
#[derive(Debug)]
pub struct HttpRequest {
    /// Absolute base URL of the server, captured at call start.
    pub base: Url,
    /// Endpoint path relative to `base` (e.g. "/api/chat").
    pub path: String,
    pub verb: HttpVerb,
    pub body: Option<serde_json::Value>,
    /// Total request timeout; `None` for open-ended streaming requests.
    pub timeout: Option<Duration>,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    #[default]
    GET,
    POST,
    DELETE,
}

#[derive(Debug)]
pub struct HttpResponse {
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(base: Url, path: impl Into<String>) -> Self {
        Self {
            base,
            path: path.into(),
            verb: HttpVerb::default(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(mut self) -> Self {
        self.verb = HttpVerb::GET;
        self
    }

    pub fn post(mut self) -> Self {
        self.verb = HttpVerb::POST;
        self
    }

    pub fn delete(mut self) -> Self {
        self.verb = HttpVerb::DELETE;
        self
    }

    pub fn body<T: Serialize>(mut self, body: T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
