//! Runtime configuration held by the client.
//!
//! Configuration is plain last-writer-wins state: every operation snapshots
//! it once at call start, so updates never affect requests already in flight.

use std::time::Duration;

use reqwest::Url;

/// Fallback server address when neither the builder nor the environment
/// provides one.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

/// Fallback model identifier for convenience calls that omit one.
pub const DEFAULT_MODEL: &str = "llama3.2:3b";

/// Total request timeout applied to non-streaming calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A snapshot of the client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the model server.
    pub base_url: Url,
    /// Model used by convenience calls when none is given.
    pub default_model: String,
    /// Timeout for non-streaming requests. Streaming calls are open-ended
    /// and only bounded by the transport's connect timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Picks the explicit model when given, otherwise the configured default.
    pub fn resolve_model(&self, model: Option<&str>) -> String {
        match model {
            Some(name) => name.to_string(),
            None => self.default_model.clone(),
        }
    }
}
