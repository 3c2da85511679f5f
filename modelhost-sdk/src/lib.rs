use std::sync::{Arc, RwLock};

use thiserror::Error;

use self::config::ClientConfig;
use self::transport::Transport;

pub mod builder;
pub mod client;
pub mod config;
pub mod parser;
pub mod transport;
pub mod types;

/// An asynchronous client for a locally running model server.
///
/// The client is cheap to clone; clones share the underlying transport and
/// configuration. All operations are independent request/response exchanges
/// and may be in flight concurrently.
#[derive(Clone)]
pub struct ModelHostClient {
    transport: Arc<dyn Transport + Send + Sync>,
    config: Arc<RwLock<ClientConfig>>,
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Client error: {0}")]
    Client(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Server error: {0}")]
    Server(String),

    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Stream cancelled")]
    Cancelled,
}
