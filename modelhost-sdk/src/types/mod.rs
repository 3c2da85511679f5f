//! Data structures for requests and responses to the model server.
//!
//! This module defines the types used to interact with the server, including
//! chat messages, generation requests, model management, embeddings, and
//! shared utilities.

pub mod chat;
pub mod generate;
mod embed;
mod http;
mod models;
mod shared;

pub use embed::*;
pub use http::*;
pub use models::*;
pub use shared::*;
