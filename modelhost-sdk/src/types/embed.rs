use modelhost_sdk_macros::FromBytes;
use serde::{Deserialize, Serialize};

/// Request body for computing a text embedding.
#[derive(Serialize, Default, Debug, Clone)]
pub struct EmbeddingsRequest {
    /// The model to embed with.
    pub model: String,
    /// The text to embed.
    pub prompt: String,
}

/// Response carrying the embedding vector.
#[derive(Deserialize, Serialize, Default, FromBytes, Debug)]
pub struct EmbeddingsResponse {
    /// Fixed-length numeric vector representation of the input text.
    pub embedding: Vec<f64>,
}
