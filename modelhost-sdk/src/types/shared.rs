use serde::{Deserialize, Serialize};

/// The author of a conversation message.
#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    #[default]
    User,
    Assistant,
}

/// The shape of an error line or error body reported by the server.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerError {
    pub error: String,
}
