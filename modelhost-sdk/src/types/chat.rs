//! Data structures for the multi-turn chat endpoint.

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use modelhost_sdk_macros::FromBytes;
use serde::{Deserialize, Serialize};

use crate::parser::{GenericStreamParser, StreamEventExt};
use crate::types::generate::GenerateOptions;
use crate::Result;

use super::Role;

/// The wire request for a chat completion.
///
/// Sends the full ordered message history to the model; the client never
/// retains conversation state between calls.
#[derive(Serialize, Default, Debug, Clone)]
pub struct ChatRequest {
    /// The name of the model to use for the chat completion.
    pub model: String,
    /// The ordered messages exchanged in the conversation so far.
    pub messages: Vec<ChatMessage>,
    /// If `true`, the response arrives as a series of [`ChatStreamEvent`]s.
    /// If `false` or `None`, a single [`ChatResponse`] is returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Additional sampling options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

/// A single message in a conversation.
#[derive(Deserialize, Serialize, Default, Debug, Clone)]
pub struct ChatMessage {
    /// The author of the message.
    pub role: Role,
    /// The text content of the message.
    pub content: String,
    /// Optional base64-encoded images attached to the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl ChatMessage {
    pub fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            images: None,
        }
    }

    /// A message with the `system` role.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content.into())
    }

    /// A message with the `user` role.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    /// A message with the `assistant` role.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into())
    }

    /// Attaches base64-encoded images to the message.
    pub fn images(mut self, images: Vec<String>) -> Self {
        self.images = Some(images);
        self
    }
}

/// A chat response from the server.
///
/// Used for non-streaming completions and for individual streamed chunks.
#[derive(Deserialize, Serialize, Default, FromBytes, Debug, Clone)]
pub struct ChatResponse {
    /// The name of the model that generated the response.
    pub model: String,
    /// The timestamp when the response was created.
    #[serde(default)]
    pub created_at: String,
    /// The message content from the model.
    pub message: ChatResponseMessage,
    /// Indicates whether the chat completion is complete.
    pub done: bool,
}

/// The assistant message inside a chat response.
#[derive(Deserialize, Serialize, Default, Debug, Clone)]
pub struct ChatResponseMessage {
    pub role: Role,
    pub content: String,
}

/// A convenience wrapper for a [`ChatRequest`] with a non-streaming response.
#[derive(Serialize, Default, Debug, Clone)]
pub struct SimpleChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub options: Option<GenerateOptions>,
}

impl SimpleChatRequest {
    /// Creates a new [`SimpleChatRequest`].
    pub fn new(model: String) -> Self {
        Self {
            model,
            messages: Vec::new(),
            options: None,
        }
    }

    /// Appends a message to the conversation.
    pub fn add_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Sets the sampling options for the request.
    pub fn options(mut self, options: GenerateOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// A convenience wrapper for a [`ChatRequest`] with a streaming response.
#[derive(Serialize, Default, Debug, Clone)]
pub struct StreamingChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub options: Option<GenerateOptions>,
}

impl StreamingChatRequest {
    /// Creates a new [`StreamingChatRequest`].
    pub fn new(model: String) -> Self {
        Self {
            model,
            messages: Vec::new(),
            options: None,
        }
    }

    /// Appends a message to the conversation.
    pub fn add_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Sets the sampling options for the request.
    pub fn options(mut self, options: GenerateOptions) -> Self {
        self.options = Some(options);
        self
    }
}

impl From<SimpleChatRequest> for ChatRequest {
    fn from(value: SimpleChatRequest) -> Self {
        ChatRequest {
            model: value.model,
            messages: value.messages,
            stream: Some(false),
            options: value.options,
        }
    }
}

impl From<StreamingChatRequest> for ChatRequest {
    fn from(value: StreamingChatRequest) -> Self {
        ChatRequest {
            model: value.model,
            messages: value.messages,
            stream: Some(true),
            options: value.options,
        }
    }
}

/// An event received from a streaming chat response.
#[derive(Debug)]
pub enum ChatStreamEvent {
    /// A chat response chunk.
    Message(ChatResponse),
    /// An error reported by the server mid-stream.
    Error(String),
    /// A line that could not be parsed.
    Partial {
        partial: String,
        error: Option<String>,
    },
}

/// A stream of [`ChatStreamEvent`]s for streaming chat completions.
pub struct ChatStream {
    pub inner: Pin<Box<dyn Stream<Item = Result<ChatStreamEvent>> + Send>>,
}

impl Stream for ChatStream {
    type Item = Result<ChatStreamEvent>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl ChatStream {
    pub fn from_bytes_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + Unpin + 'static,
    {
        let parser = GenericStreamParser::<S, ChatResponse, ChatStreamEvent>::new(stream);
        ChatStream {
            inner: Box::pin(parser),
        }
    }
}

impl StreamEventExt<ChatResponse> for ChatStreamEvent {
    fn from_message(msg: ChatResponse) -> Self {
        ChatStreamEvent::Message(msg)
    }

    fn from_error(err: String) -> Self {
        ChatStreamEvent::Error(err)
    }

    fn partial(partial: String, error: Option<String>) -> Self {
        ChatStreamEvent::Partial { partial, error }
    }
}
