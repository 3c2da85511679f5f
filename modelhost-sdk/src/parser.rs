//! Generic parser for the server's newline-delimited JSON streams.
//!
//! Every streaming endpoint (chat, generate, pull) emits one JSON object per
//! line. The parser buffers raw bytes, cuts complete lines, and adapts each
//! line into an endpoint-specific event type.

use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use serde::de::DeserializeOwned;

use crate::types::ServerError;
use crate::Result;

/// Conversion trait so endpoint-specific event enums can be constructed from
/// a successfully deserialized message `M`, an error string reported by the
/// server, or an unparseable partial payload.
pub trait StreamEventExt<M>: Sized {
    /// Create an event from a successfully deserialized message.
    fn from_message(msg: M) -> Self;

    /// Create an event from a server-reported error string.
    fn from_error(err: String) -> Self;

    /// Create a partial event (with optional parse error text).
    fn partial(partial: String, error: Option<String>) -> Self;
}

/// Newline-delimited JSON streaming parser.
///
/// - `S` is the underlying stream that yields `Result<Bytes>`
/// - `M` is the concrete message struct expected per line (DeserializeOwned)
/// - `E` is the endpoint event enum type that implements `StreamEventExt<M>`
pub struct GenericStreamParser<S, M, E>
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin,
    M: DeserializeOwned,
    E: StreamEventExt<M>,
{
    inner: S,
    buffer: Vec<u8>,
    _marker: PhantomData<(M, E)>,
}

impl<S, M, E> GenericStreamParser<S, M, E>
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin,
    M: DeserializeOwned,
    E: StreamEventExt<M>,
{
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Cut one complete newline-terminated line from the buffer and adapt it.
    /// Returns `None` when no full line is buffered yet; blank lines are
    /// skipped.
    fn next_event(&mut self) -> Option<E> {
        loop {
            let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
            let line_bytes = self.buffer.drain(..=newline_pos).collect::<Vec<u8>>();
            let line_str = String::from_utf8_lossy(&line_bytes);
            let line_str = line_str.trim();

            if line_str.is_empty() {
                continue;
            }

            // Expected message first, then the server's error line shape,
            // then fall back to a partial event carrying the raw line.
            match serde_json::from_str::<M>(line_str) {
                Ok(msg) => return Some(E::from_message(msg)),
                Err(parse_err) => match serde_json::from_str::<ServerError>(line_str) {
                    Ok(err) => return Some(E::from_error(err.error)),
                    Err(_) => {
                        return Some(E::partial(
                            line_str.to_string(),
                            Some(parse_err.to_string()),
                        ))
                    }
                },
            }
        }
    }
}

impl<S, M, E> Stream for GenericStreamParser<S, M, E>
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin,
    M: DeserializeOwned + Unpin,
    E: StreamEventExt<M> + Unpin,
{
    type Item = Result<E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // All fields are Unpin, so mutating through get_mut is sound here.
        let this = self.get_mut();

        loop {
            if let Some(event) = this.next_event() {
                return Poll::Ready(Some(Ok(event)));
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => {
                    // Stream ended; anything left in the buffer is an
                    // unterminated trailing line.
                    if this.buffer.is_empty() {
                        return Poll::Ready(None);
                    }
                    let tail = String::from_utf8_lossy(&this.buffer).to_string();
                    this.buffer.clear();
                    if tail.trim().is_empty() {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(Ok(E::partial(tail, None))));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
