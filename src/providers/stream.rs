// Pull-based JSON-lines decoder
//
// Local inference daemons answer with one JSON object per line, delivered in
// arbitrary byte chunks. A chunk may end in the middle of a line or in the
// middle of a multi-byte UTF-8 sequence, so bytes are buffered until a full
// line is available and only complete lines are decoded.

use futures::stream::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::errors::TransportError;

type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TransportError>> + Send>>;

/// Lazy, finite, non-restartable sequence of decoded JSON lines.
pub struct JsonLines<T> {
    inner: ByteStream,
    buffer: Vec<u8>,
    provider: String,
    exhausted: bool,
    _item: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> JsonLines<T> {
    pub fn new<S, B>(provider: impl Into<String>, bytes: S) -> Self
    where
        S: Stream<Item = Result<B, TransportError>> + Send + 'static,
        B: AsRef<[u8]>,
    {
        Self {
            inner: Box::pin(bytes.map(|chunk| chunk.map(|b| b.as_ref().to_vec()))),
            buffer: Vec::new(),
            provider: provider.into(),
            exhausted: false,
            _item: PhantomData,
        }
    }

    /// Take the next complete line out of the buffer, skipping blank ones.
    fn next_line(&mut self) -> Option<Vec<u8>> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let trimmed = trim_ascii(&line[..line.len() - 1]);
            if !trimmed.is_empty() {
                return Some(trimmed.to_vec());
            }
        }
        None
    }

    fn decode(&self, line: &[u8]) -> Result<T, TransportError> {
        serde_json::from_slice(line).map_err(|source| TransportError::Malformed {
            provider: self.provider.clone(),
            source,
        })
    }
}

impl<T: DeserializeOwned> Stream for JsonLines<T> {
    type Item = Result<T, TransportError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(line) = self.next_line() {
                return Poll::Ready(Some(self.decode(&line)));
            }
            if self.exhausted {
                return Poll::Ready(None);
            }

            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => self.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => {
                    self.exhausted = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    self.exhausted = true;
                    // Final line without a trailing newline
                    let rest = std::mem::take(&mut self.buffer);
                    let rest = trim_ascii(&rest);
                    if !rest.is_empty() {
                        return Poll::Ready(Some(self.decode(rest)));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |p| p + 1);
    &bytes[start..end]
}
