//! Streamed response bodies
//!
//! A [`ByteStream`] is an opaque source of body chunks produced elsewhere,
//! typically an upstream server whose response is being relayed. The
//! producer pushes chunks through a [`ByteStreamSender`]; the consumer hands
//! the stream to [`Context::stream`](crate::Context::stream).
//!
//! ```
//! use tessera_core::streaming::ByteStream;
//!
//! # tokio_test::block_on(async {
//! let (stream, sender) = ByteStream::new();
//!
//! tokio::spawn(async move {
//!     sender.send(b"Hello, ".to_vec()).await.ok();
//!     sender.send(b"World!".to_vec()).await.ok();
//!     sender.close().await;
//! });
//! # drop(stream);
//! # });
//! ```

use crate::Error;
use bytes::Bytes;
use futures_util::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// A chunk of streaming data.
#[derive(Debug, Clone)]
pub enum StreamChunk {
    /// Raw bytes
    Bytes(Bytes),
    /// End of stream
    End,
    /// The producer failed
    Error(String),
}

/// A stream of raw body bytes.
pub struct ByteStream {
    receiver: mpsc::Receiver<StreamChunk>,
}

/// Sender half of a byte stream.
#[derive(Clone)]
pub struct ByteStreamSender {
    sender: mpsc::Sender<StreamChunk>,
    bytes_sent: Arc<AtomicU64>,
}

impl ByteStream {
    /// Create a new byte stream with default buffer size (64).
    pub fn new() -> (Self, ByteStreamSender) {
        Self::with_buffer_size(64)
    }

    /// Create a new byte stream holding at most `size` unread chunks.
    pub fn with_buffer_size(size: usize) -> (Self, ByteStreamSender) {
        let (sender, receiver) = mpsc::channel(size);
        (
            Self { receiver },
            ByteStreamSender {
                sender,
                bytes_sent: Arc::new(AtomicU64::new(0)),
            },
        )
    }
}

impl Stream for ByteStream {
    type Item = Result<Bytes, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.receiver).poll_recv(cx) {
            Poll::Ready(Some(StreamChunk::Bytes(bytes))) => Poll::Ready(Some(Ok(bytes))),
            Poll::Ready(Some(StreamChunk::End)) | Poll::Ready(None) => Poll::Ready(None),
            Poll::Ready(Some(StreamChunk::Error(e))) => Poll::Ready(Some(Err(Error::BadGateway(e)))),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl ByteStreamSender {
    /// Send bytes to the stream. Waits while the buffer is full.
    pub async fn send(&self, data: impl Into<Vec<u8>>) -> Result<(), Error> {
        self.send_bytes(Bytes::from(data.into())).await
    }

    /// Send bytes from a Bytes object.
    pub async fn send_bytes(&self, bytes: Bytes) -> Result<(), Error> {
        let len = bytes.len() as u64;
        self.sender
            .send(StreamChunk::Bytes(bytes))
            .await
            .map_err(|e| Error::Internal(format!("Failed to send to stream: {}", e)))?;
        self.bytes_sent.fetch_add(len, Ordering::Relaxed);
        Ok(())
    }

    /// Abort the stream; the consumer sees a bad gateway error.
    pub async fn send_error(&self, error: impl Into<String>) -> Result<(), Error> {
        self.sender
            .send(StreamChunk::Error(error.into()))
            .await
            .map_err(|e| Error::Internal(format!("Failed to send error: {}", e)))
    }

    /// Signal end of stream
    pub async fn close(self) {
        let _ = self.sender.send(StreamChunk::End).await;
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Whether the consumer has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_chunks_arrive_in_order() {
        let (mut stream, sender) = ByteStream::new();

        let producer = tokio::spawn(async move {
            for i in 0..3 {
                sender.send(format!("chunk{i};")).await.unwrap();
            }
            let sent = sender.bytes_sent();
            sender.close().await;
            sent
        });

        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }

        assert_eq!(collected, b"chunk0;chunk1;chunk2;");
        assert_eq!(producer.await.unwrap(), 21);
    }

    #[tokio::test]
    async fn test_dropped_sender_ends_stream() {
        let (mut stream, sender) = ByteStream::new();
        drop(sender);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_sender_sees_closed_consumer() {
        let (stream, sender) = ByteStream::new();
        drop(stream);
        assert!(sender.is_closed());
        assert!(sender.send("late").await.is_err());
    }
}
