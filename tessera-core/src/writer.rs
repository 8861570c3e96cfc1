//! Response writer capability
//!
//! A [`ResponseWriter`] is the byte sink a response is streamed into: a header
//! map that may be mutated until the head is written, a status line that is
//! committed exactly once, and a body that is written in chunks.
//!
//! Writers compose as decorators. A middleware that needs to observe or
//! transform the body detaches the current writer from the
//! [`Response`](crate::Response), wraps it, and installs the wrapper. Before
//! the middleware returns it must [`close`](ResponseWriter::close) its layer
//! and put the original writer back via [`into_inner`](ResponseWriter::into_inner).

use crate::{Error, HttpResponse};
use async_trait::async_trait;
use http::HeaderMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Byte sink for an HTTP response
#[async_trait]
pub trait ResponseWriter: Send {
    /// Headers that will be sent with the response head
    fn headers(&self) -> &HeaderMap;

    /// Mutable access to the pending headers.
    ///
    /// Changes made after [`write_head`](Self::write_head) are not sent.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commit the status line and headers to the client
    async fn write_head(&mut self, status: u16) -> Result<(), Error>;

    /// Write a chunk of body bytes, returning how many were accepted
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Error>;

    /// Push buffered bytes towards the client
    async fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Finish any encoding this layer applies. Must be idempotent.
    async fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Unwrap one decorator layer. Transports return `None`.
    fn into_inner(self: Box<Self>) -> Option<Box<dyn ResponseWriter>> {
        None
    }
}

/// What a client received from a [`ResponseRecorder`]
#[derive(Debug, Default)]
struct Recorded {
    status: Option<u16>,
    headers: HeaderMap,
    body: Vec<u8>,
    chunks: usize,
    flushes: usize,
}

/// Shared view of a recorder's output.
///
/// Stays readable after the recorder itself was boxed and handed to a
/// [`Response`](crate::Response).
#[derive(Debug, Clone, Default)]
pub struct Recording {
    inner: Arc<Mutex<Recorded>>,
}

impl Recording {
    /// Status sent to the client, if the head was written
    pub fn status(&self) -> Option<u16> {
        self.inner.lock().status
    }

    /// Headers as they were sent with the head
    pub fn headers(&self) -> HeaderMap {
        self.inner.lock().headers.clone()
    }

    pub fn body(&self) -> Vec<u8> {
        self.inner.lock().body.clone()
    }

    /// Number of non-empty body writes received
    pub fn chunks(&self) -> usize {
        self.inner.lock().chunks
    }

    pub fn flushes(&self) -> usize {
        self.inner.lock().flushes
    }

    /// The response the client observed so far
    pub fn response(&self) -> HttpResponse {
        let recorded = self.inner.lock();
        HttpResponse {
            status: recorded.status.unwrap_or(200),
            headers: recorded.headers.clone(),
            body: recorded.body.clone(),
        }
    }
}

/// In-memory transport that records what a client would receive.
///
/// Headers are snapshotted when the head is written, so header mutations
/// made afterwards are invisible, exactly like on a socket.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    headers: HeaderMap,
    recording: Recording,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for reading the recorded output
    pub fn recording(&self) -> Recording {
        self.recording.clone()
    }
}

#[async_trait]
impl ResponseWriter for ResponseRecorder {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    async fn write_head(&mut self, status: u16) -> Result<(), Error> {
        let mut recorded = self.recording.inner.lock();
        if let Some(sent) = recorded.status {
            return Err(Error::ResponseCommitted(format!(
                "status {} already sent, refusing {}",
                sent, status
            )));
        }
        recorded.status = Some(status);
        recorded.headers = self.headers.clone();
        Ok(())
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let mut recorded = self.recording.inner.lock();
        if recorded.status.is_none() {
            recorded.status = Some(200);
            recorded.headers = self.headers.clone();
        }
        if !buf.is_empty() {
            recorded.body.extend_from_slice(buf);
            recorded.chunks += 1;
        }
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Error> {
        self.recording.inner.lock().flushes += 1;
        Ok(())
    }
}

/// Writer that accepts and drops everything.
///
/// Occupies a [`Response`](crate::Response) while its real writer is detached.
#[derive(Debug, Default)]
pub struct Discard {
    headers: HeaderMap,
}

#[async_trait]
impl ResponseWriter for Discard {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    async fn write_head(&mut self, _status: u16) -> Result<(), Error> {
        Ok(())
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use http::header::CONTENT_TYPE;

    #[tokio::test]
    async fn test_recorder_snapshots_headers_at_head() {
        let mut rec = ResponseRecorder::new();
        let recording = rec.recording();
        rec.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        rec.write_head(201).await.unwrap();

        // Too late: the head is already on the wire
        rec.headers_mut()
            .insert("x-late", HeaderValue::from_static("1"));
        rec.write(b"body").await.unwrap();

        let res = recording.response();
        assert_eq!(res.status, 201);
        assert_eq!(res.header("content-type"), Some("text/plain"));
        assert!(res.header("x-late").is_none());
        assert_eq!(res.body, b"body");
    }

    #[tokio::test]
    async fn test_recorder_write_commits_implicitly() {
        let mut rec = ResponseRecorder::new();
        let recording = rec.recording();
        rec.write(b"a").await.unwrap();
        rec.write(b"").await.unwrap();
        rec.write(b"b").await.unwrap();
        rec.flush().await.unwrap();

        assert_eq!(recording.status(), Some(200));
        assert_eq!(recording.chunks(), 2);
        assert_eq!(recording.flushes(), 1);
        assert_eq!(recording.body(), b"ab");
    }

    #[tokio::test]
    async fn test_recorder_rejects_second_head() {
        let mut rec = ResponseRecorder::new();
        rec.write_head(200).await.unwrap();
        let err = rec.write_head(500).await.unwrap_err();
        assert!(matches!(err, Error::ResponseCommitted(_)));
    }

    #[tokio::test]
    async fn test_discard_and_transport_have_no_inner() {
        let mut discard = Discard::default();
        assert_eq!(discard.write(b"ignored").await.unwrap(), 7);

        let boxed: Box<dyn ResponseWriter> = Box::new(discard);
        assert!(boxed.into_inner().is_none());
    }
}
