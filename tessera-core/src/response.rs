// Framework-level response wrapper around the current ResponseWriter

use crate::logging::warn;
use crate::writer::{Discard, ResponseWriter};
use crate::Error;
use http::HeaderMap;
use std::fmt;

/// The response half of a request [`Context`](crate::Context).
///
/// Owns whichever writer is currently installed and tracks what the handler
/// chain has committed: the status, whether the head was written, and how
/// many body bytes were accepted.
pub struct Response {
    writer: Box<dyn ResponseWriter>,
    status: u16,
    committed: bool,
    size: u64,
}

impl Response {
    pub fn new(writer: Box<dyn ResponseWriter>) -> Self {
        Self {
            writer,
            status: 200,
            committed: false,
            size: 0,
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        self.writer.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.writer.headers_mut()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Whether the status line was already written
    pub fn committed(&self) -> bool {
        self.committed
    }

    /// Body bytes accepted so far
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Commit the status and headers.
    ///
    /// A second call is ignored with a warning; the first status wins.
    pub async fn write_header(&mut self, status: u16) -> Result<(), Error> {
        if self.committed {
            warn!(
                status = self.status,
                attempted = status,
                "response already committed"
            );
            return Ok(());
        }
        self.status = status;
        self.committed = true;
        self.writer.write_head(status).await
    }

    /// Write body bytes, committing a 200 first if nothing was committed yet
    pub async fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        if !self.committed {
            self.write_header(200).await?;
        }
        let written = self.writer.write(buf).await?;
        self.size += written as u64;
        Ok(written)
    }

    pub async fn flush(&mut self) -> Result<(), Error> {
        self.writer.flush().await
    }

    /// Mutable access to the installed writer
    pub fn writer_mut(&mut self) -> &mut dyn ResponseWriter {
        self.writer.as_mut()
    }

    /// Detach the installed writer, leaving a [`Discard`] in its place
    pub fn take_writer(&mut self) -> Box<dyn ResponseWriter> {
        std::mem::replace(&mut self.writer, Box::new(Discard::default()))
    }

    /// Install a writer, returning the previous one
    pub fn set_writer(&mut self, writer: Box<dyn ResponseWriter>) -> Box<dyn ResponseWriter> {
        std::mem::replace(&mut self.writer, writer)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("committed", &self.committed)
            .field("size", &self.size)
            .field("headers", self.writer.headers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::ResponseRecorder;

    #[tokio::test]
    async fn test_write_commits_ok_status() {
        let recorder = ResponseRecorder::new();
        let recording = recorder.recording();
        let mut response = Response::new(Box::new(recorder));

        assert!(!response.committed());
        response.write(b"hello").await.unwrap();

        assert!(response.committed());
        assert_eq!(response.status(), 200);
        assert_eq!(response.size(), 5);
        assert_eq!(recording.status(), Some(200));
        assert_eq!(recording.body(), b"hello");
    }

    #[tokio::test]
    async fn test_second_write_header_is_ignored() {
        let recorder = ResponseRecorder::new();
        let recording = recorder.recording();
        let mut response = Response::new(Box::new(recorder));

        response.write_header(204).await.unwrap();
        response.write_header(500).await.unwrap();

        assert_eq!(response.status(), 204);
        assert_eq!(recording.status(), Some(204));
    }

    #[tokio::test]
    async fn test_take_and_restore_writer() {
        let recorder = ResponseRecorder::new();
        let recording = recorder.recording();
        let mut response = Response::new(Box::new(recorder));

        let original = response.take_writer();
        // Writes while detached are swallowed
        response.writer_mut().write(b"lost").await.unwrap();
        response.set_writer(original);
        response.write(b"kept").await.unwrap();

        assert_eq!(recording.body(), b"kept");
    }
}
