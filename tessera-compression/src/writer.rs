//! Gzip response writer
//!
//! [`GzipWriter`] decorates the installed [`ResponseWriter`] in two stages.
//! The outer stage holds back the status line until the first body byte
//! arrives, sniffs the plaintext for a `Content-Type`, and only then decides
//! on the encoding headers. The inner stage feeds every later byte through a
//! [`GzipEncoder`].
//!
//! A response that never writes a body therefore never carries
//! `Content-Encoding`, and an error rendered by an outer layer after the
//! writer is closed goes out as plain text.

use crate::encoder::GzipEncoder;
use crate::negotiate::add_vary;
use async_trait::async_trait;
use http::header::{
    ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue,
};
use tessera_core::logging::{debug, trace};
use tessera_core::{Error, ResponseWriter, detect_content_type};

enum State {
    /// Nothing written yet; status and headers are still negotiable
    Pending,
    Gzip(GzipEncoder),
    /// Body was already encoded by the handler and is forwarded untouched
    PassThrough,
    Closed,
}

/// Response writer that gzips the body on its way to the inner writer
pub struct GzipWriter {
    inner: Box<dyn ResponseWriter>,
    level: u32,
    compress_encoded: bool,
    status: Option<u16>,
    state: State,
}

impl GzipWriter {
    pub fn new(inner: Box<dyn ResponseWriter>, level: u32) -> Self {
        Self {
            inner,
            level,
            compress_encoded: false,
            status: None,
            state: State::Pending,
        }
    }

    /// Gzip bodies even when the handler declared its own `Content-Encoding`
    pub fn compress_encoded(mut self, enable: bool) -> Self {
        self.compress_encoded = enable;
        self
    }

    /// Whether the first body byte has gone through
    pub fn started(&self) -> bool {
        !matches!(self.state, State::Pending)
    }

    /// Settle headers from the first plaintext chunk and send the deferred head
    async fn start(&mut self, first_chunk: &[u8]) -> Result<(), Error> {
        let headers = self.inner.headers_mut();

        let sniffed = (!headers.contains_key(CONTENT_TYPE))
            .then(|| detect_content_type(first_chunk));

        let declared = headers
            .get(CONTENT_ENCODING)
            .filter(|v| !v.as_bytes().eq_ignore_ascii_case(b"identity"))
            .cloned();

        let state = match declared {
            Some(encoding) if !self.compress_encoded => {
                debug!(
                    content_encoding = ?encoding,
                    "Body already encoded, passing through"
                );
                State::PassThrough
            }
            declared => {
                // Every fallible step runs before the first header mutation
                let encoder = GzipEncoder::new(self.level)?;
                let encoding = match declared {
                    Some(existing) => {
                        let stacked = [existing.as_bytes(), b", gzip".as_slice()].concat();
                        HeaderValue::from_bytes(&stacked)
                            .map_err(|e| Error::Compression(e.to_string()))?
                    }
                    None => HeaderValue::from_static("gzip"),
                };
                headers.insert(CONTENT_ENCODING, encoding);
                add_vary(headers, &ACCEPT_ENCODING);
                // The plaintext length no longer describes the body
                headers.remove(CONTENT_LENGTH);
                State::Gzip(encoder)
            }
        };

        if let Some(content_type) = sniffed {
            trace!(content_type, "Sniffed content type");
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        self.state = state;

        self.inner.write_head(self.status.unwrap_or(200)).await
    }

    async fn forward(&mut self, data: &[u8]) -> Result<(), Error> {
        if !data.is_empty() {
            self.inner.write(data).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ResponseWriter for GzipWriter {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    async fn write_head(&mut self, status: u16) -> Result<(), Error> {
        match self.state {
            State::Pending => {
                self.status = Some(status);
                Ok(())
            }
            // Already on the wire; let the transport report it
            _ => self.inner.write_head(status).await,
        }
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        if matches!(self.state, State::Pending) {
            self.start(buf).await?;
        }

        match &mut self.state {
            State::Gzip(encoder) => {
                let compressed = encoder.compress_chunk(buf)?;
                self.forward(&compressed).await?;
            }
            State::PassThrough => {
                self.inner.write(buf).await?;
            }
            State::Pending | State::Closed => {
                return Err(Error::ResponseCommitted(
                    "write after the gzip stream was closed".to_string(),
                ));
            }
        }
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Error> {
        if let State::Gzip(encoder) = &mut self.state {
            let pending = encoder.flush()?;
            self.forward(&pending).await?;
        }
        self.inner.flush().await
    }

    async fn close(&mut self) -> Result<(), Error> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Gzip(encoder) => {
                let stats = encoder.stats();
                let trailer = encoder.finish()?;
                self.forward(&trailer).await?;
                debug!(
                    bytes_in = stats.bytes_in,
                    bytes_out = stats.bytes_out + trailer.len() as u64,
                    "Gzip stream finished"
                );
            }
            State::Pending => {
                // Empty body: send the deferred status bare
                if let Some(status) = self.status {
                    self.inner.write_head(status).await?;
                }
            }
            State::PassThrough | State::Closed => {}
        }
        Ok(())
    }

    fn into_inner(self: Box<Self>) -> Option<Box<dyn ResponseWriter>> {
        Some(self.inner)
    }
}
