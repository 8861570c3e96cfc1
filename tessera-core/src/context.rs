// Per-request context handed to middleware and handlers

use crate::streaming::ByteStream;
use crate::writer::ResponseWriter;
use crate::{Error, HttpRequest, Response};
use futures_util::StreamExt;
use http::header::{CONTENT_TYPE, HeaderValue};

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";
const TEXT_HTML_UTF8: &str = "text/html; charset=utf-8";

/// Request-scoped state: the incoming request and the response being built.
#[derive(Debug)]
pub struct Context {
    pub request: HttpRequest,
    pub response: Response,
}

impl Context {
    pub fn new(request: HttpRequest, writer: Box<dyn ResponseWriter>) -> Self {
        Self {
            request,
            response: Response::new(writer),
        }
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn response(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Send a plain text body
    pub async fn string(&mut self, status: u16, body: impl AsRef<str>) -> Result<(), Error> {
        self.respond(status, HeaderValue::from_static(TEXT_PLAIN_UTF8), body.as_ref().as_bytes())
            .await
    }

    /// Send an HTML body
    pub async fn html(&mut self, status: u16, body: impl AsRef<str>) -> Result<(), Error> {
        self.respond(status, HeaderValue::from_static(TEXT_HTML_UTF8), body.as_ref().as_bytes())
            .await
    }

    /// Send raw bytes with an explicit content type
    pub async fn blob(&mut self, status: u16, content_type: &str, data: &[u8]) -> Result<(), Error> {
        let value = HeaderValue::from_str(content_type)
            .map_err(|e| Error::Internal(format!("invalid content type {content_type:?}: {e}")))?;
        self.respond(status, value, data).await
    }

    /// Commit a status without a body
    pub async fn no_content(&mut self, status: u16) -> Result<(), Error> {
        self.response.write_header(status).await
    }

    /// Relay a byte stream chunk by chunk, flushing after each chunk.
    ///
    /// Headers must be in place before calling; the status is committed
    /// before the first chunk arrives.
    pub async fn stream(&mut self, status: u16, mut body: ByteStream) -> Result<(), Error> {
        self.response.write_header(status).await?;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            self.response.write(&chunk).await?;
            self.response.flush().await?;
        }
        Ok(())
    }

    async fn respond(&mut self, status: u16, content_type: HeaderValue, body: &[u8]) -> Result<(), Error> {
        self.response.headers_mut().insert(CONTENT_TYPE, content_type);
        self.response.write_header(status).await?;
        self.response.write(body).await?;
        Ok(())
    }
}
