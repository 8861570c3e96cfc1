// Application: a handler plus its middleware pipeline

use crate::logging::{debug, error, info};
use crate::middleware::{Handler, Middleware, MiddlewareChain};
use crate::writer::ResponseRecorder;
use crate::{Context, Error, HttpRequest, HttpResponse};
use std::sync::Arc;
use std::time::Instant;

/// Runs requests through a middleware chain into a handler and renders any
/// error the chain returns.
///
/// # Examples
///
/// ```no_run
/// use tessera_core::*;
/// use async_trait::async_trait;
///
/// struct Hello;
///
/// #[async_trait]
/// impl Handler for Hello {
///     async fn call(&self, ctx: &mut Context) -> Result<(), Error> {
///         ctx.string(200, "Hello, world!").await
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let app = Application::new(Hello).with_middleware(LoggingMiddleware::new());
/// let response = app.handle(HttpRequest::get("/")).await;
/// assert_eq!(response.text(), "Hello, world!");
/// # });
/// ```
#[derive(Clone)]
pub struct Application {
    chain: MiddlewareChain,
    handler: Arc<dyn Handler>,
}

impl Application {
    pub fn new<H: Handler + 'static>(handler: H) -> Self {
        Self {
            chain: MiddlewareChain::new(),
            handler: Arc::new(handler),
        }
    }

    /// Append a middleware; the first one added is the outermost
    pub fn with_middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.chain.use_middleware(middleware);
        self
    }

    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        self.chain.use_middleware(middleware);
    }

    pub fn chain(&self) -> &MiddlewareChain {
        &self.chain
    }

    /// Serve one request into whatever writer the context holds.
    ///
    /// Handler errors are rendered here. The returned error only reports a
    /// failure to write the response itself.
    pub async fn dispatch(&self, ctx: &mut Context) -> Result<(), Error> {
        let start = Instant::now();

        if let Err(err) = self.chain.apply(ctx, self.handler.as_ref()).await {
            self.render_error(ctx, err).await?;
        }
        if !ctx.response.committed() {
            ctx.response.write_header(200).await?;
        }
        ctx.response.flush().await?;

        info!(
            method = %ctx.request.method,
            path = %ctx.request.path,
            status = ctx.response.status(),
            duration_ms = start.elapsed().as_millis(),
            "Request completed"
        );
        Ok(())
    }

    /// Serve a request in memory and return what the client would receive
    pub async fn handle(&self, request: HttpRequest) -> HttpResponse {
        let recorder = ResponseRecorder::new();
        let recording = recorder.recording();
        let mut ctx = Context::new(request, Box::new(recorder));

        if let Err(err) = self.dispatch(&mut ctx).await {
            error!(error = %err, "Failed to write response");
        }
        recording.response()
    }

    /// Default error rendering: status from the error, plain text message body
    async fn render_error(&self, ctx: &mut Context, err: Error) -> Result<(), Error> {
        if ctx.response.committed() {
            error!(
                error = %err,
                status = ctx.response.status(),
                "Handler failed after the response was committed"
            );
            return Ok(());
        }

        let status = err.status_code();
        if err.is_server_error() {
            error!(error = %err, status, "Handler returned an error");
        } else {
            debug!(error = %err, status, "Handler returned an error");
        }
        ctx.string(status, err.message()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoggingMiddleware;
    use async_trait::async_trait;

    struct Hello;

    #[async_trait]
    impl Handler for Hello {
        async fn call(&self, ctx: &mut Context) -> Result<(), Error> {
            ctx.string(200, "Hello, world!").await
        }
    }

    struct Fails;

    #[async_trait]
    impl Handler for Fails {
        async fn call(&self, _ctx: &mut Context) -> Result<(), Error> {
            Err(Error::http(500, "error"))
        }
    }

    struct FailsLate;

    #[async_trait]
    impl Handler for FailsLate {
        async fn call(&self, ctx: &mut Context) -> Result<(), Error> {
            ctx.string(200, "partial").await?;
            Err(Error::Internal("boom".into()))
        }
    }

    struct Silent;

    #[async_trait]
    impl Handler for Silent {
        async fn call(&self, _ctx: &mut Context) -> Result<(), Error> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_handle_success() {
        let app = Application::new(Hello).with_middleware(LoggingMiddleware::new());
        assert_eq!(app.chain().len(), 1);

        let res = app.handle(HttpRequest::get("/")).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.text(), "Hello, world!");
    }

    #[tokio::test]
    async fn test_error_rendered_as_plain_text() {
        let app = Application::new(Fails);
        let res = app.handle(HttpRequest::get("/")).await;

        assert_eq!(res.status, 500);
        assert_eq!(res.text(), "error");
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_error_after_commit_keeps_partial_response() {
        let app = Application::new(FailsLate);
        let res = app.handle(HttpRequest::get("/")).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.text(), "partial");
    }

    #[tokio::test]
    async fn test_silent_handler_commits_ok() {
        let app = Application::new(Silent);
        let res = app.handle(HttpRequest::get("/")).await;

        assert_eq!(res.status, 200);
        assert!(res.body.is_empty());
    }
}
