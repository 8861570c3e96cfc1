// Middleware system for request/response processing

use crate::logging::{debug, error, info, trace, warn};
use crate::{Context, Error};
use async_trait::async_trait;
use std::sync::Arc;

/// Endpoint that produces the response for a request
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, ctx: &mut Context) -> Result<(), Error>;
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Arc<H> {
    async fn call(&self, ctx: &mut Context) -> Result<(), Error> {
        (**self).call(ctx).await
    }
}

/// Middleware trait for processing requests around the handler
///
/// Code before `next.run(ctx)` sees the request first; code after it runs
/// once everything further down the chain has returned.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), Error>;
}

/// The rest of the chain, from the point of view of one middleware
pub struct Next<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    endpoint: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub fn new(middlewares: &'a [Arc<dyn Middleware>], endpoint: &'a dyn Handler) -> Self {
        Self {
            middlewares,
            endpoint,
        }
    }

    /// Invoke the next middleware, or the endpoint once the chain is exhausted
    pub async fn run(mut self, ctx: &mut Context) -> Result<(), Error> {
        let middlewares = self.middlewares;
        if let Some((current, rest)) = middlewares.split_first() {
            self.middlewares = rest;
            trace!(remaining = rest.len(), "Executing middleware");
            current.handle(ctx, self).await
        } else {
            trace!("Middleware chain complete, calling handler");
            self.endpoint.call(ctx).await
        }
    }
}

/// Middleware chain executor
///
/// Built once at configuration time. The first middleware added is the
/// outermost one.
#[derive(Clone)]
pub struct MiddlewareChain {
    middlewares: Arc<Vec<Arc<dyn Middleware>>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Arc::new(Vec::new()),
        }
    }

    /// Add a middleware to the chain
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        let mut mws = (*self.middlewares).clone();
        mws.push(Arc::new(middleware));
        self.middlewares = Arc::new(mws);
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Execute the middleware chain with a handler
    pub async fn apply(&self, ctx: &mut Context, handler: &dyn Handler) -> Result<(), Error> {
        debug!(
            middleware_count = self.middlewares.len(),
            path = %ctx.request.path,
            method = %ctx.request.method,
            "Executing middleware chain"
        );
        Next::new(&self.middlewares, handler).run(ctx).await
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP request logging middleware
///
/// Logs method, path, committed status, body size and duration of every
/// request that passes through it.
pub struct LoggingMiddleware {
    /// Log failed requests at error level instead of warn
    pub errors_as_error: bool,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self {
            errors_as_error: true,
        }
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), Error> {
        let start = std::time::Instant::now();
        let method = ctx.request.method.clone();
        let path = ctx.request.path.clone();

        let result = next.run(ctx).await;
        let duration = start.elapsed();

        match &result {
            Ok(()) => info!(
                method = %method,
                path = %path,
                status = ctx.response.status(),
                bytes = ctx.response.size(),
                duration_ms = duration.as_millis(),
                "HTTP response sent"
            ),
            Err(err) if self.errors_as_error => error!(
                method = %method,
                path = %path,
                duration_ms = duration.as_millis(),
                error = %err,
                "HTTP request failed"
            ),
            Err(err) => warn!(
                method = %method,
                path = %path,
                duration_ms = duration.as_millis(),
                error = %err,
                "HTTP request failed"
            ),
        }

        result
    }
}
