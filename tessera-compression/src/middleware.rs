//! Compression middleware implementation

use crate::CompressionConfig;
use crate::negotiate::accepts_gzip;
use crate::writer::GzipWriter;
use async_trait::async_trait;
use http::header::ACCEPT_ENCODING;
use tessera_core::logging::{error, trace};
use tessera_core::{Context, Error, Middleware, Next};

/// HTTP response compression middleware
///
/// Gzips response bodies for clients that advertise gzip in
/// `Accept-Encoding`. The handler's writer is swapped for a [`GzipWriter`]
/// for the duration of the request and restored before returning, so
/// middleware further out always sees the original writer.
///
/// # Example
///
/// ```rust,no_run
/// use tessera_compression::{CompressionConfig, CompressionMiddleware};
///
/// let middleware = CompressionMiddleware::new();
///
/// let config = CompressionConfig::builder().level(9).build().unwrap();
/// let middleware = CompressionMiddleware::with_config(config);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CompressionMiddleware {
    config: CompressionConfig,
}

impl CompressionMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CompressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }
}

#[async_trait]
impl Middleware for CompressionMiddleware {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), Error> {
        if !self.config.enabled {
            trace!("Compression disabled");
            return next.run(ctx).await;
        }
        if !accepts_gzip(ctx.request.header(ACCEPT_ENCODING)) {
            trace!(path = %ctx.request.path, "Client does not accept gzip");
            return next.run(ctx).await;
        }

        // Fail before the handler runs, while the response is still untouched
        self.config.validate()?;

        let original = ctx.response.take_writer();
        let gzip = GzipWriter::new(original, self.config.level)
            .compress_encoded(self.config.compress_encoded);
        let placeholder = ctx.response.set_writer(Box::new(gzip));

        let result = next.run(ctx).await;

        // Finish the stream and hand the original writer back on every path
        let closed = ctx.response.writer_mut().close().await;
        let wrapped = ctx.response.set_writer(placeholder);
        match wrapped.into_inner() {
            Some(original) => {
                ctx.response.set_writer(original);
            }
            None => error!("Gzip writer lost its inner writer"),
        }

        match (result, closed) {
            (Err(err), Err(close_err)) => {
                trace!(error = %close_err, "Ignoring close error after handler failure");
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
            (Ok(()), closed) => closed,
        }
    }
}
