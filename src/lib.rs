// Tessera - composable async HTTP middleware with streaming gzip compression
//
// This crate re-exports the framework core and, behind the default
// `compression` feature, the gzip response middleware.

// Re-export core functionality
pub use tessera_core::*;

pub use async_trait::async_trait;

#[cfg(feature = "compression")]
pub use tessera_compression;

#[cfg(feature = "compression")]
pub use tessera_compression::{CompressionConfig, CompressionMiddleware};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::async_trait;
    pub use tessera_core::{
        Application, Context, Error, Handler, HttpRequest, HttpResponse, LoggingMiddleware,
        Middleware, MiddlewareChain, Next, ResponseWriter,
    };

    #[cfg(feature = "compression")]
    pub use tessera_compression::{CompressionConfig, CompressionMiddleware};
}
