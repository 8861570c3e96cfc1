//! Gzip response compression middleware for Tessera
//!
//! [`CompressionMiddleware`] gzips response bodies for clients that send
//! `Accept-Encoding: gzip`. Headers are decided on the first body byte, so
//! empty responses and errors rendered after the handler fails never carry
//! `Content-Encoding`.
//!
//! # Example
//!
//! ```rust,no_run
//! use tessera_compression::{CompressionConfig, CompressionMiddleware};
//! use async_trait::async_trait;
//! use tessera_core::{Application, Context, Error, Handler};
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Handler for Hello {
//!     async fn call(&self, ctx: &mut Context) -> Result<(), Error> {
//!         ctx.string(200, "Hello, world!").await
//!     }
//! }
//!
//! let config = CompressionConfig::builder().level(6).build().unwrap();
//! let app = Application::new(Hello).with_middleware(CompressionMiddleware::with_config(config));
//! ```
//!
//! # Negotiation
//!
//! `gzip` and `x-gzip` are matched as case-insensitive tokens of the
//! `Accept-Encoding` list, and `q=0` rules them out. Everything else is served
//! unencoded and byte-identical to the handler's output.

mod config;
mod encoder;
mod error;
mod middleware;
mod negotiate;
mod writer;

pub use config::{CompressionConfig, CompressionConfigBuilder, DEFAULT_LEVEL, MAX_LEVEL, MIN_LEVEL};
pub use encoder::{CompressionStats, GzipEncoder};
pub use error::CompressionError;
pub use middleware::CompressionMiddleware;
pub use negotiate::{accepts_gzip, add_vary};
pub use writer::GzipWriter;

/// Result type for compression operations
pub type Result<T> = std::result::Result<T, CompressionError>;
