// Core library for the Tessera HTTP framework
// Request/response types, the writer capability, middleware chain and logging

pub mod application;
pub mod context;
pub mod error;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod sniff;
pub mod streaming;
pub mod writer;

pub use crate::application::Application;
pub use crate::context::Context;
pub use crate::error::Error;
pub use crate::http::{HttpRequest, HttpResponse};
pub use crate::middleware::{Handler, LoggingMiddleware, Middleware, MiddlewareChain, Next};
pub use crate::response::Response;
pub use crate::sniff::detect_content_type;
pub use crate::streaming::{ByteStream, ByteStreamSender};
pub use crate::writer::{Discard, Recording, ResponseRecorder, ResponseWriter};
