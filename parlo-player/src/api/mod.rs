//! HTTP API
//!
//! REST control endpoints plus an SSE event stream.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};
