//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, every path → proxy handler)
//!     → request.rs (request ID assigned / kept)
//!     → routing::RequestRouter (pick backend)
//!     → client.rs (forward over hyper, stream response back)
//!     → response.rs (map failures to 502/503)
//!     → Send to client
//! ```

pub mod client;
pub mod request;
pub mod response;
pub mod server;

pub use client::{Forward, ForwardError, HttpForwarder};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
