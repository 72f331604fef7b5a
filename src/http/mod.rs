//! HTTP protocol implementation.
//!
//! This module implements the restricted HTTP/1.1 subset the server speaks:
//! `GET` requests with a mandatory `Host`, keep-alive by default, and
//! `Connection: close` on request.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection request-response state machine
//! - **`parser`**: Parses requests from buffered bytes, with a deadline-bounded async entry point
//! - **`request`**: HTTP request representation and header name normalization
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes responses with headers in sorted order and streams bodies
//! - **`mime`**: Content type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │ AwaitingRequest  │ ← Read until a full request or the deadline
//!        └──────┬───────────┘
//!               │ Request parsed          (idle / I/O error → Closed, silently)
//!               ▼                         (malformed → Responding 400 + close)
//!        ┌──────────────────┐
//!        │     Parsed       │ ← Resolve the path, build the response
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │   Responding     │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → AwaitingRequest (same connection)
//!               └─ Close → Closed
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lantern::config::Config;
//! use lantern::http::connection::{Connection, Settings};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut cfg = Config::default();
//!     cfg.static_files.root = "./htdocs".into();
//!     let settings = Arc::new(Settings::from_config(&cfg)?);
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let settings = Arc::clone(&settings);
//!         tokio::spawn(async move {
//!             Connection::new(socket, settings).run().await;
//!         });
//!     }
//! }
//! ```

pub mod request;
pub mod response;
pub mod parser;
pub mod connection;
pub mod writer;
pub mod mime;
