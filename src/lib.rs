//! Lantern - static-file HTTP/1.1 server
//!
//! Core library: request parsing, response serialization, path resolution
//! and the per-connection keep-alive state machine.

pub mod config;
pub mod http;
pub mod server;
pub mod static_files;
