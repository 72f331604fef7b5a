//! Static file serving.
//!
//! Resolves request targets to files beneath the configured document root,
//! refusing anything that escapes it.

pub mod resolver;

pub use resolver::{Resolution, Resolver};
