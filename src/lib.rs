//! Chunkforge - video chunking service
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod jobs;
pub mod registry;
pub mod server;
