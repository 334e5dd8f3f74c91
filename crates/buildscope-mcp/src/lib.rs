//! buildscope-mcp library
//!
//! This module exports the core functionality of buildscope-mcp for use in
//! integration tests and as a library.

pub mod config;
pub mod handlers;
pub mod runner;
pub mod server;
pub mod solution;
