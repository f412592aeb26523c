//! Courier Agent API Library Crate
//!
//! This library contains the server boundary of an agent process: its
//! configuration, shared state, HTTP handlers and routing. The `agent` binary
//! is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
