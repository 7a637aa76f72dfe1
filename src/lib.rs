//! Conclave - multi-agent coordination hub
//!
//! HTTP API, WebSocket event stream and server bootstrap over the
//! `conclave-core` services.

#![forbid(unsafe_code)]

pub mod api;
pub mod cli;
pub mod server;
pub mod websocket;
