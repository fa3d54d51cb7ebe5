//! Request-translation gateway for a payments dashboard.
//!
//! Accepts generic HTTP requests (as API Gateway HTTP API events), rewrites
//! them into the shape the upstream payment processor expects and relays the
//! answer back with a uniform error envelope.

pub mod config;
pub mod gateway;
pub mod handler;
pub mod http;
pub mod models;
pub mod utils;
