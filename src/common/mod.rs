//! Common utilities shared across market data clients
//!
//! - HTTP transport with retry and exponential backoff

pub mod http;

pub use http::{HttpClient, TransportConfig, TransportError};
