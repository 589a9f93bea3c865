//! Booker - end-to-end API suites for the Restful Booker service
//!
//! This library provides an HTTP client adapter, a typed booking API, and a
//! suite runner that sequences dependent requests with explicit per-suite
//! state and structured response assertions.

pub mod booking;
pub mod cli;
pub mod commands;
pub mod common;
pub mod http;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use http::{ApiResponse, HttpClient, HttpMethod, RequestOptions};
