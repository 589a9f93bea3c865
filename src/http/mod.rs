//! HTTP client adapter
//!
//! Thin wrapper over reqwest that returns status codes and parsed bodies
//! instead of failing on HTTP-level errors (unless asked to).

mod client;
mod types;

pub use client::HttpClient;
pub use types::{ApiResponse, HttpMethod, RequestOptions};
