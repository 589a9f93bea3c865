//! Request and response types for the HTTP client adapter

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// HTTP methods the booking service uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Per-request options
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Extra headers, sent in order
    pub headers: Vec<(String, String)>,
    /// JSON body, if any
    pub body: Option<Value>,
    /// Turn a non-2xx status into `Error::UnexpectedStatus`
    pub fail_on_status_code: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            body: None,
            fail_on_status_code: true,
        }
    }
}

impl RequestOptions {
    /// Options that let every status through to the caller
    pub fn tolerant() -> Self {
        Self {
            fail_on_status_code: false,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach an auth token the way the booking service expects it
    ///
    /// An existing `Cookie` header is extended rather than duplicated.
    pub fn token(mut self, token: &str) -> Self {
        let cookie = format!("token={}", token);
        if let Some((_, value)) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case("Cookie"))
        {
            value.push_str("; ");
            value.push_str(&cookie);
            return self;
        }
        self.header("Cookie", cookie)
    }

    pub(crate) fn has_header(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

/// Status code and parsed body of a completed request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse a raw payload: JSON when possible, otherwise the text itself
    pub fn parse_body(raw: &str) -> Value {
        if raw.trim().is_empty() {
            return Value::Null;
        }
        serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
    }
}
