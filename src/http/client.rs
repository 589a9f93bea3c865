//! HTTP client adapter for the booking service
//!
//! Issues a single request per call and hands back status + parsed body.
//! There is no retry and no caching.

use std::time::Duration;

use reqwest::Url;

use crate::common::config::Config;
use crate::common::{Error, Result};

use super::types::{ApiResponse, HttpMethod, RequestOptions};

const USER_AGENT: &str = concat!("booker-e2e/", env!("CARGO_PKG_VERSION"));

/// Client bound to one service base URL
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpClient {
    /// Build a client for `base_url` with the given transport timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|_| Error::InvalidUrl(base_url.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(base_url.to_string()));
        }

        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            inner,
            base_url,
            timeout,
        })
    }

    /// Build a client from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.target.base_url, config.timeouts.request())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a suite path against the base URL
    ///
    /// Absolute URLs pass through untouched. Relative paths are appended to
    /// the base path so a base of `http://host/api` maps `/ping` to
    /// `http://host/api/ping`.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).map_err(|_| Error::InvalidUrl(path.to_string()));
        }

        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = format!("{}/{}", base, path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|_| Error::InvalidUrl(joined))
    }

    /// Send a request and wait for the response
    pub async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let url = self.resolve(path)?;
        let url_str = url.to_string();

        let mut request = self.inner.request(method.into(), url);
        if !options.has_header("Accept") {
            request = request.header("Accept", "application/json");
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            tracing::debug!("{} {} body: {}", method, url_str, body);
            request = request.json(body);
        } else {
            tracing::debug!("{} {}", method, url_str);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(&url_str, e, self.timeout))?;

        let status = response.status().as_u16();
        let raw = response
            .text()
            .await
            .map_err(|e| Error::transport(&url_str, e, self.timeout))?;

        tracing::debug!(status, "{} {} -> {}", method, url_str, raw);

        if options.fail_on_status_code && !(200..300).contains(&status) {
            return Err(Error::unexpected_status(method.as_str(), &url_str, status, &raw));
        }

        Ok(ApiResponse {
            status,
            body: ApiResponse::parse_body(&raw),
        })
    }
}
