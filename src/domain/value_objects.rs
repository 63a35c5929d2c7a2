use anyhow::{Result, anyhow};
use hyper::http::Uri;
use serde_json::Value;
use std::fmt;

/// Represents a validated URL
#[derive(Debug, Clone)]
pub struct Url(pub Uri);

impl Url {
    /// Creates a new Url with validation
    ///
    /// # Arguments
    /// * `url` - The URL string to parse
    ///
    /// # Returns
    /// * `Ok(Url)` - Validated URL
    /// * `Err(anyhow::Error)` - If the URL is invalid
    pub fn new(url: &str) -> Result<Self> {
        let uri = url.parse::<Uri>().map_err(|e| anyhow!("Invalid URL: {}", e))?;
        Ok(Url(uri))
    }

    /// Returns the URL as a string
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

/// Serialized JSON request body
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub String);

impl JsonBody {
    pub fn from_value(value: &Value) -> Self {
        JsonBody(value.to_string())
    }
}

/// The `host:port` a workspace sends its requests to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(String);

impl Endpoint {
    pub const DEFAULT: &'static str = "localhost:9200";

    /// Returns `None` for empty or whitespace-only input
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Endpoint(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base URL for the endpoint, adding `http://` unless a scheme is present
    pub fn base_url(&self) -> String {
        let base = if self.0.contains("://") {
            self.0.clone()
        } else {
            format!("http://{}", self.0)
        };
        base.trim_end_matches('/').to_string()
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
