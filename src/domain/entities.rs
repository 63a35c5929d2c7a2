use crate::domain::value_objects::{JsonBody, Url};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Local};
use hyper::StatusCode;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// HTTP methods a request line may start with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl FromStr for Method {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            other => Err(anyhow!("Unsupported HTTP method: '{}'", other)),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request as written by the user, before it is bound to an endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query_string: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Line breaks preceding the body's opening brace in the source text
    pub body_line: Option<usize>,
}

/// Represents an outgoing HTTP request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>, // Key-value pairs for headers
    pub body: Option<JsonBody>,
}

/// Represents an HTTP response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub body: String,
}

/// Outcome of one completed request/response cycle
#[derive(Debug, Clone)]
pub struct ResponseReport {
    pub requested_at: DateTime<Local>,
    pub elapsed_ms: u128,
    pub status: StatusCode,
    pub rendered_body: String,
}
