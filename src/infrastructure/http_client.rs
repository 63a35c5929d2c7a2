use crate::application::services::HttpClient;
use crate::domain::entities::{Method as DomainMethod, Request, Response};
use crate::domain::value_objects::{JsonBody, Url};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use hyper::{Method, Request as HyperRequest};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

/// Infrastructure implementation of HttpClient using Hyper
/// This is a low-level HTTP transport that the dispatcher uses
pub struct HyperHttpClient {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HyperHttpClient {
    pub fn new() -> Self {
        let connector = HttpConnector::new();
        let client = Client::builder(TokioExecutor::new())
            .build::<HttpConnector, Full<Bytes>>(connector);
        Self { client }
    }
}

impl Default for HyperHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for HyperHttpClient {
    async fn send(&self, request: Request) -> Result<Response> {
        let hyper_request = RequestAdapter::to_hyper_request(request)?;
        let hyper_response = self.execute_http_request(hyper_request).await?;
        ResponseAdapter::to_domain_response(hyper_response).await
    }
}

impl HyperHttpClient {
    async fn execute_http_request(
        &self,
        request: HyperRequest<Full<Bytes>>,
    ) -> Result<hyper::Response<hyper::body::Incoming>> {
        self.client
            .request(request)
            .await
            .context("HTTP request execution failed")
    }
}

/// Adapter for converting domain requests to Hyper requests
struct RequestAdapter;

impl RequestAdapter {
    fn to_hyper_request(domain_request: Request) -> Result<HyperRequest<Full<Bytes>>> {
        let method = MethodAdapter::to_hyper_method(domain_request.method);
        let uri = UriAdapter::to_hyper_uri(&domain_request.url);
        let body = BodyAdapter::to_hyper_body(&domain_request.body);

        let mut builder = HyperRequest::builder()
            .method(method)
            .uri(uri);

        builder = HeaderAdapter::add_user_headers(builder, &domain_request.headers)?;
        builder = HeaderAdapter::add_json_content_type(
            builder,
            &domain_request.headers,
            &domain_request.body,
        );

        builder.body(body)
            .map_err(|e| anyhow!("Failed to build HTTP request: {}", e))
    }
}

/// Adapter for converting domain responses from Hyper responses
struct ResponseAdapter;

impl ResponseAdapter {
    async fn to_domain_response(
        hyper_response: hyper::Response<hyper::body::Incoming>,
    ) -> Result<Response> {
        let status = hyper_response.status();
        let body = Self::extract_response_body(hyper_response).await?;

        Ok(Response { status, body })
    }

    async fn extract_response_body(
        response: hyper::Response<hyper::body::Incoming>,
    ) -> Result<String> {
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| anyhow!("Failed to read response body: {}", e))?
            .to_bytes();

        Ok(String::from_utf8_lossy(&body_bytes).into_owned())
    }
}

/// Adapter for converting domain HTTP methods to Hyper methods
struct MethodAdapter;

impl MethodAdapter {
    fn to_hyper_method(domain_method: DomainMethod) -> Method {
        match domain_method {
            DomainMethod::Get => Method::GET,
            DomainMethod::Post => Method::POST,
            DomainMethod::Put => Method::PUT,
            DomainMethod::Delete => Method::DELETE,
            DomainMethod::Patch => Method::PATCH,
            DomainMethod::Head => Method::HEAD,
            DomainMethod::Options => Method::OPTIONS,
        }
    }
}

/// Adapter for converting domain URLs to Hyper URIs
struct UriAdapter;

impl UriAdapter {
    fn to_hyper_uri(domain_url: &Url) -> &hyper::Uri {
        &domain_url.0
    }
}

/// Adapter for converting domain request bodies to Hyper bodies
struct BodyAdapter;

impl BodyAdapter {
    fn to_hyper_body(domain_body: &Option<JsonBody>) -> Full<Bytes> {
        match domain_body {
            Some(json_body) => Full::new(Bytes::from(json_body.0.clone())),
            None => Full::new(Bytes::new()),
        }
    }
}

/// Adapter for handling HTTP headers
struct HeaderAdapter;

impl HeaderAdapter {
    fn add_user_headers(
        mut builder: http::request::Builder,
        headers: &[(String, String)],
    ) -> Result<http::request::Builder> {
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| anyhow!("Invalid header name '{}': {}", name, e))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| anyhow!("Invalid value for header '{}': {}", name, e))?;
            builder = builder.header(name, value);
        }
        Ok(builder)
    }

    fn add_json_content_type(
        builder: http::request::Builder,
        headers: &[(String, String)],
        body: &Option<JsonBody>,
    ) -> http::request::Builder {
        let has_content_type = headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));

        if body.is_some() && !has_content_type {
            builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        } else {
            builder
        }
    }
}
