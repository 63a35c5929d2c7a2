use crate::domain::entities::{Method, Request, RequestDescriptor};
use crate::domain::value_objects::{Endpoint, JsonBody, Url};
use anyhow::{Result, anyhow};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde_json::Value;

/// Bytes `http::Uri` refuses in a path or query. `%` is absent so existing
/// escapes pass through untouched.
const TARGET_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}')
    .add(b'\\');

/// Binds a parsed request to an endpoint
pub struct RequestBuilder {
    method: Option<Method>,
    url: Option<Url>,
    headers: Vec<(String, String)>,
    body: Option<JsonBody>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            url: None,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Seeds method, URL, headers and body from a descriptor
    pub fn from_descriptor(descriptor: &RequestDescriptor, endpoint: &Endpoint) -> Result<Self> {
        Ok(Self::new()
            .method(descriptor.method)
            .url(&request_url(endpoint, &descriptor.path, &descriptor.query_string))?
            .headers(&descriptor.headers)
            .body(descriptor.body.as_ref()))
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn url(mut self, raw_url: &str) -> Result<Self> {
        self.url = Some(Url::new(raw_url)?);
        Ok(self)
    }

    pub fn headers(mut self, headers: &[(String, String)]) -> Self {
        self.headers.extend(headers.iter().cloned());
        self
    }

    pub fn body(mut self, json: Option<&Value>) -> Self {
        self.body = json.map(JsonBody::from_value);
        self
    }

    pub fn build(self) -> Result<Request> {
        Ok(Request {
            method: self.method.ok_or_else(|| anyhow!("Method is required"))?,
            url: self.url.ok_or_else(|| anyhow!("URL is required"))?,
            headers: self.headers,
            body: self.body,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `http://<endpoint><path>?<query>`, leaving out `?` when the query is empty.
///
/// Path and query are percent-encoded where a URI would reject them.
pub fn request_url(endpoint: &Endpoint, path: &str, query_string: &str) -> String {
    let mut url = endpoint.base_url();
    if !path.is_empty() && !path.starts_with('/') {
        url.push('/');
    }
    url.extend(utf8_percent_encode(path, TARGET_ENCODE_SET));
    if !query_string.is_empty() {
        url.push('?');
        url.extend(utf8_percent_encode(query_string, TARGET_ENCODE_SET));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint() -> Endpoint {
        Endpoint::new("localhost:9200").unwrap()
    }

    #[test]
    fn test_request_url_with_query() {
        assert_eq!(
            request_url(&endpoint(), "/_search", "q=foo"),
            "http://localhost:9200/_search?q=foo"
        );
    }

    #[test]
    fn test_request_url_omits_empty_query() {
        assert_eq!(
            request_url(&endpoint(), "/idx/_doc", ""),
            "http://localhost:9200/idx/_doc"
        );
        assert_eq!(request_url(&endpoint(), "", ""), "http://localhost:9200");
    }

    #[test]
    fn test_request_url_adds_leading_slash() {
        assert_eq!(
            request_url(&endpoint(), "_cat/health", "v"),
            "http://localhost:9200/_cat/health?v"
        );
    }

    #[test]
    fn test_request_url_escapes_phrase_queries() {
        assert_eq!(
            request_url(&endpoint(), "/_search", r#"q=title:"quick brown""#),
            "http://localhost:9200/_search?q=title:%22quick%20brown%22"
        );
        assert!(Url::new(&request_url(&endpoint(), "/_search", r#"q="a"|{b}"#)).is_ok());
    }

    #[test]
    fn test_request_url_keeps_existing_escapes() {
        assert_eq!(
            request_url(&endpoint(), "/_search", "q=tags:[a%20TO%20b]"),
            "http://localhost:9200/_search?q=tags:[a%20TO%20b]"
        );
        assert_eq!(
            request_url(&endpoint(), "/_search", "q=name:müller"),
            "http://localhost:9200/_search?q=name:m%C3%BCller"
        );
    }

    #[test]
    fn test_build_from_descriptor() {
        let descriptor = RequestDescriptor {
            method: Method::Post,
            path: "/idx/_search".to_string(),
            query_string: "size=1".to_string(),
            headers: vec![("X-Opaque-Id".to_string(), "t1".to_string())],
            body: Some(json!({"query": {"match_all": {}}})),
            body_line: Some(1),
        };

        let request = RequestBuilder::from_descriptor(&descriptor, &endpoint())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url.as_str(), "http://localhost:9200/idx/_search?size=1");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(
            request.body,
            Some(JsonBody(r#"{"query":{"match_all":{}}}"#.to_string()))
        );
    }

    #[test]
    fn test_build_requires_method_and_url() {
        assert!(RequestBuilder::new().build().is_err());
        assert!(RequestBuilder::new().method(Method::Get).build().is_err());
    }
}
