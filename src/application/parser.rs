//! Turns freeform request text into a [`RequestDescriptor`].
//!
//! The text is tokenized line by line before anything is interpreted:
//!
//! * the body starts at the first `{` anywhere in the text and runs to the end;
//! * the request line is the first line before the body that reads
//!   `<METHOD>[ <path>][ HTTP/<version>]`;
//! * header lines are `Name: value` lines between the request line and the body.
//!
//! The body is parsed as JSON right away. A body that is not valid JSON fails
//! the whole request, so nothing malformed ever reaches the network.
//!
//! A `{` ahead of the request line (say in a comment such as `# {todo}`) starts
//! the body there; that is reported as a malformed body, not a missing request line.

use crate::domain::entities::{Method, RequestDescriptor};
use crate::domain::errors::QueryError;
use serde_json::Value;
use tracing::debug;

/// The pieces of a request text, before interpretation
#[derive(Debug, PartialEq)]
struct Tokens<'a> {
    request_line: &'a str,
    headers: Vec<(String, String)>,
    body: Option<BodyToken<'a>>,
}

#[derive(Debug, PartialEq)]
struct BodyToken<'a> {
    /// Line breaks before the opening brace
    line: usize,
    text: &'a str,
}

enum State {
    SeekingRequestLine,
    Headers,
}

/// Parses request text into a descriptor
pub fn parse(text: &str) -> Result<RequestDescriptor, QueryError> {
    if text.trim().is_empty() {
        return Err(QueryError::NoRequestLine);
    }

    let tokens = tokenize(text).ok_or_else(|| missing_request_line(text))?;

    let mut parts = tokens.request_line.split_whitespace();
    let method = parts
        .next()
        .and_then(|raw| raw.parse::<Method>().ok())
        .ok_or(QueryError::NoRequestLine)?;
    let (path, query_string) = split_target(parts.next().unwrap_or(""));

    let (body, body_line) = match tokens.body {
        Some(token) => {
            let value = serde_json::from_str::<Value>(token.text)
                .map_err(|e| QueryError::MalformedBody(e.to_string()))?;
            (Some(value), Some(token.line))
        }
        None => (None, None),
    };

    debug!(
        %method,
        path = %path,
        headers = tokens.headers.len(),
        has_body = body.is_some(),
        "parsed request text"
    );

    Ok(RequestDescriptor {
        method,
        path,
        query_string,
        headers: tokens.headers,
        body,
        body_line,
    })
}

fn tokenize(text: &str) -> Option<Tokens<'_>> {
    let body_start = text.find('{');
    let head = match body_start {
        Some(index) => &text[..index],
        None => text,
    };

    let mut state = State::SeekingRequestLine;
    let mut request_line = None;
    let mut headers = Vec::new();

    for line in head.lines() {
        let line = line.trim();
        match state {
            State::SeekingRequestLine => {
                if is_request_line(line) {
                    request_line = Some(line);
                    state = State::Headers;
                }
            }
            State::Headers => {
                if let Some(header) = parse_header(line) {
                    headers.push(header);
                }
            }
        }
    }

    let body = body_start.map(|index| BodyToken {
        line: text[..index].matches('\n').count(),
        text: &text[index..],
    });

    Some(Tokens {
        request_line: request_line?,
        headers,
        body,
    })
}

fn missing_request_line(text: &str) -> QueryError {
    match text.find('{') {
        Some(index) if text[index..].lines().any(|line| is_request_line(line.trim())) => {
            QueryError::MalformedBody("body starts before the request line".to_string())
        }
        _ => QueryError::NoRequestLine,
    }
}

fn is_request_line(line: &str) -> bool {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        [method] | [method, _] => method.parse::<Method>().is_ok(),
        [method, _, version] => method.parse::<Method>().is_ok() && is_http_version(version),
        _ => false,
    }
}

fn is_http_version(token: &str) -> bool {
    let Some(version) = token.strip_prefix("HTTP/") else {
        return false;
    };
    match version.split_once('.') {
        Some((major, minor)) => {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

fn parse_header(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let value = value.trim();
    if name.is_empty()
        || value.is_empty()
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return None;
    }
    Some((name.to_string(), value.to_string()))
}

/// Splits a request target at its first `?`
fn split_target(target: &str) -> (String, String) {
    match target.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (target.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_get_with_query_string() {
        let descriptor = parse("GET /_search?q=foo").unwrap();
        assert_eq!(descriptor.method, Method::Get);
        assert_eq!(descriptor.path, "/_search");
        assert_eq!(descriptor.query_string, "q=foo");
        assert_eq!(descriptor.body, None);
        assert_eq!(descriptor.body_line, None);
    }

    #[test]
    fn test_parse_post_with_body() {
        let descriptor = parse("POST /idx/_doc\n{\"a\":1}").unwrap();
        assert_eq!(descriptor.method, Method::Post);
        assert_eq!(descriptor.path, "/idx/_doc");
        assert_eq!(descriptor.query_string, "");
        assert_eq!(descriptor.body, Some(json!({"a": 1})));
        assert_eq!(descriptor.body_line, Some(1));
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(matches!(parse(""), Err(QueryError::NoRequestLine)));
        assert!(matches!(parse("  \n\t \n"), Err(QueryError::NoRequestLine)));
    }

    #[test]
    fn test_parse_without_request_line() {
        assert!(matches!(
            parse("FETCH /_search\n"),
            Err(QueryError::NoRequestLine)
        ));
        assert!(matches!(
            parse("{\"query\": {}}"),
            Err(QueryError::NoRequestLine)
        ));
    }

    #[test]
    fn test_method_is_uppercased() {
        let descriptor = parse("delete /old-index").unwrap();
        assert_eq!(descriptor.method, Method::Delete);
        assert_eq!(descriptor.method.to_string(), "DELETE");
    }

    #[test]
    fn test_query_split_uses_first_question_mark() {
        let descriptor = parse("GET /_cat/indices?v&h=a?b").unwrap();
        assert_eq!(descriptor.path, "/_cat/indices");
        assert_eq!(descriptor.query_string, "v&h=a?b");
    }

    #[test]
    fn test_missing_path_defaults_to_empty() {
        let descriptor = parse("HEAD").unwrap();
        assert_eq!(descriptor.method, Method::Head);
        assert_eq!(descriptor.path, "");
        assert_eq!(descriptor.query_string, "");
    }

    #[test]
    fn test_request_line_with_http_version() {
        let descriptor = parse("GET /_cluster/health HTTP/1.1").unwrap();
        assert_eq!(descriptor.path, "/_cluster/health");

        assert!(matches!(
            parse("GET /_cluster/health HTTP/one"),
            Err(QueryError::NoRequestLine)
        ));
    }

    #[test]
    fn test_request_line_after_comments() {
        let text = "# cluster checks\n\n  get /_cat/nodes?v  \n";
        let descriptor = parse(text).unwrap();
        assert_eq!(descriptor.method, Method::Get);
        assert_eq!(descriptor.path, "/_cat/nodes");
        assert_eq!(descriptor.query_string, "v");
    }

    #[test]
    fn test_headers_are_collected() {
        let text = "POST /logs/_search\n\
                    Content-Type: application/json\n\
                    X-Opaque-Id: abc\n\n\
                    {\"size\": 0}";
        let descriptor = parse(text).unwrap();
        assert_eq!(
            descriptor.headers,
            vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("X-Opaque-Id".to_string(), "abc".to_string()),
            ]
        );
        assert_eq!(descriptor.body_line, Some(4));
    }

    #[test]
    fn test_body_lines_are_not_headers() {
        let text = "POST /idx/_search\n{\n  \"query\": {\"match_all\": {}}\n}";
        let descriptor = parse(text).unwrap();
        assert!(descriptor.headers.is_empty());
        assert_eq!(descriptor.body, Some(json!({"query": {"match_all": {}}})));
    }

    #[test]
    fn test_body_on_request_line() {
        let descriptor = parse("PUT /idx/_doc/1 {\"title\": \"x\"}").unwrap();
        assert_eq!(descriptor.path, "/idx/_doc/1");
        assert_eq!(descriptor.body, Some(json!({"title": "x"})));
        assert_eq!(descriptor.body_line, Some(0));
    }

    #[test]
    fn test_malformed_body_fails_the_request() {
        let err = parse("POST /idx/_doc\n{\"a\": }").unwrap_err();
        assert!(matches!(err, QueryError::MalformedBody(_)));
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_brace_before_request_line_is_a_malformed_body() {
        let err = parse("# {todo}\nGET /").unwrap_err();
        assert!(matches!(err, QueryError::MalformedBody(ref msg) if msg.contains("before")));
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_is_http_version() {
        assert!(is_http_version("HTTP/1.1"));
        assert!(is_http_version("HTTP/2.0"));
        assert!(!is_http_version("HTTP/2"));
        assert!(!is_http_version("http/1.1"));
    }

    #[test]
    fn test_parse_header_rejects_non_headers() {
        assert_eq!(parse_header("\"query\": {"), None);
        assert_eq!(parse_header("Accept:"), None);
        assert_eq!(
            parse_header("Accept: text/plain"),
            Some(("Accept".to_string(), "text/plain".to_string()))
        );
    }
}
