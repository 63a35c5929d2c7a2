use crate::application::builders::request_builder::RequestBuilder;
use crate::application::services::HttpClient;
use crate::domain::entities::{RequestDescriptor, ResponseReport};
use crate::domain::errors::QueryError;
use crate::domain::value_objects::Endpoint;
use chrono::Local;
use hyper::StatusCode;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sends descriptors over HTTP and turns the answers into reports
pub struct Dispatcher {
    http_client: Box<dyn HttpClient>,
}

impl Dispatcher {
    pub fn new(http_client: Box<dyn HttpClient>) -> Self {
        Self { http_client }
    }

    pub async fn dispatch(
        &self,
        descriptor: &RequestDescriptor,
        endpoint: &Endpoint,
    ) -> Result<ResponseReport, QueryError> {
        let request = RequestBuilder::from_descriptor(descriptor, endpoint)
            .and_then(RequestBuilder::build)
            .map_err(|e| QueryError::Dispatch(e.to_string()))?;

        info!(method = %request.method, url = %request.url.as_str(), "dispatching request");

        let requested_at = Local::now();
        let started = Instant::now();
        let result = self.http_client.send(request).await;
        let elapsed_ms = started.elapsed().as_millis();

        let response = result.map_err(|e| {
            warn!(error = %format!("{e:#}"), elapsed_ms = elapsed_ms as u64, "request failed");
            QueryError::Dispatch(format!("{e:#}"))
        })?;

        debug!(status = %response.status, elapsed_ms = elapsed_ms as u64, "response received");

        let rendered_body = render_body(&response.body, response.status, descriptor.body_line);

        Ok(ResponseReport {
            requested_at,
            elapsed_ms,
            status: response.status,
            rendered_body,
        })
    }
}

/// Pretty-prints JSON bodies and passes everything else through.
///
/// On a 400 for a request that carried a body, `"line"` fields in the answer
/// are shifted by `body_line` so they point into the request text.
pub fn render_body(body: &str, status: StatusCode, body_line: Option<usize>) -> String {
    let Ok(mut value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };

    if status == StatusCode::BAD_REQUEST {
        if let Some(offset) = body_line {
            let remapped = remap_lines(&mut value, offset as u64);
            debug!(remapped, offset, "remapped error line numbers");
        }
    }

    serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string())
}

/// Adds `offset` to every numeric `"line"` field, returning how many changed
fn remap_lines(value: &mut Value, offset: u64) -> usize {
    match value {
        Value::Object(map) => {
            let mut count = 0;
            for (key, field) in map.iter_mut() {
                if key == "line" {
                    if let Some(line) = field.as_u64() {
                        *field = Value::from(line + offset);
                        count += 1;
                        continue;
                    }
                }
                count += remap_lines(field, offset);
            }
            count
        }
        Value::Array(items) => items.iter_mut().map(|item| remap_lines(item, offset)).sum(),
        _ => 0,
    }
}
