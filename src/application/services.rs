use crate::application::dispatcher::Dispatcher;
use crate::application::endpoint::EndpointResolver;
use crate::application::formatter::format_report;
use crate::application::parser;
use crate::application::results::ResultsSink;
use crate::domain::entities::{Request, Response, ResponseReport};
use crate::domain::value_objects::Endpoint;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Trait for HTTP clients to enable mocking and dependency inversion
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response>;
}

/// Application service running one query from text to published report
pub struct QueryService {
    dispatcher: Dispatcher,
    endpoints: EndpointResolver,
    results: Arc<ResultsSink>,
}

impl QueryService {
    pub fn new(
        http_client: Box<dyn HttpClient>,
        endpoints: EndpointResolver,
        results: Arc<ResultsSink>,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(http_client),
            endpoints,
            results,
        }
    }

    pub fn endpoints(&self) -> &EndpointResolver {
        &self.endpoints
    }

    pub fn results(&self) -> &Arc<ResultsSink> {
        &self.results
    }

    /// Parses, sends and publishes a request.
    ///
    /// Parse failures happen before the endpoint is resolved, so they never
    /// prompt and never touch the network. Failures leave the results untouched.
    pub async fn execute(&self, text: &str, endpoint: Option<Endpoint>) -> Result<ResponseReport> {
        let descriptor = parser::parse(text)
            .inspect_err(|e| warn!(error = %e, "rejected request text"))?;

        let endpoint = match endpoint {
            Some(endpoint) => endpoint,
            None => self.endpoints.ensure_endpoint().await?,
        };

        let report = self.dispatcher.dispatch(&descriptor, &endpoint).await?;
        self.results.publish(format_report(&report));
        Ok(report)
    }
}
