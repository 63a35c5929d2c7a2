use crate::domain::value_objects::Endpoint;
use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

pub const HOST_KEY: &str = "esq.host";
const HOST_PROMPT: &str = "Please enter the search host for this workspace";

/// Key-value persistence scoped to one workspace
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Interactive question with a pre-filled answer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Prompt: Send + Sync {
    /// Returns `None` when the user cancels
    async fn ask(&self, message: &str, prefill: &str) -> Result<Option<String>>;
}

/// Reads, stores and asks for the workspace endpoint
pub struct EndpointResolver {
    store: Box<dyn StateStore>,
    prompt: Box<dyn Prompt>,
}

impl EndpointResolver {
    pub fn new(store: Box<dyn StateStore>, prompt: Box<dyn Prompt>) -> Self {
        Self { store, prompt }
    }

    /// Stored endpoint, or the default when none was ever set
    pub fn get_endpoint(&self) -> Endpoint {
        self.stored().unwrap_or_default()
    }

    /// Stores `value` unless it is blank; returns whether anything was written
    pub fn set_endpoint(&self, value: &str) -> Result<bool> {
        let Some(endpoint) = Endpoint::new(value) else {
            return Ok(false);
        };
        self.store.set(HOST_KEY, endpoint.as_str())?;
        info!(endpoint = %endpoint, "endpoint updated");
        Ok(true)
    }

    /// Asks for an endpoint, pre-filled with the current one.
    ///
    /// A blank or cancelled answer leaves the stored value alone and yields `None`.
    pub async fn prompt_for_endpoint(&self) -> Result<Option<Endpoint>> {
        let current = self.get_endpoint();
        let answer = self.prompt.ask(HOST_PROMPT, current.as_str()).await?;
        match answer.as_deref().and_then(Endpoint::new) {
            Some(endpoint) => {
                self.set_endpoint(endpoint.as_str())?;
                Ok(Some(endpoint))
            }
            None => Ok(None),
        }
    }

    /// Endpoint to send a request to, asking first if none was ever stored
    pub async fn ensure_endpoint(&self) -> Result<Endpoint> {
        if let Some(endpoint) = self.stored() {
            return Ok(endpoint);
        }
        match self.prompt_for_endpoint().await? {
            Some(endpoint) => Ok(endpoint),
            None => {
                warn!("no endpoint entered, using {}", Endpoint::DEFAULT);
                Ok(Endpoint::default())
            }
        }
    }

    fn stored(&self) -> Option<Endpoint> {
        match self.store.get(HOST_KEY) {
            Ok(value) => value.as_deref().and_then(Endpoint::new),
            Err(e) => {
                warn!(error = %e, "failed to read stored endpoint");
                None
            }
        }
    }
}
