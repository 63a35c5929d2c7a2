use thiserror::Error;

/// Failures a query can end in before a report is produced
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Unable to parse query: no request line found")]
    NoRequestLine,
    #[error("Unable to parse query: malformed JSON body: {0}")]
    MalformedBody(String),
    #[error("{0}")]
    Dispatch(String),
}

impl QueryError {
    /// True when the request never left the parser
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, QueryError::NoRequestLine | QueryError::MalformedBody(_))
    }
}
