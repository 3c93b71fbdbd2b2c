use thiserror::Error;

/// Error type shared by every fallible operation in this crate.
///
/// Driver errors are mapped into the matching variant at each seam rather
/// than carried transparently, so callers can branch on the failure class
/// (bad input vs. backend failure) without knowing which driver produced it.
#[derive(Debug, Error)]
pub enum SqlConnectorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Data source not found: {0}")]
    NotFound(String),

    #[error("Data source is disabled: {0}")]
    Disabled(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),
}

impl SqlConnectorError {
    /// Whether this failure is attributable to caller input rather than the
    /// backend. HTTP layers use this to pick a 4xx status family.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            SqlConnectorError::ConfigError(_)
                | SqlConnectorError::QueryError(_)
                | SqlConnectorError::NotFound(_)
                | SqlConnectorError::Disabled(_)
        )
    }
}
