use thiserror::Error;

/// Wraps an error the retry loop should never retry — a poison message
/// (fails validation, fails to decode) or a storage error the service layer
/// has already classified as permanent. Short-circuits straight to the DLQ.
#[derive(Error, Debug)]
#[error("non-retriable: {0}")]
pub struct NonRetriableError(#[source] pub anyhow::Error);

impl NonRetriableError {
    pub fn new(err: impl Into<anyhow::Error>) -> Self {
        Self(err.into())
    }
}
