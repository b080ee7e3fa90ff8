use thiserror::Error;

/// Failure talking to the message provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Errors surfaced to callers of the mailbox operations.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("not authenticated: no access credential available")]
    Unauthenticated,
    #[error("failed to list messages: {0}")]
    Listing(#[source] ProviderError),
    #[error("missing required field `{field}`")]
    Validation { field: &'static str },
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub type Result<T, E = MailError> = std::result::Result<T, E>;
