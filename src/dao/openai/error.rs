use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`CompletionError`] failures.
pub type CompletionResult<T> = Result<T, CompletionError>;

/// Failures of a chat-completion request.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// No API key was configured.
    #[error("completion API key is missing")]
    MissingApiKey,
    /// Building the HTTP client failed.
    #[error("failed to build completion client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent.
    #[error("failed to send completion request")]
    RequestSend {
        #[source]
        source: reqwest::Error,
    },
    /// The API answered with an error status.
    #[error("completion API error {status}: {message}")]
    RequestStatus { status: StatusCode, message: String },
    /// The response body was not the expected JSON.
    #[error("failed to decode completion response")]
    DecodeResponse {
        #[source]
        source: reqwest::Error,
    },
}
