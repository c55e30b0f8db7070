//! Error types for paragraph translation.
//!
//! Provider errors are local to a single paragraph: the controller recovers
//! from them, leaves the original text visible and moves on. Only
//! [`TranslateError::ExtractionEmpty`] is handed back to the caller as a
//! signal to retry extraction later.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::document::NodeId;

/// Why a single endpoint attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    /// The request did not complete within the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure (DNS, refused connection, CORS-style blocks)
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Empty or unparseable response body
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The endpoint refused the request because it needs an API key
    #[error("API key required")]
    AuthRequired,

    /// The endpoint answered with an explicit error field
    #[error("endpoint returned error: {0}")]
    Rejected(String),

    /// The body parsed but carried no translation
    #[error("response contained no translated text")]
    MissingTranslation,

    /// The translation was present but blank
    #[error("translation result is empty")]
    Empty,
}

/// One failed attempt against one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointFailure {
    pub endpoint: String,
    pub cause: FailureCause,
}

impl EndpointFailure {
    pub fn new(endpoint: impl Into<String>, cause: FailureCause) -> Self {
        Self {
            endpoint: endpoint.into(),
            cause,
        }
    }
}

impl fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.cause)
    }
}

fn list_failures(failures: &[EndpointFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("  - {}", failure))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Unified error type for extraction, translation and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// No content container or no qualifying paragraphs (yet)
    #[error("no translatable paragraphs found")]
    ExtractionEmpty,

    /// Caller passed blank text to a provider
    #[error("text to translate is empty")]
    EmptyInput,

    #[error("{endpoint}: request timed out after {timeout:?}")]
    ProviderTimeout { endpoint: String, timeout: Duration },

    #[error("{endpoint}: network error: {message}")]
    ProviderNetwork { endpoint: String, message: String },

    #[error("{endpoint}: HTTP {status}: {body}")]
    ProviderHttp {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("{endpoint}: malformed response: {message}")]
    ProviderMalformedResponse { endpoint: String, message: String },

    /// Explicit refusal from an endpoint (error field, missing API key)
    #[error("{endpoint}: {message}")]
    ProviderRejected { endpoint: String, message: String },

    /// The provider succeeded but the translation was blank after trimming
    #[error("translation result is empty")]
    ProviderEmptyResult,

    /// Every endpoint of a fallback chain failed
    #[error(
        "all {} translation endpoints failed:\n{}",
        .failures.len(),
        list_failures(.failures)
    )]
    ProviderAllEndpointsExhausted { failures: Vec<EndpointFailure> },

    /// The paragraph was removed from the document after extraction
    #[error("render anchor {0} is no longer attached to the document")]
    RenderAttachmentStale(NodeId),

    /// The HTTP client could not be constructed
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

impl From<EndpointFailure> for TranslateError {
    fn from(failure: EndpointFailure) -> Self {
        let EndpointFailure { endpoint, cause } = failure;
        match cause {
            FailureCause::Timeout(timeout) => TranslateError::ProviderTimeout { endpoint, timeout },
            FailureCause::Network(message) => TranslateError::ProviderNetwork { endpoint, message },
            FailureCause::Http { status, body } => TranslateError::ProviderHttp {
                endpoint,
                status,
                body,
            },
            FailureCause::Malformed(message) => {
                TranslateError::ProviderMalformedResponse { endpoint, message }
            }
            FailureCause::MissingTranslation => TranslateError::ProviderMalformedResponse {
                endpoint,
                message: FailureCause::MissingTranslation.to_string(),
            },
            cause @ (FailureCause::AuthRequired | FailureCause::Rejected(_)) => {
                TranslateError::ProviderRejected {
                    endpoint,
                    message: cause.to_string(),
                }
            }
            FailureCause::Empty => TranslateError::ProviderEmptyResult,
        }
    }
}

/// Result type for translation operations
pub type TranslateResult<T> = Result<T, TranslateError>;
