//! Typed errors surfaced by the client core.
//!
//! The CLI prints these messages verbatim, so the wording here is the
//! user-facing contract. Flavor detection and record normalization never
//! produce errors — they degrade instead (see [`crate::models`]).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Neither the endpoint file nor a stored preference produced a URL.
    #[error("API URL not configured. Create endpoint.json or run `pix set-url`.")]
    NotConfigured,

    /// The base URL failed structural validation before any request was made.
    #[error("Invalid API URL")]
    InvalidUrl,

    /// Transport-level failure, including timeouts.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server produced something that is not an HTTP response we can read.
    #[error("Invalid response from server")]
    InvalidResponse,

    /// Non-2xx status.
    #[error("HTTP error: {0}")]
    Http(u16),

    /// The payload did not match the expected envelope shape.
    #[error("Failed to decode response: {0}")]
    Decoding(String),

    /// The validation probe succeeded but the body breaks the compatibility
    /// contract (e.g. an empty `version`).
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),

    /// The key-value storage binding failed to read or write.
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify a reqwest failure: body-decode problems are contract errors,
    /// everything else is transport.
    pub(crate) fn from_request(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decoding(err.to_string())
        } else {
            Error::Network(err)
        }
    }
}
