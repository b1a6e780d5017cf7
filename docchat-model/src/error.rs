//! Error types for the `docchat-model` crate.

use thiserror::Error;

/// Errors that can occur while talking to a chat model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The HTTP request could not be sent or the connection failed.
    #[error("Request error ({provider}): {message}")]
    Request {
        /// The chat provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The provider rejected the request.
    #[error("API error ({provider}): {message}")]
    Api {
        /// The chat provider that produced the error.
        provider: String,
        /// Machine-readable error code, when the provider sends one.
        code: Option<String>,
        /// Error detail extracted from the response body.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Decode error ({provider}): {message}")]
    Decode {
        /// The chat provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A streaming response failed part-way through.
    #[error("Stream error ({provider}): {message}")]
    Stream {
        /// The chat provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The model was configured incorrectly.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for chat model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
