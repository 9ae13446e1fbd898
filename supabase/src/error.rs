//! Error types for the PostgREST todo store

use daybook_todos::{RemoteError, RemoteOperation};
use thiserror::Error;

/// Errors that can occur when talking to the todos table
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// A required environment variable is not set
    #[error("Missing {0} environment variable")]
    MissingConfig(&'static str),

    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body could not be parsed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Unauthorized - invalid key or expired access token
    #[error("Unauthorized - invalid key or access token")]
    Unauthorized,

    /// API returned an error
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error body from the API
        message: String,
    },

    /// A write returned no row (nothing matched the filter)
    #[error("No row returned")]
    EmptyResponse,
}

impl SupabaseError {
    /// Wrap as the store-agnostic error the synchronizer understands
    #[must_use]
    pub fn into_remote(self, operation: RemoteOperation) -> RemoteError {
        RemoteError::new(operation, self)
    }
}
