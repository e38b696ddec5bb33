//! Error types for the search layer.
//!
//! Three categories, per the error taxonomy of this service:
//!
//! - [`RequestError`]: a problem with the request itself, detected before any
//!   backend call. Client error semantics; never retried.
//! - [`ConfigError`]: a malformed configuration or field table, detected at
//!   startup. Fail fast, never at query time.
//! - Backend/response failures: surfaced as a single opaque server error.
//!   The layer does not distinguish retryable from fatal and never retries.
//!
//! Field-level coercion failures are deliberately *not* errors: the value is
//! dropped, a diagnostic is logged, and the operation continues.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// Result alias used throughout the search layer.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// The primary error type for search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The request cannot be compiled into a backend query.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The service was built from invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backend transport failed (connection, timeout).
    #[error("search backend request failed: {0}")]
    Backend(#[from] elasticsearch::Error),

    /// The backend answered with a non-success status.
    #[error("search backend returned status {status}: {body}")]
    BackendStatus { status: u16, body: String },

    /// The backend answered with a body this layer cannot read.
    #[error("unreadable search backend response: {message}")]
    Response { message: String },
}

/// Compilation errors reported synchronously, before any backend call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// A facet page would require an aggregation larger than the hard ceiling.
    #[error(
        "facet '{facet}' requires an aggregation of {size} buckets, above the maximum of {ceiling}"
    )]
    AggregationTooLarge {
        facet: String,
        size: u64,
        ceiling: u64,
    },

    /// A range value did not split into exactly a lower and an upper bound.
    #[error("malformed range value '{value}': expected 'low,high' with '*' for an open end")]
    MalformedRange { value: String },
}

/// Startup configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A backend node URL could not be parsed.
    #[error("invalid search backend node url '{url}': {message}")]
    InvalidNodeUrl { url: String, message: String },

    /// The backend transport could not be constructed.
    #[error("failed to build search backend transport: {message}")]
    Transport { message: String },

    /// The static field mapping table is malformed.
    #[error("invalid field mapping table: {message}")]
    FieldTable { message: String },

    /// The response reader's field path pattern failed to compile.
    #[error("invalid response field pattern: {message}")]
    ResponsePattern { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_name_the_offender() {
        let err = RequestError::AggregationTooLarge {
            facet: "topics".to_string(),
            size: 2_000_000,
            ceiling: 1_200_000,
        };
        assert!(err.to_string().contains("topics"));
        assert!(err.to_string().contains("1200000"));

        let err = RequestError::MalformedRange {
            value: "1,2,3".to_string(),
        };
        assert!(err.to_string().contains("1,2,3"));
    }
}
