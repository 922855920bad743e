//! Contract error types

use crate::query::ConfigurationError;

/// Page request outside the accepted range
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    /// Pages are numbered from 1
    #[error("invalid page {0}: pages start at 1")]
    InvalidPage(u64),

    /// Only positive sizes, or -1 for every row
    #[error("invalid per_page {0}: expected a positive size or -1 for all rows")]
    InvalidPerPage(i64),
}

/// Payload that cannot become a model instance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid data: {0}")]
pub struct InvalidData(pub String);

/// Service errors reported to callers
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    /// No instance matched the lookup criteria
    #[error("{resource} not found: {criteria}")]
    NotFound {
        /// Resource name (e.g. "song")
        resource: String,
        /// Criteria that matched nothing, in declarative form
        criteria: String,
    },

    /// Criteria or sort directives could not be compiled
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Page window out of range
    #[error(transparent)]
    Pagination(#[from] PaginationError),

    /// Create/update payload rejected
    #[error("Validation error: {message}")]
    Validation {
        /// Validation error message
        message: String,
    },

    /// Storage failure; details are logged, not exposed
    #[error("Internal error")]
    Internal,
}
