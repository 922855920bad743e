//! Configuration errors raised while compiling criteria and sort directives

use super::criteria::{Operator, ValueShape};

/// Caller supplied criteria or sort directives that cannot be compiled.
///
/// Raised before anything is sent to storage. Never retryable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// Field is not declared on the entity
    #[error("unknown field '{field}' on entity '{entity}'")]
    UnknownField { entity: String, field: String },

    /// Operator is not in the recognized set
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    /// Value does not have the shape the operator requires
    #[error("operator '{op}' on field '{field}' expects {expected}")]
    ValueShape {
        field: String,
        op: Operator,
        expected: ValueShape,
    },

    /// `and` / `or` node without children
    #[error("'{0}' combinator requires at least one child")]
    EmptyComposite(&'static str),

    /// Criteria mapping does not match any known node form
    #[error("malformed criteria: {0}")]
    MalformedCriteria(String),

    /// Sort direction is neither `asc` nor `desc`
    #[error("unknown sort direction '{0}'")]
    UnknownDirection(String),

    /// Sort directive is not a `{field, direction}` mapping
    #[error("malformed sort directive: {0}")]
    MalformedSort(String),
}
