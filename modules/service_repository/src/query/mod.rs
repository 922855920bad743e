//! Filter and sort compiler
//!
//! Translates declarative criteria ([`FilterNode`]) and ordered sort
//! directives ([`SortDirective`]) into backend queries. Compilers are pure:
//! they never execute a query or touch a connection, and every failure is a
//! [`ConfigurationError`] raised before anything reaches storage.
//!
//! - [`RelationalCompiler`] - SeaORM `Select` / `QueryFilter` / `QueryOrder`
//! - [`DocumentCompiler`] - [`DocumentQuery`] evaluated over JSON documents

pub mod criteria;
pub mod document;
pub mod error;
pub mod fields;
pub mod relational;
pub mod sort;

pub use criteria::{FieldFilter, FilterNode, FilterValue, Operator, Scalar, ValueShape};
pub use document::{DocumentCompiler, DocumentModel, DocumentQuery};
pub use error::ConfigurationError;
pub use fields::FieldRegistry;
pub use relational::RelationalCompiler;
pub use sort::{Direction, Nulls, SortDirective};

/// Backend query compiler; the query family going in is the one coming out.
pub trait QueryCompiler: Send + Sync {
    type Query;

    /// Restrict `query` to rows matching `criteria`.
    fn apply_filters(
        &self,
        query: Self::Query,
        criteria: &FilterNode,
    ) -> Result<Self::Query, ConfigurationError>;

    /// Append one ordering clause per directive; empty directives are a no-op.
    fn apply_sort(
        &self,
        query: Self::Query,
        directives: &[SortDirective],
    ) -> Result<Self::Query, ConfigurationError>;
}
