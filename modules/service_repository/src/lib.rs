//! Service Repository
//!
//! Uniform CRUD and pagination over a relational database (SeaORM) and an
//! in-process JSON document store. Lookups, counts and pages are driven by
//! declarative criteria and sort directives, compiled per backend by the
//! [`query`] layer.

// Public exports
pub mod contract;
pub use contract::{InvalidData, Page, PageRequest, PaginationError, PerPage, ServiceError};

pub mod query;
pub use query::{
    ConfigurationError, Direction, FilterNode, Nulls, Operator, QueryCompiler, SortDirective,
};

pub mod config;
pub use config::Config;

pub mod domain;
pub use domain::{Repository, Service};

pub mod infra;
pub use infra::storage::{connect, DocumentRepository, DocumentStore, SeaOrmRepository};
