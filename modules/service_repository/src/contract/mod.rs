//! Contract layer - public types shared by repositories and services
//!
//! Transport-agnostic: page requests and results, and the errors a service
//! reports to its callers.

pub mod error;
pub mod model;

pub use error::{InvalidData, PaginationError, ServiceError};
pub use model::{Page, PageRequest, PerPage};
