//! Domain layer - repository contract, pagination and services

pub mod pagination;
pub mod repository;
pub mod service;

pub use pagination::Window;
pub use repository::Repository;
pub use service::Service;
