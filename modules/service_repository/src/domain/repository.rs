//! Repository trait for data access
//!
//! Implementations are in infra/storage: SeaORM for relational engines and
//! an in-process JSON document store.

use crate::contract::{Page, PageRequest};
use crate::query::FilterNode;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Uniform CRUD and pagination over one model type
#[async_trait]
pub trait Repository<M>: Send + Sync {
    /// Build an instance from a JSON object, persist it and return the
    /// stored instance
    async fn create(&self, data: Value) -> Result<M>;

    /// Overwrite the fields present in `changes` and return the stored instance
    async fn update(&self, instance: &M, changes: Value) -> Result<M>;

    /// First instance matching the criteria
    async fn get(&self, criteria: &FilterNode) -> Result<Option<M>>;

    /// Delete the first instance matching the criteria; `false` if none did
    async fn delete(&self, criteria: &FilterNode) -> Result<bool>;

    /// Count instances, optionally restricted by criteria
    async fn count(&self, criteria: Option<&FilterNode>) -> Result<u64>;

    /// Filter, sort and slice
    async fn paginate(&self, request: &PageRequest) -> Result<Page<M>>;
}
