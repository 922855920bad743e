//! Domain service - delegates to a repository and maps its failures

use super::repository::Repository;
use crate::contract::{InvalidData, Page, PageRequest, PaginationError, ServiceError};
use crate::query::{ConfigurationError, FilterNode};
use serde_json::Value;
use std::sync::Arc;

/// Service over one model type, backed by any repository
pub struct Service<M> {
    resource: &'static str,
    repository: Arc<dyn Repository<M>>,
}

impl<M> Clone for Service<M> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource,
            repository: self.repository.clone(),
        }
    }
}

impl<M: Send + Sync> Service<M> {
    /// Create a new service instance; `resource` names the model in errors
    pub fn new(resource: &'static str, repository: Arc<dyn Repository<M>>) -> Self {
        Self {
            resource,
            repository,
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub async fn create(&self, data: Value) -> Result<M, ServiceError> {
        self.repository
            .create(data)
            .await
            .map_err(|e| self.map_error("create", e))
    }

    pub async fn update(&self, instance: &M, changes: Value) -> Result<M, ServiceError> {
        self.repository
            .update(instance, changes)
            .await
            .map_err(|e| self.map_error("update", e))
    }

    pub async fn get(&self, criteria: &FilterNode) -> Result<Option<M>, ServiceError> {
        self.repository
            .get(criteria)
            .await
            .map_err(|e| self.map_error("get", e))
    }

    pub async fn get_or_not_found(&self, criteria: &FilterNode) -> Result<M, ServiceError> {
        self.get(criteria)
            .await?
            .ok_or_else(|| self.not_found(criteria))
    }

    /// Look up an instance and apply `changes`, failing if none matches
    pub async fn update_or_not_found(
        &self,
        criteria: &FilterNode,
        changes: Value,
    ) -> Result<M, ServiceError> {
        let instance = self.get_or_not_found(criteria).await?;
        self.update(&instance, changes).await
    }

    pub async fn delete(&self, criteria: &FilterNode) -> Result<bool, ServiceError> {
        self.repository
            .delete(criteria)
            .await
            .map_err(|e| self.map_error("delete", e))
    }

    pub async fn delete_or_not_found(&self, criteria: &FilterNode) -> Result<(), ServiceError> {
        if self.delete(criteria).await? {
            Ok(())
        } else {
            Err(self.not_found(criteria))
        }
    }

    pub async fn count(&self, criteria: Option<&FilterNode>) -> Result<u64, ServiceError> {
        self.repository
            .count(criteria)
            .await
            .map_err(|e| self.map_error("count", e))
    }

    pub async fn paginate(&self, request: &PageRequest) -> Result<Page<M>, ServiceError> {
        self.repository
            .paginate(request)
            .await
            .map_err(|e| self.map_error("paginate", e))
    }

    fn not_found(&self, criteria: &FilterNode) -> ServiceError {
        ServiceError::NotFound {
            resource: self.resource.to_string(),
            criteria: criteria.to_string(),
        }
    }

    /// Caller mistakes keep their type; anything else is a storage failure.
    fn map_error(&self, operation: &'static str, error: anyhow::Error) -> ServiceError {
        if let Some(e) = error.downcast_ref::<ConfigurationError>() {
            return ServiceError::Configuration(e.clone());
        }
        if let Some(e) = error.downcast_ref::<PaginationError>() {
            return ServiceError::Pagination(e.clone());
        }
        if let Some(e) = error.downcast_ref::<InvalidData>() {
            return ServiceError::Validation {
                message: e.0.clone(),
            };
        }

        tracing::error!(
            resource = self.resource,
            operation,
            error = ?error,
            "Repository operation failed"
        );
        ServiceError::Internal
    }
}
