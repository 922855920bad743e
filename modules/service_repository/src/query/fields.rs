//! Field registry: entity field name -> typed accessor
//!
//! Built once per compiler so unknown fields are rejected without reflecting
//! over the entity on every query.

use super::error::ConfigurationError;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct FieldRegistry<F> {
    entity: String,
    fields: HashMap<String, F>,
}

impl<F: Copy> FieldRegistry<F> {
    pub fn new<N: Into<String>>(
        entity: impl Into<String>,
        fields: impl IntoIterator<Item = (N, F)>,
    ) -> Self {
        Self {
            entity: entity.into(),
            fields: fields
                .into_iter()
                .map(|(name, field)| (name.into(), field))
                .collect(),
        }
    }

    /// Resolve a declared field or fail with [`ConfigurationError::UnknownField`].
    pub fn resolve(&self, name: &str) -> Result<F, ConfigurationError> {
        self.fields
            .get(name)
            .copied()
            .ok_or_else(|| ConfigurationError::UnknownField {
                entity: self.entity.clone(),
                field: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
