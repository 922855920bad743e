//! Storage layer - repository implementations and connection setup

pub mod document_store;
pub mod repositories;

pub use document_store::{DocumentRepository, DocumentStore};
pub use repositories::SeaOrmRepository;

use crate::config::Config;
use crate::contract::InvalidData;
use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Open the relational connection named by `database_url`.
pub async fn connect(config: &Config) -> Result<Arc<DatabaseConnection>> {
    let url = config
        .database_url
        .as_deref()
        .context("database_url is not configured")?;

    let mut options = ConnectOptions::new(url.to_owned());
    options.sqlx_logging(false);
    if let Some(max_connections) = config.max_connections {
        options.max_connections(max_connections);
    }

    let db = Database::connect(options).await?;
    tracing::info!(
        backend = ?db.get_database_backend(),
        "Database connection established"
    );
    Ok(Arc::new(db))
}

/// Create/update payloads must be JSON objects.
fn into_object(data: Value, operation: &str) -> Result<Map<String, Value>, InvalidData> {
    match data {
        Value::Object(map) => Ok(map),
        other => Err(InvalidData(format!(
            "{operation} expects a JSON object, got {other}"
        ))),
    }
}

/// Log the outcome of a repository operation and pass it through.
fn log_outcome<T>(repository: &str, operation: &'static str, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => tracing::info!(repository, operation, "Repository operation succeeded"),
        Err(error) => tracing::error!(
            repository,
            operation,
            error = %error,
            "Repository operation failed"
        ),
    }
    result
}
