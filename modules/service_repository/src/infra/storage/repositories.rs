//! SeaORM repository implementation

use super::{into_object, log_outcome};
use crate::config::Config;
use crate::contract::{InvalidData, Page, PageRequest};
use crate::domain::{Repository, Window};
use crate::query::{FilterNode, QueryCompiler, RelationalCompiler};
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::sea_query::ColumnType;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, IdenStatic, IntoActiveModel, Iterable, PaginatorTrait, QuerySelect, TryIntoModel,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Repository over one SeaORM entity.
///
/// Models travel as JSON on create/update, so the entity's `Model` must
/// derive `Serialize` and `Deserialize`.
pub struct SeaOrmRepository<E: EntityTrait> {
    db: Arc<DatabaseConnection>,
    compiler: RelationalCompiler<E>,
    config: Config,
}

impl<E: EntityTrait> SeaOrmRepository<E> {
    pub fn new(db: Arc<DatabaseConnection>, config: Config) -> Self {
        let compiler = RelationalCompiler::for_backend(db.get_database_backend());
        Self {
            db,
            compiler,
            config,
        }
    }

    pub fn compiler(&self) -> &RelationalCompiler<E> {
        &self.compiler
    }

    fn name(&self) -> &str {
        self.compiler.fields().entity()
    }
}

impl<E> SeaOrmRepository<E>
where
    E: EntityTrait,
    E::Model: Serialize + DeserializeOwned + IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E>
        + ActiveModelBehavior
        + TryIntoModel<E::Model>
        + Send
        + Sync,
{
    /// Build an insertable model from a partial payload.
    ///
    /// Absent columns get a typed placeholder so the payload
    /// deserializes as a whole `Model`, then go back to `NotSet` so the
    /// database fills them (auto-increment keys, defaults).
    fn active_from_payload(mut data: Map<String, Value>) -> Result<E::ActiveModel> {
        let absent: Vec<E::Column> = E::Column::iter()
            .filter(|column| !data.contains_key(column.as_str()))
            .collect();
        for column in &absent {
            if let Some(value) = placeholder(column.def().get_column_type()) {
                data.insert(column.as_str().to_owned(), value);
            }
        }

        let mut active = <E::ActiveModel as ActiveModelTrait>::from_json(Value::Object(data))
            .map_err(|e| InvalidData(e.to_string()))?;
        for column in absent {
            active.not_set(column);
        }
        Ok(active)
    }

    async fn insert(&self, data: Value) -> Result<E::Model> {
        let active = Self::active_from_payload(into_object(data, "create")?)?;
        Ok(E::insert(active).exec_with_returning(&*self.db).await?)
    }

    async fn save(&self, instance: &E::Model, changes: Value) -> Result<E::Model> {
        let changes = into_object(changes, "update")?;

        let mut merged = serde_json::to_value(instance)?;
        if let Value::Object(fields) = &mut merged {
            for (key, value) in changes {
                if fields.contains_key(&key) {
                    fields.insert(key, value);
                }
            }
        }

        let active = <E::ActiveModel as ActiveModelTrait>::from_json(merged)
            .map_err(|e| InvalidData(e.to_string()))?;
        Ok(E::update(active).exec(&*self.db).await?)
    }

    async fn find_one(&self, criteria: &FilterNode) -> Result<Option<E::Model>> {
        let query = self.compiler.apply_filters(E::find(), criteria)?;
        Ok(query.one(&*self.db).await?)
    }

    async fn delete_one(&self, criteria: &FilterNode) -> Result<bool> {
        let Some(model) = self.find_one(criteria).await? else {
            return Ok(false);
        };
        let active: E::ActiveModel = model.into_active_model();
        let result = E::delete(active).exec(&*self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn count_matching(&self, criteria: Option<&FilterNode>) -> Result<u64> {
        let mut query = E::find();
        if let Some(criteria) = criteria {
            query = self.compiler.apply_filters(query, criteria)?;
        }
        Ok(query.count(&*self.db).await?)
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<E::Model>> {
        let window = Window::resolve(request.page, request.per_page, &self.config)?;

        let mut query = E::find();
        if let Some(filter) = &request.filter {
            query = self.compiler.apply_filters(query, filter)?;
        }
        let query = self.compiler.apply_sort(query, &request.sort)?;

        let total = query.clone().count(&*self.db).await?;
        // SQLite rejects OFFSET without LIMIT
        let items = match window.limit {
            Some(limit) => {
                query
                    .offset(window.offset)
                    .limit(limit)
                    .all(&*self.db)
                    .await?
            }
            None => query.all(&*self.db).await?,
        };

        Ok(window.page_of(items, total))
    }
}

/// Stand-in JSON for a column missing from a create payload; `None` for
/// types without an obvious zero value (the payload must then carry them).
fn placeholder(column_type: &ColumnType) -> Option<Value> {
    let value = match column_type {
        ColumnType::TinyInteger
        | ColumnType::SmallInteger
        | ColumnType::Integer
        | ColumnType::BigInteger
        | ColumnType::TinyUnsigned
        | ColumnType::SmallUnsigned
        | ColumnType::Unsigned
        | ColumnType::BigUnsigned => json!(0),
        ColumnType::Float | ColumnType::Double => json!(0.0),
        ColumnType::Decimal(_) | ColumnType::Money(_) => json!("0"),
        ColumnType::Boolean => json!(false),
        ColumnType::Char(_) | ColumnType::String(_) | ColumnType::Text => json!(""),
        ColumnType::Uuid => json!(uuid::Uuid::nil()),
        _ => return None,
    };
    Some(value)
}

#[async_trait]
impl<E> Repository<E::Model> for SeaOrmRepository<E>
where
    E: EntityTrait,
    E::Model: Serialize + DeserializeOwned + IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E>
        + ActiveModelBehavior
        + TryIntoModel<E::Model>
        + Send
        + Sync,
{
    async fn create(&self, data: Value) -> Result<E::Model> {
        tracing::info!(repository = self.name(), data = %data, "Starting create");
        log_outcome(self.name(), "create", self.insert(data).await)
    }

    async fn update(&self, instance: &E::Model, changes: Value) -> Result<E::Model> {
        tracing::info!(repository = self.name(), changes = %changes, "Starting update");
        log_outcome(self.name(), "update", self.save(instance, changes).await)
    }

    async fn get(&self, criteria: &FilterNode) -> Result<Option<E::Model>> {
        tracing::info!(repository = self.name(), criteria = %criteria, "Starting get");
        log_outcome(self.name(), "get", self.find_one(criteria).await)
    }

    async fn delete(&self, criteria: &FilterNode) -> Result<bool> {
        tracing::info!(repository = self.name(), criteria = %criteria, "Starting delete");
        log_outcome(self.name(), "delete", self.delete_one(criteria).await)
    }

    async fn count(&self, criteria: Option<&FilterNode>) -> Result<u64> {
        tracing::info!(repository = self.name(), criteria = ?criteria.map(ToString::to_string), "Starting count");
        log_outcome(self.name(), "count", self.count_matching(criteria).await)
    }

    async fn paginate(&self, request: &PageRequest) -> Result<Page<E::Model>> {
        tracing::info!(
            repository = self.name(),
            page = request.page,
            per_page = ?request.per_page,
            filter = ?request.filter.as_ref().map(ToString::to_string),
            sort = request.sort.len(),
            "Starting paginate"
        );
        let result = self.fetch_page(request).await;
        if let Ok(page) = &result {
            tracing::debug!(
                repository = self.name(),
                items = page.items.len(),
                num_pages = page.num_pages,
                total = page.total,
                "Page fetched"
            );
        }
        log_outcome(self.name(), "paginate", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::StringLen;

    #[test]
    fn placeholders_match_column_types() {
        assert_eq!(placeholder(&ColumnType::Integer), Some(json!(0)));
        assert_eq!(placeholder(&ColumnType::Boolean), Some(json!(false)));
        assert_eq!(placeholder(&ColumnType::String(StringLen::None)), Some(json!("")));
        assert_eq!(placeholder(&ColumnType::Double), Some(json!(0.0)));
        assert_eq!(placeholder(&ColumnType::Json), None);
    }
}
