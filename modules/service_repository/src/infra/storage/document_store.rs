//! In-process document store and its repository
//!
//! Collections hold JSON documents in insertion order, which is the
//! store's default (unsorted) result order.

use super::{into_object, log_outcome};
use crate::config::Config;
use crate::contract::{InvalidData, Page, PageRequest};
use crate::domain::{Repository, Window};
use crate::query::{DocumentCompiler, DocumentModel, DocumentQuery, FilterNode, QueryCompiler};
use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// Attribute stamped on every update when the model declares it
const UPDATED_AT: &str = "updated_at";

/// Named collections of JSON documents
#[derive(Debug, Default)]
pub struct DocumentStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection (0 if it does not exist)
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    pub fn drop_collection(&self, collection: &str) {
        self.collections.write().remove(collection);
    }
}

/// Repository over one document model
pub struct DocumentRepository<M: DocumentModel> {
    store: Arc<DocumentStore>,
    compiler: DocumentCompiler,
    config: Config,
    _model: PhantomData<fn() -> M>,
}

impl<M: DocumentModel> DocumentRepository<M> {
    pub fn new(store: Arc<DocumentStore>, config: Config) -> Self {
        Self {
            store,
            compiler: DocumentCompiler::for_model::<M>(),
            config,
            _model: PhantomData,
        }
    }

    pub fn compiler(&self) -> &DocumentCompiler {
        &self.compiler
    }

    fn compile(&self, criteria: Option<&FilterNode>) -> Result<DocumentQuery> {
        let query = DocumentQuery::new();
        Ok(match criteria {
            Some(criteria) => self.compiler.apply_filters(query, criteria)?,
            None => query,
        })
    }

    /// Round-trip through the model so stored documents carry its defaults.
    fn normalize(doc: Value) -> Result<(M, Value)> {
        let model: M = serde_json::from_value(doc).map_err(|e| InvalidData(e.to_string()))?;
        let doc = serde_json::to_value(&model)?;
        Ok((model, doc))
    }

    fn insert(&self, data: Value) -> Result<M> {
        let mut data = into_object(data, "create")?;
        data.entry(M::ID_FIELD)
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        let (model, doc) = Self::normalize(Value::Object(data))?;

        let mut collections = self.store.collections.write();
        let documents = collections.entry(M::COLLECTION.to_string()).or_default();
        let id = &doc[M::ID_FIELD];
        if documents.iter().any(|d| &d[M::ID_FIELD] == id) {
            bail!("duplicate {} {id} in collection '{}'", M::ID_FIELD, M::COLLECTION);
        }
        documents.push(doc);

        Ok(model)
    }

    fn save(&self, instance: &M, changes: Value) -> Result<M> {
        let changes = into_object(changes, "update")?;
        let current = serde_json::to_value(instance)?;
        let id = current[M::ID_FIELD].clone();

        let mut collections = self.store.collections.write();
        let Some(stored) = collections
            .get_mut(M::COLLECTION)
            .and_then(|docs| docs.iter_mut().find(|d| d[M::ID_FIELD] == id))
        else {
            bail!("document {id} not found in collection '{}'", M::COLLECTION);
        };

        let mut merged = stored.clone();
        if let Value::Object(fields) = &mut merged {
            for (key, value) in changes {
                if key != M::ID_FIELD && M::FIELDS.contains(&key.as_str()) {
                    fields.insert(key, value);
                }
            }
            if M::FIELDS.contains(&UPDATED_AT) {
                fields.insert(
                    UPDATED_AT.to_string(),
                    Value::String(chrono::Utc::now().to_rfc3339()),
                );
            }
        }

        let (model, doc) = Self::normalize(merged)?;
        *stored = doc;
        Ok(model)
    }

    fn find_one(&self, criteria: &FilterNode) -> Result<Option<M>> {
        let query = self.compile(Some(criteria))?;
        let found = self
            .store
            .collections
            .read()
            .get(M::COLLECTION)
            .and_then(|docs| docs.iter().find(|d| query.matches(d)).cloned());

        found
            .map(|doc| serde_json::from_value(doc).map_err(Into::into))
            .transpose()
    }

    fn delete_one(&self, criteria: &FilterNode) -> Result<bool> {
        let query = self.compile(Some(criteria))?;
        let mut collections = self.store.collections.write();
        let Some(documents) = collections.get_mut(M::COLLECTION) else {
            return Ok(false);
        };
        match documents.iter().position(|d| query.matches(d)) {
            Some(index) => {
                documents.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn count_matching(&self, criteria: Option<&FilterNode>) -> Result<u64> {
        let query = self.compile(criteria)?;
        let count = self
            .store
            .collections
            .read()
            .get(M::COLLECTION)
            .map_or(0, |docs| docs.iter().filter(|d| query.matches(d)).count());
        Ok(count as u64)
    }

    fn fetch_page(&self, request: &PageRequest) -> Result<Page<M>> {
        let window = Window::resolve(request.page, request.per_page, &self.config)?;
        let query = self.compile(request.filter.as_ref())?;
        let query = self.compiler.apply_sort(query, &request.sort)?;

        let mut matched: Vec<Value> = self
            .store
            .collections
            .read()
            .get(M::COLLECTION)
            .map(|docs| docs.iter().filter(|d| query.matches(d)).cloned().collect())
            .unwrap_or_default();
        query.sort(&mut matched);

        let total = matched.len() as u64;
        let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
        let limit = window
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        let items = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(serde_json::from_value)
            .collect::<Result<Vec<M>, _>>()?;

        Ok(window.page_of(items, total))
    }
}

#[async_trait]
impl<M: DocumentModel> Repository<M> for DocumentRepository<M> {
    async fn create(&self, data: Value) -> Result<M> {
        tracing::info!(repository = M::COLLECTION, data = %data, "Starting create");
        log_outcome(M::COLLECTION, "create", self.insert(data))
    }

    async fn update(&self, instance: &M, changes: Value) -> Result<M> {
        tracing::info!(repository = M::COLLECTION, changes = %changes, "Starting update");
        log_outcome(M::COLLECTION, "update", self.save(instance, changes))
    }

    async fn get(&self, criteria: &FilterNode) -> Result<Option<M>> {
        tracing::info!(repository = M::COLLECTION, criteria = %criteria, "Starting get");
        log_outcome(M::COLLECTION, "get", self.find_one(criteria))
    }

    async fn delete(&self, criteria: &FilterNode) -> Result<bool> {
        tracing::info!(repository = M::COLLECTION, criteria = %criteria, "Starting delete");
        log_outcome(M::COLLECTION, "delete", self.delete_one(criteria))
    }

    async fn count(&self, criteria: Option<&FilterNode>) -> Result<u64> {
        tracing::info!(repository = M::COLLECTION, criteria = ?criteria.map(ToString::to_string), "Starting count");
        log_outcome(M::COLLECTION, "count", self.count_matching(criteria))
    }

    async fn paginate(&self, request: &PageRequest) -> Result<Page<M>> {
        tracing::info!(
            repository = M::COLLECTION,
            page = request.page,
            per_page = ?request.per_page,
            filter = ?request.filter.as_ref().map(ToString::to_string),
            sort = request.sort.len(),
            "Starting paginate"
        );
        log_outcome(M::COLLECTION, "paginate", self.fetch_page(request))
    }
}
