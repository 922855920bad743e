//! Common test utilities: song entity, product document and seeded storage

#![allow(dead_code)]

use sea_orm::{ConnectionTrait, DatabaseConnection, Schema};
use serde::{Deserialize, Serialize};
use serde_json::json;
use service_repository::query::DocumentModel;
use service_repository::{
    connect, Config, DocumentRepository, DocumentStore, Repository, SeaOrmRepository,
};
use std::sync::Arc;

pub mod song {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "songs")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub title: String,
        pub is_active: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Product stored in the document backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub is_active: bool,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl DocumentModel for Product {
    const COLLECTION: &'static str = "products";
    const FIELDS: &'static [&'static str] = &["id", "title", "is_active", "updated_at"];
}

/// Rows seeded by [`seeded_songs`] and [`seeded_products`]
pub const SEED_COUNT: usize = 15;

pub fn test_config() -> Config {
    Config {
        // one connection: every pooled connection to sqlite::memory: is a separate database
        database_url: Some("sqlite::memory:".to_string()),
        max_connections: Some(1),
        ..Config::default()
    }
}

/// Fresh in-memory SQLite database with the `songs` table
pub async fn song_database() -> Arc<DatabaseConnection> {
    let db = connect(&test_config()).await.unwrap();
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    db.execute(backend.build(&schema.create_table_from_entity(song::Entity)))
        .await
        .unwrap();
    db
}

pub async fn song_repository() -> SeaOrmRepository<song::Entity> {
    SeaOrmRepository::new(song_database().await, test_config())
}

/// "Song title 0" .. "Song title 14"; even numbers are active
pub async fn seeded_songs() -> SeaOrmRepository<song::Entity> {
    let repo = song_repository().await;
    for i in 0..SEED_COUNT {
        repo.create(json!({ "title": format!("Song title {i}"), "is_active": i % 2 == 0 }))
            .await
            .unwrap();
    }
    repo
}

pub fn product_repository() -> DocumentRepository<Product> {
    DocumentRepository::new(Arc::new(DocumentStore::new()), test_config())
}

/// "Product title 0" .. "Product title 14" with ids "p0" .. "p14"
pub async fn seeded_products() -> DocumentRepository<Product> {
    let repo = product_repository();
    for i in 0..SEED_COUNT {
        repo.create(json!({
            "id": format!("p{i}"),
            "title": format!("Product title {i}"),
            "is_active": i % 2 == 0,
        }))
        .await
        .unwrap();
    }
    repo
}

pub fn print_test_header(test_name: &str, purpose: &[&str]) {
    println!("\n🧪 TEST: {}", test_name);
    if let Some(first) = purpose.first() {
        println!("📋 PURPOSE: {}", first);
    }
    for line in purpose.iter().skip(1) {
        println!("   {}", line);
    }
}

pub fn titles<T>(items: &[T], title: impl Fn(&T) -> &str) -> Vec<String> {
    items.iter().map(|i| title(i).to_string()).collect()
}
