//! Metadata store abstraction and implementations for Cabinet.
//!
//! This crate provides the control-plane data model:
//! - File rows and their lifecycle transitions
//! - Storage bucket records and the round-robin bucket rotation
//! - Bounded retention scavenging

pub mod error;
pub mod models;
pub mod postgres;
pub mod repos;
pub mod rotation;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use postgres::PostgresStore;
pub use rotation::BucketSelector;
pub use store::{MetadataStore, SqliteStore};

use cabinet_core::config::DatabaseConfig;
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn from_config(config: &DatabaseConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    match config {
        DatabaseConfig::Sqlite { path } => {
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
        DatabaseConfig::Postgres {
            host,
            port,
            username,
            password,
            database,
            max_connections,
            statement_timeout_ms,
        } => {
            let store = PostgresStore::from_params(
                host,
                *port,
                username.as_deref(),
                password.as_deref(),
                database,
                *max_connections,
                *statement_timeout_ms,
            )
            .await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
    }
}
