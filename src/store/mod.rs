//! Persistence boundary: the router only talks to `Persistence` and `Record`.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::config::ModelDescriptor;
use crate::query::QueryOptions;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The write was refused by a constraint or validation rule.
    #[error("{0}")]
    Rejected(String),
    #[error("unknown model: {0}")]
    UnknownModel(String),
    #[error("unknown association accessor: {0}")]
    UnknownAccessor(String),
    #[error("backend: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation() {
                return StoreError::Rejected(db.message().to_string());
            }
            // not_null_violation
            if db.code().as_deref() == Some("23502") {
                return StoreError::Rejected(db.message().to_string());
            }
        }
        StoreError::Backend(e.to_string())
    }
}

pub type RecordHandle = Box<dyn Record>;

/// Handle to one persisted row. Attributes include eager-loaded relations under their alias.
#[async_trait]
pub trait Record: Send + Sync + std::fmt::Debug {
    fn model(&self) -> &ModelDescriptor;

    /// Primary key value.
    fn id(&self) -> Value;

    fn attributes(&self) -> &Map<String, Value>;

    /// Replace the full related set of the association whose accessor is `setter`.
    async fn set_association(&mut self, setter: &str, related: &[RecordHandle]) -> Result<(), StoreError>;

    /// Write the given attributes; keys that are not fields of the model are ignored.
    async fn update_attributes(&mut self, attributes: Map<String, Value>) -> Result<(), StoreError>;

    /// Re-read the row, eager-loading `options.include`.
    async fn reload(&mut self, options: &QueryOptions) -> Result<(), StoreError>;

    async fn destroy(&mut self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait Persistence: Send + Sync {
    async fn find_all(&self, model: &ModelDescriptor, options: &QueryOptions) -> Result<Vec<RecordHandle>, StoreError>;

    async fn find_one(&self, model: &ModelDescriptor, options: &QueryOptions) -> Result<Option<RecordHandle>, StoreError>;

    async fn create(&self, model: &ModelDescriptor, attributes: Map<String, Value>) -> Result<RecordHandle, StoreError>;
}

/// Key used to compare primary/foreign key values across JSON representations (7 == "7").
pub(crate) fn key_of(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
