//! PostgreSQL-backed `Persistence` using the parameterized SQL builder.

use crate::config::{AssociationKind, ModelDescriptor, ModelRegistry};
use crate::query::QueryOptions;
use crate::sql::{
    assign_foreign_key, clear_foreign_key, delete, insert, select_with_includes, set_column, update, PgBindValue,
    QueryBuf,
};
use crate::store::{Persistence, Record, RecordHandle, StoreError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    registry: Arc<ModelRegistry>,
}

impl PgStore {
    pub fn new(pool: PgPool, registry: Arc<ModelRegistry>) -> Self {
        PgStore { pool, registry }
    }

    fn descriptor(&self, name: &str) -> Result<Arc<ModelDescriptor>, StoreError> {
        self.registry
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownModel(name.to_string()))
    }

    fn handle(&self, model: Arc<ModelDescriptor>, attributes: Map<String, Value>) -> RecordHandle {
        let id = attributes.get(&model.primary_key).cloned().unwrap_or(Value::Null);
        Box::new(PgRecord {
            store: self.clone(),
            model,
            id,
            attributes,
        })
    }

    fn select(&self, model: &ModelDescriptor, options: &QueryOptions, limit: Option<u32>) -> Result<QueryBuf, StoreError> {
        let mut filters = Vec::with_capacity(options.where_.len());
        for (k, v) in &options.where_ {
            let column = model
                .filter_column(k)
                .ok_or_else(|| StoreError::Rejected(format!("{} cannot be filtered on {}", model.name, k)))?;
            filters.push((column.to_string(), v.clone()));
        }
        Ok(select_with_includes(model, &filters, &options.include, limit))
    }
}

fn bind_all<'q>(
    q: &'q QueryBuf,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(PgBindValue::from_json(p));
    }
    query
}

async fn fetch_optional(pool: &PgPool, q: &QueryBuf) -> Result<Option<Map<String, Value>>, StoreError> {
    let row = bind_all(q).fetch_optional(pool).await?;
    Ok(row.map(|r| row_to_json(&r)))
}

async fn fetch_all(pool: &PgPool, q: &QueryBuf) -> Result<Vec<Map<String, Value>>, StoreError> {
    let rows = bind_all(q).fetch_all(pool).await?;
    Ok(rows.iter().map(row_to_json).collect())
}

#[async_trait]
impl Persistence for PgStore {
    async fn find_all(&self, model: &ModelDescriptor, options: &QueryOptions) -> Result<Vec<RecordHandle>, StoreError> {
        let descriptor = self.descriptor(&model.name)?;
        let q = self.select(&descriptor, options, None)?;
        let rows = fetch_all(&self.pool, &q).await?;
        Ok(rows
            .into_iter()
            .map(|r| self.handle(descriptor.clone(), r))
            .collect())
    }

    async fn find_one(&self, model: &ModelDescriptor, options: &QueryOptions) -> Result<Option<RecordHandle>, StoreError> {
        let descriptor = self.descriptor(&model.name)?;
        let q = self.select(&descriptor, options, Some(1))?;
        let row = fetch_optional(&self.pool, &q).await?;
        Ok(row.map(|r| self.handle(descriptor, r)))
    }

    async fn create(&self, model: &ModelDescriptor, attributes: Map<String, Value>) -> Result<RecordHandle, StoreError> {
        let descriptor = self.descriptor(&model.name)?;
        let q = insert(&descriptor, &attributes);
        let row = fetch_optional(&self.pool, &q)
            .await?
            .ok_or_else(|| StoreError::Backend("insert returned no row".into()))?;
        Ok(self.handle(descriptor, row))
    }
}

pub struct PgRecord {
    store: PgStore,
    model: Arc<ModelDescriptor>,
    id: Value,
    attributes: Map<String, Value>,
}

impl std::fmt::Debug for PgRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgRecord")
            .field("model", &self.model.name)
            .field("id", &self.id)
            .finish()
    }
}

#[async_trait]
impl Record for PgRecord {
    fn model(&self) -> &ModelDescriptor {
        &self.model
    }

    fn id(&self) -> Value {
        self.id.clone()
    }

    fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    async fn set_association(&mut self, setter: &str, related: &[RecordHandle]) -> Result<(), StoreError> {
        let assoc = self
            .model
            .association_by_setter(setter)
            .cloned()
            .ok_or_else(|| StoreError::UnknownAccessor(setter.to_string()))?;
        let ids: Vec<Value> = related.iter().map(|r| r.id()).collect();

        match assoc.kind {
            AssociationKind::BelongsTo => {
                let value = ids.first().cloned().unwrap_or(Value::Null);
                let q = set_column(&self.model, &assoc.foreign_key, &value, &self.id);
                bind_all(&q).execute(&self.store.pool).await?;
                self.attributes.insert(assoc.foreign_key.clone(), value);
            }
            AssociationKind::HasOne | AssociationKind::HasMany => {
                let target = self.store.descriptor(&assoc.target)?;
                let ids = if assoc.kind == AssociationKind::HasOne {
                    ids.into_iter().take(1).collect()
                } else {
                    ids
                };
                let clear = clear_foreign_key(&target, &assoc.foreign_key, &self.id);
                let assign = assign_foreign_key(&target, &assoc.foreign_key, &self.id, &ids);
                let mut tx = self.store.pool.begin().await?;
                bind_all(&clear).execute(&mut *tx).await?;
                if let Some(assign) = &assign {
                    bind_all(assign).execute(&mut *tx).await?;
                }
                tx.commit().await?;
            }
        }
        Ok(())
    }

    async fn update_attributes(&mut self, attributes: Map<String, Value>) -> Result<(), StoreError> {
        let q = update(&self.model, &self.id, &attributes);
        let row = fetch_optional(&self.store.pool, &q)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("{} {} no longer exists", self.model.name, self.id)))?;
        for (k, v) in row {
            self.attributes.insert(k, v);
        }
        Ok(())
    }

    async fn reload(&mut self, options: &QueryOptions) -> Result<(), StoreError> {
        let by_id = QueryOptions::new()
            .filter(self.model.primary_key.clone(), self.id.clone())
            .with_include(options.include.clone());
        let q = self.store.select(&self.model, &by_id, Some(1))?;
        self.attributes = fetch_optional(&self.store.pool, &q)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("{} {} no longer exists", self.model.name, self.id)))?;
        Ok(())
    }

    async fn destroy(&mut self) -> Result<(), StoreError> {
        let q = delete(&self.model, &self.id);
        bind_all(&q).execute(&self.store.pool).await?;
        Ok(())
    }
}

fn row_to_json(row: &sqlx::postgres::PgRow) -> Map<String, Value> {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}
