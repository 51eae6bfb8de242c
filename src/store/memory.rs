//! Process-local store. Rows are JSON objects kept in insertion order per model.

use crate::config::{AssociationKind, ModelDescriptor, ModelRegistry};
use crate::query::{IncludeDirective, QueryOptions};
use crate::store::{key_of, Persistence, Record, RecordHandle, StoreError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Row = Map<String, Value>;

#[derive(Default)]
struct Tables {
    rows: HashMap<String, Vec<Row>>,
    next_id: HashMap<String, i64>,
}

impl Tables {
    fn rows(&self, model: &str) -> &[Row] {
        self.rows.get(model).map(Vec::as_slice).unwrap_or(&[])
    }

    fn find(&self, model: &ModelDescriptor, id: &Value) -> Option<&Row> {
        let key = key_of(id)?;
        self.rows(&model.name)
            .iter()
            .find(|r| r.get(&model.primary_key).and_then(key_of).as_deref() == Some(key.as_str()))
    }

    fn find_mut(&mut self, model: &ModelDescriptor, id: &Value) -> Option<&mut Row> {
        let key = key_of(id)?;
        self.rows
            .get_mut(&model.name)?
            .iter_mut()
            .find(|r| r.get(&model.primary_key).and_then(key_of).as_deref() == Some(key.as_str()))
    }

    fn allocate_id(&mut self, model: &str) -> i64 {
        let next = self.next_id.entry(model.to_string()).or_insert(1);
        let id = *next;
        *next += 1;
        id
    }

    /// Keep the id sequence ahead of explicitly supplied integer keys.
    fn observe_id(&mut self, model: &str, id: &Value) {
        if let Some(n) = id.as_i64() {
            let next = self.next_id.entry(model.to_string()).or_insert(1);
            if n >= *next {
                *next = n + 1;
            }
        }
    }
}

fn matches(model: &ModelDescriptor, row: &Row, where_: &Map<String, Value>) -> bool {
    where_.iter().all(|(k, v)| {
        let column = model.filter_column(k).unwrap_or(k.as_str());
        let have = row.get(column).and_then(key_of);
        have.is_some() && have == key_of(v)
    })
}

fn with_includes(tables: &Tables, model: &ModelDescriptor, row: &Row, include: &[IncludeDirective]) -> Row {
    let mut out = row.clone();
    let own_id = row.get(&model.primary_key).and_then(key_of);
    for inc in include {
        let target = &inc.model;
        let assoc = &inc.association;
        let value = match assoc.kind {
            AssociationKind::BelongsTo => row
                .get(&assoc.foreign_key)
                .and_then(|fk| tables.find(target, fk))
                .cloned()
                .map(Value::Object)
                .unwrap_or(Value::Null),
            AssociationKind::HasOne | AssociationKind::HasMany => {
                let related: Vec<Value> = tables
                    .rows(&target.name)
                    .iter()
                    .filter(|r| {
                        own_id.is_some() && r.get(&assoc.foreign_key).and_then(key_of) == own_id
                    })
                    .cloned()
                    .map(Value::Object)
                    .collect();
                if assoc.kind == AssociationKind::HasMany {
                    Value::Array(related)
                } else {
                    related.into_iter().next().unwrap_or(Value::Null)
                }
            }
        };
        out.insert(inc.alias().to_string(), value);
    }
    out
}

/// In-memory `Persistence` backed by a shared table map.
#[derive(Clone)]
pub struct MemoryStore {
    registry: Arc<ModelRegistry>,
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        MemoryStore {
            registry,
            tables: Arc::new(RwLock::new(Tables::default())),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }

    fn descriptor(&self, name: &str) -> Result<Arc<ModelDescriptor>, StoreError> {
        self.registry
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownModel(name.to_string()))
    }

    fn handle(&self, model: Arc<ModelDescriptor>, attributes: Row) -> RecordHandle {
        let id = attributes.get(&model.primary_key).cloned().unwrap_or(Value::Null);
        Box::new(MemoryRecord {
            store: self.clone(),
            model,
            id,
            attributes,
        })
    }

    /// Number of rows currently held for `model`.
    pub fn count(&self, model: &str) -> usize {
        self.read().map(|t| t.rows(model).len()).unwrap_or(0)
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn find_all(&self, model: &ModelDescriptor, options: &QueryOptions) -> Result<Vec<RecordHandle>, StoreError> {
        let descriptor = self.descriptor(&model.name)?;
        let rows: Vec<Row> = {
            let tables = self.read()?;
            tables
                .rows(&descriptor.name)
                .iter()
                .filter(|r| matches(&descriptor, r, &options.where_))
                .map(|r| with_includes(&tables, &descriptor, r, &options.include))
                .collect()
        };
        Ok(rows
            .into_iter()
            .map(|r| self.handle(descriptor.clone(), r))
            .collect())
    }

    async fn find_one(&self, model: &ModelDescriptor, options: &QueryOptions) -> Result<Option<RecordHandle>, StoreError> {
        let descriptor = self.descriptor(&model.name)?;
        let row = {
            let tables = self.read()?;
            tables
                .rows(&descriptor.name)
                .iter()
                .find(|r| matches(&descriptor, r, &options.where_))
                .map(|r| with_includes(&tables, &descriptor, r, &options.include))
        };
        Ok(row.map(|r| self.handle(descriptor, r)))
    }

    async fn create(&self, model: &ModelDescriptor, attributes: Map<String, Value>) -> Result<RecordHandle, StoreError> {
        let descriptor = self.descriptor(&model.name)?;
        let mut row = Row::new();
        for f in &descriptor.fields {
            let value = attributes
                .get(&f.name)
                .filter(|v| !v.is_null())
                .cloned()
                .or_else(|| f.default.clone());
            match value {
                Some(v) => {
                    row.insert(f.name.clone(), v);
                }
                None if f.name == descriptor.primary_key => {}
                None if !f.nullable => {
                    return Err(StoreError::Rejected(format!("{} is required", f.name)));
                }
                None => {
                    row.insert(f.name.clone(), Value::Null);
                }
            }
        }

        let mut tables = self.write()?;
        match row.get(&descriptor.primary_key).cloned() {
            Some(id) => {
                if tables.find(&descriptor, &id).is_some() {
                    return Err(StoreError::Rejected(format!(
                        "{} {} already exists",
                        descriptor.primary_key, id
                    )));
                }
                tables.observe_id(&descriptor.name, &id);
            }
            None => {
                let id = tables.allocate_id(&descriptor.name);
                row.insert(descriptor.primary_key.clone(), Value::from(id));
            }
        }
        tables
            .rows
            .entry(descriptor.name.clone())
            .or_default()
            .push(row.clone());
        drop(tables);
        tracing::debug!(model = %descriptor.name, "memory store: created row");
        Ok(self.handle(descriptor, row))
    }
}

#[derive(Clone)]
pub struct MemoryRecord {
    store: MemoryStore,
    model: Arc<ModelDescriptor>,
    id: Value,
    attributes: Row,
}

impl std::fmt::Debug for MemoryRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRecord")
            .field("model", &self.model.name)
            .field("id", &self.id)
            .finish()
    }
}

impl MemoryRecord {
    fn missing(&self) -> StoreError {
        StoreError::Backend(format!("{} {} no longer exists", self.model.name, self.id))
    }
}

#[async_trait]
impl Record for MemoryRecord {
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
        let target = self.store.descriptor(&assoc.target)?;
        let ids: Vec<Value> = related.iter().map(|r| r.id()).collect();
        let own_key = key_of(&self.id);

        let mut tables = self.store.write()?;
        match assoc.kind {
            AssociationKind::BelongsTo => {
                let value = ids.first().cloned().unwrap_or(Value::Null);
                let model = self.model.clone();
                let row = tables.find_mut(&model, &self.id).ok_or_else(|| self.missing())?;
                row.insert(assoc.foreign_key.clone(), value.clone());
                self.attributes.insert(assoc.foreign_key.clone(), value);
            }
            AssociationKind::HasOne | AssociationKind::HasMany => {
                let keep: HashSet<String> = if assoc.kind == AssociationKind::HasOne {
                    ids.iter().take(1).filter_map(key_of).collect()
                } else {
                    ids.iter().filter_map(key_of).collect()
                };
                if let Some(rows) = tables.rows.get_mut(&target.name) {
                    for row in rows.iter_mut() {
                        let row_key = row.get(&target.primary_key).and_then(key_of);
                        let selected = row_key.as_ref().map(|k| keep.contains(k)).unwrap_or(false);
                        let points_here = row.get(&assoc.foreign_key).and_then(key_of) == own_key;
                        if selected {
                            row.insert(assoc.foreign_key.clone(), self.id.clone());
                        } else if points_here {
                            row.insert(assoc.foreign_key.clone(), Value::Null);
                        }
                    }
                }
            }
        }
        tracing::debug!(model = %self.model.name, setter = %setter, count = ids.len(), "memory store: association replaced");
        Ok(())
    }

    async fn update_attributes(&mut self, attributes: Map<String, Value>) -> Result<(), StoreError> {
        let model = self.model.clone();
        for (k, v) in &attributes {
            if let Some(f) = model.field(k) {
                if v.is_null() && !f.nullable {
                    return Err(StoreError::Rejected(format!("{} must not be null", k)));
                }
            }
        }
        let mut tables = self.store.write()?;
        let row = tables.find_mut(&model, &self.id).ok_or_else(|| self.missing())?;
        for (k, v) in attributes {
            if k == model.primary_key || model.field(&k).is_none() {
                continue;
            }
            row.insert(k.clone(), v.clone());
            self.attributes.insert(k, v);
        }
        Ok(())
    }

    async fn reload(&mut self, options: &QueryOptions) -> Result<(), StoreError> {
        let tables = self.store.read()?;
        let row = tables.find(&self.model, &self.id).ok_or_else(|| self.missing())?;
        self.attributes = with_includes(&tables, &self.model, row, &options.include);
        Ok(())
    }

    async fn destroy(&mut self) -> Result<(), StoreError> {
        let mut tables = self.store.write()?;
        let key = key_of(&self.id);
        let pk = self.model.primary_key.clone();
        if let Some(rows) = tables.rows.get_mut(&self.model.name) {
            rows.retain(|r| r.get(&pk).and_then(key_of) != key);
        }
        Ok(())
    }
}
