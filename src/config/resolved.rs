//! Resolved model registry: definitions validated and flattened for runtime use.

use crate::config::{AssociationKind, FieldType};
use crate::inflection::{pluralize, singularize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_: FieldType,
    pub nullable: bool,
    pub default: Option<serde_json::Value>,
}

/// A named relationship from one model to another.
#[derive(Clone, Debug)]
pub struct Association {
    /// Declared name, lower-cased.
    pub name: String,
    /// Display alias, lower-cased. Used as include key and payload key.
    pub alias: String,
    /// Registry name of the related model.
    pub target: String,
    /// Primary key of the related model.
    pub target_primary_key: String,
    pub kind: AssociationKind,
    /// Column on the owner (belongs_to) or on the target (has_one, has_many).
    pub foreign_key: String,
    /// Accessor name that replaces the full related set.
    pub setter: String,
}

#[derive(Clone, Debug)]
pub struct ModelDescriptor {
    pub name: String,
    pub table: String,
    pub schema: String,
    pub primary_key: String,
    pub fields: Vec<FieldDescriptor>,
    /// In declaration order.
    pub associations: Vec<Association>,
}

impl ModelDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn association(&self, name: &str) -> Option<&Association> {
        let name = name.to_lowercase();
        self.association_by_alias(&name)
            .or_else(|| self.associations.iter().find(|a| a.name == name))
    }

    pub fn association_by_alias(&self, alias: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.alias == alias)
    }

    pub fn association_by_setter(&self, setter: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.setter == setter)
    }

    /// Column a `where` key filters on: a field name as-is, or a belongs_to alias mapped to its foreign key.
    pub fn filter_column(&self, key: &str) -> Option<&str> {
        if let Some(f) = self.field(key) {
            return Some(f.name.as_str());
        }
        self.association_by_alias(key)
            .filter(|a| a.kind == AssociationKind::BelongsTo)
            .map(|a| a.foreign_key.as_str())
    }
}

/// Immutable after construction; shared between requests via `Arc`.
#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<ModelDescriptor>>,
    allowed: Option<Vec<String>>,
}

impl ModelRegistry {
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        ModelRegistry {
            models: models
                .into_iter()
                .map(|m| (m.name.clone(), Arc::new(m)))
                .collect(),
            allowed: None,
        }
    }

    /// Restrict routable models to `allowed` (case-insensitive). Unknown names are ignored.
    pub fn with_allowed(mut self, allowed: Option<Vec<String>>) -> Self {
        self.allowed = allowed.map(|v| v.into_iter().map(|s| s.to_lowercase()).collect());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ModelDescriptor>> {
        self.models.get(name)
    }

    /// Resolve a path segment: exact name, then its plural, then its singular. Respects the allowlist.
    pub fn lookup(&self, segment: &str) -> Option<&Arc<ModelDescriptor>> {
        let lower = segment.to_lowercase();
        let found = self
            .models
            .get(&lower)
            .or_else(|| self.models.get(&pluralize(&lower)))
            .or_else(|| self.models.get(&singularize(&lower)))?;
        match &self.allowed {
            Some(allowed) if !allowed.iter().any(|a| *a == found.name) => None,
            _ => Some(found),
        }
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
