//! Raw model definitions as they appear in `models.json`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Integer,
    Bigint,
    Float,
    Text,
    Boolean,
    Timestamp,
    Uuid,
    Json,
}

impl FieldType {
    /// PostgreSQL type used for parameter casts.
    pub fn pg_type(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Bigint => "bigint",
            FieldType::Float => "double precision",
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
            FieldType::Timestamp => "timestamptz",
            FieldType::Uuid => "uuid",
            FieldType::Json => "jsonb",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: FieldType,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    /// The owning model carries the foreign key.
    BelongsTo,
    /// The target carries the foreign key; at most one target row.
    HasOne,
    /// The target carries the foreign key.
    HasMany,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssociationConfig {
    pub name: String,
    /// Registry name of the related model.
    pub target: String,
    pub kind: AssociationKind,
    pub foreign_key: String,
    /// Display alias; defaults to `name`.
    #[serde(default, rename = "as")]
    pub as_: Option<String>,
    /// Accessor that replaces the full related set; defaults to `set<Alias>`.
    #[serde(default)]
    pub setter: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub associations: Vec<AssociationConfig>,
}

fn default_primary_key() -> String {
    "id".into()
}

/// All model definitions in one struct for in-memory loading.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FullConfig {
    pub models: Vec<ModelConfig>,
}
