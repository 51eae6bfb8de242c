//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from model descriptors.

use crate::config::{AssociationKind, ModelDescriptor};
use crate::query::IncludeDirective;
use serde_json::{Map, Value};

const MAIN_ALIAS: &str = "main";
const REL_ALIAS: &str = "rel";

/// Quote identifier for PostgreSQL (safe: only from config).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified_table(model: &ModelDescriptor) -> String {
    format!("{}.{}", quoted(&model.schema), quoted(&model.table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }

    /// Placeholder for the next parameter, cast to the column type when known.
    fn placeholder(&mut self, model: &ModelDescriptor, column: &str, v: Value) -> String {
        let n = self.push_param(v);
        model
            .field(column)
            .map(|f| format!("${}::{}", n, f.type_.pg_type()))
            .unwrap_or_else(|| format!("${}", n))
    }
}

fn column_list(model: &ModelDescriptor, alias: &str) -> String {
    model
        .fields
        .iter()
        .map(|f| format!("{}.{} AS {}", alias, quoted(&f.name), quoted(&f.name)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn include_subquery(model: &ModelDescriptor, inc: &IncludeDirective) -> String {
    let target = &inc.model;
    let assoc = &inc.association;
    let rel_cols = column_list(target, REL_ALIAS);
    let rel_table = qualified_table(target);
    let (cond, single) = match assoc.kind {
        AssociationKind::BelongsTo => (
            format!(
                "{}.{} = {}.{}",
                REL_ALIAS,
                quoted(&target.primary_key),
                MAIN_ALIAS,
                quoted(&assoc.foreign_key)
            ),
            true,
        ),
        AssociationKind::HasOne | AssociationKind::HasMany => (
            format!(
                "{}.{} = {}.{}",
                REL_ALIAS,
                quoted(&assoc.foreign_key),
                MAIN_ALIAS,
                quoted(&model.primary_key)
            ),
            assoc.kind == AssociationKind::HasOne,
        ),
    };
    let order = format!("{}.{}", REL_ALIAS, quoted(&target.primary_key));
    if single {
        format!(
            "(SELECT row_to_json(sub) FROM (SELECT {} FROM {} {} WHERE {} ORDER BY {} LIMIT 1) sub)",
            rel_cols, rel_table, REL_ALIAS, cond, order
        )
    } else {
        format!(
            "(SELECT COALESCE(json_agg(row_to_json(sub)), '[]'::json) FROM (SELECT {} FROM {} {} WHERE {} ORDER BY {}) sub)",
            rel_cols, rel_table, REL_ALIAS, cond, order
        )
    }
}

/// SELECT with includes in a single query: main table aliased as "main", each include as a scalar
/// subquery (json_agg for has_many, row_to_json otherwise). `filters` are (column, value) pairs
/// already mapped to physical columns.
pub fn select_with_includes(
    model: &ModelDescriptor,
    filters: &[(String, Value)],
    includes: &[IncludeDirective],
    limit: Option<u32>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut select_parts = vec![column_list(model, MAIN_ALIAS)];
    for inc in includes {
        select_parts.push(format!("{} AS {}", include_subquery(model, inc), quoted(inc.alias())));
    }

    let mut where_parts = Vec::new();
    for (col, val) in filters {
        let ph = q.placeholder(model, col, val.clone());
        where_parts.push(format!("{}.{} = {}", MAIN_ALIAS, quoted(col), ph));
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    let limit_clause = limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();

    q.sql = format!(
        "SELECT {} FROM {} {}{} ORDER BY {}.{}{}",
        select_parts.join(", "),
        qualified_table(model),
        MAIN_ALIAS,
        where_clause,
        MAIN_ALIAS,
        quoted(&model.primary_key),
        limit_clause
    );
    q
}

/// INSERT only the columns present in `body` (so DB defaults apply to the rest). Unknown keys are skipped.
pub fn insert(model: &ModelDescriptor, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for f in &model.fields {
        let Some(val) = body.get(&f.name) else { continue };
        if val.is_null() && f.name == model.primary_key {
            continue;
        }
        placeholders.push(q.placeholder(model, &f.name, val.clone()));
        cols.push(quoted(&f.name));
    }
    let returning = column_list(model, MAIN_ALIAS);
    q.sql = if cols.is_empty() {
        format!(
            "INSERT INTO {} AS {} DEFAULT VALUES RETURNING {}",
            qualified_table(model),
            MAIN_ALIAS,
            returning
        )
    } else {
        format!(
            "INSERT INTO {} AS {} ({}) VALUES ({}) RETURNING {}",
            qualified_table(model),
            MAIN_ALIAS,
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by id: SET only columns present in body (and in model fields). Falls back to a plain
/// SELECT by id when nothing is settable.
pub fn update(model: &ModelDescriptor, id: &Value, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (k, v) in body {
        if *k == model.primary_key || model.field(k).is_none() {
            continue;
        }
        let ph = q.placeholder(model, k, v.clone());
        sets.push(format!("{} = {}", quoted(k), ph));
    }
    let id_ph = q.placeholder(model, &model.primary_key, id.clone());
    if sets.is_empty() {
        q.sql = format!(
            "SELECT {} FROM {} {} WHERE {}.{} = {}",
            column_list(model, MAIN_ALIAS),
            qualified_table(model),
            MAIN_ALIAS,
            MAIN_ALIAS,
            quoted(&model.primary_key),
            id_ph
        );
        return q;
    }
    q.sql = format!(
        "UPDATE {} AS {} SET {} WHERE {}.{} = {} RETURNING {}",
        qualified_table(model),
        MAIN_ALIAS,
        sets.join(", "),
        MAIN_ALIAS,
        quoted(&model.primary_key),
        id_ph,
        column_list(model, MAIN_ALIAS)
    );
    q
}

/// DELETE by id.
pub fn delete(model: &ModelDescriptor, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id_ph = q.placeholder(model, &model.primary_key, id.clone());
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        qualified_table(model),
        quoted(&model.primary_key),
        id_ph
    );
    q
}

/// UPDATE <model> SET <column> = $1 WHERE <pk> = $2.
pub fn set_column(model: &ModelDescriptor, column: &str, value: &Value, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let value_ph = q.placeholder(model, column, value.clone());
    let id_ph = q.placeholder(model, &model.primary_key, id.clone());
    q.sql = format!(
        "UPDATE {} SET {} = {} WHERE {} = {}",
        qualified_table(model),
        quoted(column),
        value_ph,
        quoted(&model.primary_key),
        id_ph
    );
    q
}

/// Detach every row of `target` whose `foreign_key` points at `owner_id`.
pub fn clear_foreign_key(target: &ModelDescriptor, foreign_key: &str, owner_id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.placeholder(target, foreign_key, owner_id.clone());
    q.sql = format!(
        "UPDATE {} SET {} = NULL WHERE {} = {}",
        qualified_table(target),
        quoted(foreign_key),
        quoted(foreign_key),
        ph
    );
    q
}

/// Point `foreign_key` of the listed `target` rows at `owner_id`. Returns `None` for an empty id list.
pub fn assign_foreign_key(
    target: &ModelDescriptor,
    foreign_key: &str,
    owner_id: &Value,
    ids: &[Value],
) -> Option<QueryBuf> {
    if ids.is_empty() {
        return None;
    }
    let mut q = QueryBuf::new();
    let owner_ph = q.placeholder(target, foreign_key, owner_id.clone());
    let id_phs: Vec<String> = ids
        .iter()
        .map(|id| q.placeholder(target, &target.primary_key, id.clone()))
        .collect();
    q.sql = format!(
        "UPDATE {} SET {} = {} WHERE {} IN ({})",
        qualified_table(target),
        quoted(foreign_key),
        owner_ph,
        quoted(&target.primary_key),
        id_phs.join(", ")
    );
    Some(q)
}
