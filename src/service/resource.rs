//! Resource pipeline: resolve -> include-validate -> query/mutate -> associate -> persist -> reload -> serialize.

use crate::config::{AssociationKind, IdFormat, ModelRegistry};
use crate::error::AppError;
use crate::query::QueryOptions;
use crate::response::envelope;
use crate::service::includes::{resolve_includes, settable_for_write, SettableAssociation};
use crate::service::resolver::{coerce_value_id, resolve_id, resolve_resource, RequestContext};
use crate::store::{Persistence, RecordHandle, StoreError};
use crate::transport::Transport;
use futures::future::try_join_all;
use serde_json::Value;
use std::sync::Arc;

/// Executes resource operations against a `Persistence` backend, independent of the HTTP layer.
/// Every method returns the response envelope (or nothing, for delete).
pub struct ResourceService {
    registry: Arc<ModelRegistry>,
    store: Arc<dyn Persistence>,
    transport: Arc<dyn Transport>,
    id_format: IdFormat,
}

/// Ids supplied for one association in an update payload.
struct PendingAssociation<'a> {
    association: &'a SettableAssociation,
    ids: Vec<Value>,
}

/// Raw request body -> JSON. An empty body becomes `null`, which transports reject.
fn decode_body(raw: &[u8]) -> Result<Value, AppError> {
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn association_ids(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().filter(|v| !v.is_null()).map(coerce_value_id).collect(),
        single => vec![coerce_value_id(&single)],
    }
}

impl ResourceService {
    pub fn new(
        registry: Arc<ModelRegistry>,
        store: Arc<dyn Persistence>,
        transport: Arc<dyn Transport>,
        id_format: IdFormat,
    ) -> Self {
        ResourceService {
            registry,
            store,
            transport,
            id_format,
        }
    }

    fn serialize_all(&self, ctx: &RequestContext, records: &[RecordHandle]) -> Value {
        Value::Array(
            records
                .iter()
                .map(|r| self.transport.serialize_one(ctx, r.as_ref()))
                .collect(),
        )
    }

    async fn find_by_id(&self, ctx: &RequestContext, id: &Value, raw_id: &str) -> Result<RecordHandle, AppError> {
        self.store
            .find_one(&ctx.model, &ctx.query_options)
            .await?
            .ok_or_else(|| {
                tracing::debug!(route = %ctx.route_name, id = %id, "record not found");
                AppError::ResourceNotFound {
                    route: ctx.route_name.clone(),
                    id: raw_id.to_string(),
                }
            })
    }

    /// GET `/<resource>`
    pub async fn list(&self, resource: &str, include: Option<&str>, caller: QueryOptions) -> Result<Value, AppError> {
        let mut ctx = resolve_resource(&self.registry, resource)?;
        let plan = resolve_includes(&self.registry, &ctx.model, &ctx.route_name, include)?;
        ctx.query_options = QueryOptions::new().with_include(plan.eager).merge(caller);
        let records = self.store.find_all(&ctx.model, &ctx.query_options).await?;
        tracing::debug!(route = %ctx.route_name, count = records.len(), "listed records");
        Ok(envelope(&ctx.route_name, self.serialize_all(&ctx, &records)))
    }

    /// POST `/<resource>`. The body is decoded only once the resource is known.
    pub async fn create(&self, resource: &str, body: &[u8]) -> Result<Value, AppError> {
        let ctx = resolve_resource(&self.registry, resource)?;
        let attributes = self.transport.deserialize(&ctx, decode_body(body)?)?;
        let record = self.store.create(&ctx.model, attributes).await?;
        tracing::debug!(route = %ctx.route_name, id = %record.id(), "created record");
        Ok(envelope(&ctx.route_name, self.transport.serialize_one(&ctx, record.as_ref())))
    }

    /// GET `/<resource>/<id>`
    pub async fn read(
        &self,
        resource: &str,
        id: &str,
        include: Option<&str>,
        caller: QueryOptions,
    ) -> Result<Value, AppError> {
        let mut ctx = resolve_resource(&self.registry, resource)?;
        let key = resolve_id(id, &self.id_format, Some("Fetching"))?;
        let plan = resolve_includes(&self.registry, &ctx.model, &ctx.route_name, include)?;
        ctx.query_options = QueryOptions::new()
            .filter(ctx.model.primary_key.clone(), key.clone())
            .with_include(plan.eager)
            .merge(caller);
        let record = self.find_by_id(&ctx, &key, id).await?;
        Ok(envelope(&ctx.route_name, self.transport.serialize_one(&ctx, record.as_ref())))
    }

    /// PUT `/<resource>/<id>`: reconcile settable associations, then apply the remaining attributes.
    /// Not atomic: a failing attribute write leaves already-replaced associations in place.
    pub async fn update(
        &self,
        resource: &str,
        id: &str,
        include: Option<&str>,
        caller: QueryOptions,
        body: &[u8],
    ) -> Result<Value, AppError> {
        let mut ctx = resolve_resource(&self.registry, resource)?;
        let key = resolve_id(id, &self.id_format, None)?;
        let plan = resolve_includes(&self.registry, &ctx.model, &ctx.route_name, include)?;
        ctx.settable = settable_for_write(&self.registry, &ctx.model, &ctx.route_name, &plan, include.is_some())?;
        ctx.query_options = QueryOptions::new()
            .filter(ctx.model.primary_key.clone(), key.clone())
            .with_include(plan.eager)
            .merge(caller);

        let mut record = self.find_by_id(&ctx, &key, id).await?;
        let mut attributes = self.transport.deserialize(&ctx, decode_body(body)?)?;

        let pending: Vec<PendingAssociation<'_>> = ctx
            .settable
            .iter()
            .filter_map(|association| {
                attributes.remove(&association.alias).map(|value| PendingAssociation {
                    association,
                    ids: association_ids(value),
                })
            })
            .collect();

        let store = &self.store;
        let lookups = pending.iter().map(|p| async move {
            let target = &p.association.target;
            let found = try_join_all(p.ids.iter().map(|id| {
                let options = QueryOptions::new().filter(target.primary_key.clone(), id.clone());
                async move { store.find_one(target, &options).await }
            }))
            .await?;
            // unresolved ids are dropped
            Ok::<Vec<RecordHandle>, StoreError>(found.into_iter().flatten().collect())
        });
        let related = try_join_all(lookups).await?;

        for (p, records) in pending.iter().zip(related) {
            tracing::debug!(
                route = %ctx.route_name,
                setter = %p.association.setter,
                requested = p.ids.len(),
                resolved = records.len(),
                "replacing association"
            );
            record.set_association(&p.association.setter, &records).await?;
        }
        record.update_attributes(attributes).await?;
        record.reload(&ctx.query_options).await?;
        Ok(envelope(&ctx.route_name, self.transport.serialize_one(&ctx, record.as_ref())))
    }

    /// DELETE `/<resource>/<id>`
    pub async fn delete(&self, resource: &str, id: &str) -> Result<(), AppError> {
        let mut ctx = resolve_resource(&self.registry, resource)?;
        let key = resolve_id(id, &self.id_format, Some("Deleting"))?;
        ctx.query_options = QueryOptions::new().filter(ctx.model.primary_key.clone(), key.clone());
        let mut record = self.find_by_id(&ctx, &key, id).await?;
        record.destroy().await?;
        tracing::debug!(route = %ctx.route_name, id = %key, "destroyed record");
        Ok(())
    }

    /// GET `/<resource>/<id>/<collection>`: records of `collection` that belong to the parent.
    pub async fn list_related(
        &self,
        resource: &str,
        id: &str,
        collection: &str,
        include: Option<&str>,
        caller: QueryOptions,
    ) -> Result<Value, AppError> {
        let parent = resolve_resource(&self.registry, resource)?;
        let key = resolve_id(id, &self.id_format, None)?;
        let mut ctx = resolve_resource(&self.registry, collection)?;
        let back_reference = ctx
            .model
            .associations
            .iter()
            .find(|a| a.kind == AssociationKind::BelongsTo && a.target == parent.model.name)
            .ok_or_else(|| AppError::UnknownAssociation {
                route: ctx.route_name.clone(),
                association: parent.model_name.clone(),
            })?;
        let filter_key = back_reference.alias.clone();
        let plan = resolve_includes(&self.registry, &ctx.model, &ctx.route_name, include)?;
        ctx.query_options = QueryOptions::new()
            .filter(filter_key, key)
            .with_include(plan.eager)
            .merge(caller);
        let records = self.store.find_all(&ctx.model, &ctx.query_options).await?;
        tracing::debug!(
            parent = %parent.route_name,
            route = %ctx.route_name,
            count = records.len(),
            "listed related records"
        );
        Ok(envelope(&ctx.route_name, self.serialize_all(&ctx, &records)))
    }
}
