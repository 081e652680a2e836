//! Works out which custom fields a ticket needs from the chosen ticket
//! service and services.
//!
//! Field groups are attached to (ticket service, service) pairs by
//! [`ServiceFieldMapping`] rows. The fields for a selection are the fields of
//! every group mapped to any selected pair, deduplicated by field id with the
//! first copy seen winning.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::client::DeskClient;
use crate::error::ClientError;
use crate::models::{CustomField, FieldGroup, ServiceFieldMapping};

/// Where mapping rows and field groups come from.
#[async_trait]
pub trait FieldSource: Send + Sync {
    async fn field_mappings(&self) -> Result<Vec<ServiceFieldMapping>, ClientError>;
    async fn field_groups(&self) -> Result<Vec<FieldGroup>, ClientError>;
}

#[async_trait]
impl FieldSource for DeskClient {
    async fn field_mappings(&self) -> Result<Vec<ServiceFieldMapping>, ClientError> {
        self.get_json(self.service_field_mappings_url()?).await
    }

    async fn field_groups(&self) -> Result<Vec<FieldGroup>, ClientError> {
        self.get_json(self.field_groups_url()?).await
    }
}

/// Ids of the groups mapped to `ticket_service_id` paired with any selected service.
pub fn mapped_group_ids(
    ticket_service_id: i64,
    selected_service_ids: &[i64],
    mappings: &[ServiceFieldMapping],
) -> HashSet<i64> {
    mappings
        .iter()
        .filter(|m| {
            m.ticket_service_id == ticket_service_id
                && selected_service_ids.contains(&m.service_id)
        })
        .map(|m| m.field_group_id)
        .collect()
}

/// Flattens the mapped groups into one field list, in group order, keeping
/// the first copy of each field id.
pub fn resolve_fields(
    ticket_service_id: i64,
    selected_service_ids: &[i64],
    mappings: &[ServiceFieldMapping],
    groups: &[FieldGroup],
) -> Vec<CustomField> {
    let group_ids = mapped_group_ids(ticket_service_id, selected_service_ids, mappings);
    if group_ids.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    groups
        .iter()
        .filter(|g| group_ids.contains(&g.id))
        .flat_map(|g| g.fields.iter())
        .filter(|f| seen.insert(f.id))
        .cloned()
        .collect()
}

/// Fetches mappings and groups and resolves the field list for a selection.
pub async fn fetch_fields<S: FieldSource + ?Sized>(
    source: &S,
    ticket_service_id: i64,
    selected_service_ids: &[i64],
) -> Result<Vec<CustomField>, ClientError> {
    if selected_service_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mappings = source.field_mappings().await?;
    if mapped_group_ids(ticket_service_id, selected_service_ids, &mappings).is_empty() {
        return Ok(Vec::new());
    }
    let groups = source.field_groups().await?;

    Ok(resolve_fields(
        ticket_service_id,
        selected_service_ids,
        &mappings,
        &groups,
    ))
}

/// The field list last committed by a [`FieldResolver`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFields {
    pub generation: u64,
    pub ticket_service_id: Option<i64>,
    pub service_ids: Vec<i64>,
    pub fields: Vec<CustomField>,
}

/// Re-resolves the field list every time the selection changes.
///
/// Each refresh takes a generation number; when a refresh finishes after a
/// newer one has started, its result is dropped. The state therefore always
/// reflects the most recent selection, whatever order responses arrive in.
/// Fetch failures are logged and leave an empty field list.
pub struct FieldResolver<S: ?Sized> {
    source: Arc<S>,
    generation: AtomicU64,
    state: RwLock<ResolvedFields>,
}

impl<S: FieldSource + ?Sized> FieldResolver<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            generation: AtomicU64::new(0),
            state: RwLock::new(ResolvedFields::default()),
        }
    }

    /// Resolves fields for the selection. Returns `false` if a newer refresh
    /// superseded this one and the result was discarded.
    pub async fn refresh(&self, ticket_service_id: i64, selected_service_ids: &[i64]) -> bool {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let fields = match fetch_fields(&*self.source, ticket_service_id, selected_service_ids)
            .await
        {
            Ok(fields) => fields,
            Err(e) => {
                warn!(ticket_service_id, "failed to resolve custom fields: {e}");
                Vec::new()
            }
        };

        self.commit(ResolvedFields {
            generation,
            ticket_service_id: Some(ticket_service_id),
            service_ids: selected_service_ids.to_vec(),
            fields,
        })
    }

    /// Forgets the current field list, and any refresh still in flight.
    pub fn clear(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.commit(ResolvedFields {
            generation,
            ..Default::default()
        });
    }

    pub fn current(&self) -> ResolvedFields {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn fields(&self) -> Vec<CustomField> {
        self.current().fields
    }

    fn commit(&self, resolved: ResolvedFields) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if resolved.generation != self.generation.load(Ordering::SeqCst) {
            debug!(
                generation = resolved.generation,
                "discarding superseded field resolution"
            );
            return false;
        }
        *state = resolved;
        true
    }
}
