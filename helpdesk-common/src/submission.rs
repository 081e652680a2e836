//! Builds the create-ticket request body from a finished draft.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fields::FieldValue;
use crate::models::TicketService;

pub const DEFAULT_TICKET_TITLE: &str = "Новая заявка";

/// Status every new ticket is created in.
pub const OPEN_STATUS_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTicketPayload {
    pub title: String,
    pub description: String,
    // The backend still expects the key; tickets get their category from the service
    pub category_id: String,
    pub priority_id: Option<i64>,
    pub status_id: i64,
    pub service_id: Option<i64>,
    pub service_ids: Vec<i64>,
    pub due_date: Option<String>,
    /// Field id → wire string.
    pub custom_fields: BTreeMap<String, String>,
}

/// The ticket service's title template, then the draft's title, then the default.
pub fn resolve_title(ticket_service: Option<&TicketService>, draft_title: Option<&str>) -> String {
    ticket_service
        .and_then(|ts| ts.ticket_title.as_deref())
        .filter(|t| !t.trim().is_empty())
        .or(draft_title.filter(|t| !t.trim().is_empty()))
        .unwrap_or(DEFAULT_TICKET_TITLE)
        .to_owned()
}

/// Everything the assembler needs from the wizard.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionInput<'a> {
    pub ticket_service: Option<&'a TicketService>,
    pub service_ids: &'a [i64],
    pub title: Option<&'a str>,
    pub description: &'a str,
    pub priority_id: Option<i64>,
    pub due_date: Option<&'a str>,
    pub custom_fields: &'a BTreeMap<i64, FieldValue>,
}

pub fn assemble(input: SubmissionInput<'_>) -> CreateTicketPayload {
    CreateTicketPayload {
        title: resolve_title(input.ticket_service, input.title),
        description: input.description.to_owned(),
        category_id: String::new(),
        priority_id: input.priority_id,
        status_id: OPEN_STATUS_ID,
        service_id: input.ticket_service.map(|ts| ts.id),
        service_ids: input.service_ids.to_vec(),
        due_date: input.due_date.filter(|d| !d.is_empty()).map(str::to_owned),
        custom_fields: input
            .custom_fields
            .iter()
            .map(|(id, value)| (id.to_string(), value.encode()))
            .collect(),
    }
}
