//! The three-step ticket creation wizard.
//!
//! `ServiceSelect` picks the ticket service, `ServiceMultiSelect` picks the
//! services it is filed against, `DetailsForm` collects the description,
//! priority, due date and custom fields. Forward moves are guarded, backward
//! moves are not, and going back from the first step closes the wizard.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{SubmitError, WizardError};
use crate::fields::{date, FieldValue};
use crate::models::{CustomField, FieldType, Service, TicketService};
use crate::reference::ReferenceData;
use crate::submission::{assemble, CreateTicketPayload, SubmissionInput};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WizardStep {
    #[default]
    ServiceSelect,
    ServiceMultiSelect,
    DetailsForm,
}

/// What the user has entered so far. Lives only as long as the wizard session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketDraft {
    /// The chosen ticket service.
    pub service_id: Option<i64>,
    pub selected_service_ids: Vec<i64>,
    pub custom_fields: BTreeMap<i64, FieldValue>,
    pub description: String,
    pub priority_id: Option<i64>,
    /// ISO date.
    pub due_date: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TicketWizard {
    step: WizardStep,
    open: bool,
    draft: TicketDraft,
    ticket_services: Vec<TicketService>,
    services: Vec<Service>,
}

impl TicketWizard {
    pub fn new(ticket_services: Vec<TicketService>, services: Vec<Service>) -> Self {
        Self {
            ticket_services,
            services,
            ..Default::default()
        }
    }

    pub fn from_reference(reference: &ReferenceData) -> Self {
        Self::new(reference.ticket_services.clone(), reference.services.clone())
    }

    /// Opens on the first step with an empty draft, whatever was left behind.
    pub fn open(&mut self) {
        self.reset();
        self.open = true;
    }

    /// Closes the wizard and discards the draft.
    pub fn close(&mut self) {
        self.reset();
        self.open = false;
    }

    fn reset(&mut self) {
        self.step = WizardStep::ServiceSelect;
        self.draft = TicketDraft::default();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &TicketDraft {
        &self.draft
    }

    pub fn ticket_services(&self) -> &[TicketService] {
        &self.ticket_services
    }

    pub fn selected_ticket_service(&self) -> Option<&TicketService> {
        let id = self.draft.service_id?;
        self.ticket_services.iter().find(|ts| ts.id == id)
    }

    /// Services offered by the chosen ticket service, none before one is chosen.
    pub fn available_services(&self) -> Vec<&Service> {
        let Some(ticket_service) = self.selected_ticket_service() else {
            return Vec::new();
        };
        self.services
            .iter()
            .filter(|s| ticket_service.offers(s.id))
            .collect()
    }

    /// The pair the custom fields depend on, once a ticket service is chosen.
    pub fn selection(&self) -> Option<(i64, &[i64])> {
        self.draft
            .service_id
            .map(|id| (id, self.draft.selected_service_ids.as_slice()))
    }

    fn expect_step(&self, expected: WizardStep) -> Result<(), WizardError> {
        if !self.open {
            return Err(WizardError::NotOpen);
        }
        if self.step != expected {
            return Err(WizardError::WrongStep {
                expected,
                actual: self.step,
            });
        }
        Ok(())
    }

    /// Choosing a different ticket service drops the services and field
    /// values picked for the previous one.
    pub fn select_ticket_service(&mut self, ticket_service_id: i64) -> Result<(), WizardError> {
        self.expect_step(WizardStep::ServiceSelect)?;
        if !self.ticket_services.iter().any(|ts| ts.id == ticket_service_id) {
            return Err(WizardError::UnknownTicketService(ticket_service_id));
        }
        if self.draft.service_id != Some(ticket_service_id) {
            self.draft.selected_service_ids.clear();
            self.draft.custom_fields.clear();
        }
        self.draft.service_id = Some(ticket_service_id);
        Ok(())
    }

    /// Adds the service if absent, removes it if present. Returns whether it
    /// is selected afterwards.
    pub fn toggle_service(&mut self, service_id: i64) -> Result<bool, WizardError> {
        self.expect_step(WizardStep::ServiceMultiSelect)?;
        if !self.available_services().iter().any(|s| s.id == service_id) {
            return Err(WizardError::ServiceNotAvailable(service_id));
        }

        let selected = &mut self.draft.selected_service_ids;
        if let Some(pos) = selected.iter().position(|id| *id == service_id) {
            selected.remove(pos);
            Ok(false)
        } else {
            selected.push(service_id);
            Ok(true)
        }
    }

    fn advance_guard(&self) -> Result<WizardStep, WizardError> {
        if !self.open {
            return Err(WizardError::NotOpen);
        }
        match self.step {
            WizardStep::ServiceSelect if self.draft.service_id.is_none() => {
                Err(WizardError::NoTicketService)
            }
            WizardStep::ServiceSelect => Ok(WizardStep::ServiceMultiSelect),
            WizardStep::ServiceMultiSelect if self.draft.selected_service_ids.is_empty() => {
                Err(WizardError::NoServicesSelected)
            }
            WizardStep::ServiceMultiSelect => Ok(WizardStep::DetailsForm),
            WizardStep::DetailsForm => Err(WizardError::WrongStep {
                expected: WizardStep::ServiceMultiSelect,
                actual: WizardStep::DetailsForm,
            }),
        }
    }

    pub fn can_advance(&self) -> bool {
        self.advance_guard().is_ok()
    }

    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        let next = self.advance_guard()?;
        debug!(from = ?self.step, to = ?next, "wizard step");
        self.step = next;
        Ok(next)
    }

    /// Steps back, keeping the draft. Returns `None` when this closed the wizard.
    pub fn back(&mut self) -> Option<WizardStep> {
        match self.step {
            WizardStep::DetailsForm => self.step = WizardStep::ServiceMultiSelect,
            WizardStep::ServiceMultiSelect => self.step = WizardStep::ServiceSelect,
            WizardStep::ServiceSelect => {
                self.close();
                return None;
            }
        }
        Some(self.step)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        self.draft.title = (!title.is_empty()).then_some(title);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
    }

    pub fn set_priority(&mut self, priority_id: Option<i64>) {
        self.draft.priority_id = priority_id;
    }

    pub fn set_due_date(&mut self, due_date: Option<NaiveDate>) {
        self.draft.due_date = due_date.map(date::to_iso);
    }

    pub fn set_field(&mut self, field_id: i64, value: FieldValue) {
        self.draft.custom_fields.insert(field_id, value);
    }

    pub fn clear_field(&mut self, field_id: i64) {
        self.draft.custom_fields.remove(&field_id);
    }

    /// Parses `raw` for `field` and stores it; blank input clears the value.
    pub fn set_field_value(&mut self, field: &CustomField, raw: &str) -> Result<(), WizardError> {
        if raw.trim().is_empty() {
            self.clear_field(field.id);
            return Ok(());
        }
        let value =
            FieldValue::parse(field, raw).map_err(|source| WizardError::InvalidFieldValue {
                field: field.display_name().to_owned(),
                source,
            })?;
        self.set_field(field.id, value);
        Ok(())
    }

    /// Builds the create-ticket payload. Only possible on the details step,
    /// and only once every required field of `fields` has a value.
    pub fn assemble(&self, fields: &[CustomField]) -> Result<CreateTicketPayload, WizardError> {
        self.expect_step(WizardStep::DetailsForm)?;

        if let Some(missing) = fields.iter().find(|f| {
            f.is_required
                && f.field_type != FieldType::File
                && !self.draft.custom_fields.contains_key(&f.id)
        }) {
            return Err(WizardError::MissingRequiredField(
                missing.display_name().to_owned(),
            ));
        }

        Ok(assemble(SubmissionInput {
            ticket_service: self.selected_ticket_service(),
            service_ids: &self.draft.selected_service_ids,
            title: self.draft.title.as_deref(),
            description: &self.draft.description,
            priority_id: self.draft.priority_id,
            due_date: self.draft.due_date.as_deref(),
            custom_fields: &self.draft.custom_fields,
        }))
    }

    /// The ticket was created: start over and close.
    pub fn submission_succeeded(&mut self) {
        self.close();
    }

    /// The ticket was not created: stay on the details step with the draft intact.
    pub fn submission_failed(&mut self, error: &SubmitError) {
        warn!(step = ?self.step, "ticket submission failed: {error}");
    }
}
