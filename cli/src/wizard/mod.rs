//! Interactive front end for [`TicketWizard`]: one prompt per step, custom
//! fields re-resolved whenever the selection changes.

use std::fmt;
use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use helpdesk_common::client::DeskClient;
use helpdesk_common::error::WizardError;
use helpdesk_common::fields::{control_for, FieldControl};
use helpdesk_common::models::{CustomField, FieldType};
use helpdesk_common::reference::{ReferenceData, StructureData};
use helpdesk_common::resolver::FieldResolver;
use helpdesk_common::submission::{resolve_title, DEFAULT_TICKET_TITLE};
use helpdesk_common::tickets::create_ticket;
use helpdesk_common::wizard::{TicketWizard, WizardStep};
use inquire::{MultiSelect, Select};
use tracing::{debug, info};

use crate::invocation_context::InvocationContext;

pub mod fields;
pub mod prompts;

use fields::prompt_field;
use prompts::{cursor_for, Choice};

pub async fn run(
    context: &InvocationContext,
    ticket_service: Option<i64>,
    services: Vec<i64>,
) -> Result<()> {
    if !io::stdout().is_terminal() {
        bail!("The ticket wizard needs an interactive terminal")
    }

    let reference = ReferenceData::load(&context.client).await;
    if reference.ticket_services.is_empty() {
        bail!("No ticket services available, there is nothing to file a ticket against")
    }

    let mut session = WizardSession::new(context, reference);
    session.wizard.open();
    session
        .apply_presets(ticket_service, &services)
        .await
        .context("Failed to apply the ticket service and services given on the command line")?;
    session.drive().await
}

struct WizardSession<'a> {
    context: &'a InvocationContext,
    reference: ReferenceData,
    wizard: TicketWizard,
    resolver: FieldResolver<DeskClient>,
    structure: Option<StructureData>,
}

#[derive(Clone, Copy)]
enum DetailsAction {
    Submit,
    Edit,
    Back,
    Cancel,
}

impl fmt::Display for DetailsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailsAction::Submit => write!(f, "Submit the ticket"),
            DetailsAction::Edit => write!(f, "Edit the details"),
            DetailsAction::Back => write!(f, "← Back to services"),
            DetailsAction::Cancel => write!(f, "Cancel"),
        }
    }
}

impl<'a> WizardSession<'a> {
    fn new(context: &'a InvocationContext, reference: ReferenceData) -> Self {
        Self {
            context,
            wizard: TicketWizard::from_reference(&reference),
            reference,
            resolver: FieldResolver::new(Arc::new(context.client.clone())),
            structure: None,
        }
    }

    async fn apply_presets(&mut self, ticket_service: Option<i64>, services: &[i64]) -> Result<()> {
        let Some(ticket_service) = ticket_service else {
            return Ok(());
        };
        self.wizard.select_ticket_service(ticket_service)?;
        self.wizard.next()?;

        for service in services {
            self.wizard.toggle_service(*service)?;
        }
        if !services.is_empty() {
            self.refresh_fields().await;
            self.wizard.next()?;
        }
        Ok(())
    }

    async fn drive(&mut self) -> Result<()> {
        loop {
            if !self.wizard.is_open() {
                println!("Ticket creation cancelled.");
                return Ok(());
            }
            match self.wizard.step() {
                WizardStep::ServiceSelect => self.service_select()?,
                WizardStep::ServiceMultiSelect => self.service_multi_select().await?,
                WizardStep::DetailsForm => {
                    if self.details_form().await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn refresh_fields(&self) {
        match self.wizard.selection() {
            Some((ticket_service, services)) => {
                let services = services.to_vec();
                self.resolver.refresh(ticket_service, &services).await;
            }
            None => self.resolver.clear(),
        }
    }

    fn service_select(&mut self) -> Result<()> {
        let choices: Vec<Choice<i64>> = self
            .wizard
            .ticket_services()
            .iter()
            .map(|ts| {
                let label = match ts.description.as_deref().filter(|d| !d.is_empty()) {
                    Some(description) => format!("{} {}", ts.name, description.dimmed()),
                    None => ts.name.clone(),
                };
                Choice::new(label, ts.id)
            })
            .collect();
        let cursor = self
            .wizard
            .draft()
            .service_id
            .map(|id| cursor_for(&choices, &id))
            .unwrap_or(0);

        let selected = Select::new("Ticket service:", choices)
            .with_starting_cursor(cursor)
            .with_help_message("↑↓ to move, enter to select, esc to cancel")
            .prompt_skippable()?;

        match selected {
            Some(choice) => {
                self.wizard.select_ticket_service(choice.value)?;
                self.wizard.next()?;
            }
            None => {
                self.wizard.back();
            }
        }
        Ok(())
    }

    async fn service_multi_select(&mut self) -> Result<()> {
        let choices: Vec<Choice<i64>> = self
            .wizard
            .available_services()
            .iter()
            .map(|s| Choice::new(s.name.clone(), s.id))
            .collect();

        if choices.is_empty() {
            let name = self
                .wizard
                .selected_ticket_service()
                .map(|ts| ts.name.clone())
                .unwrap_or_default();
            println!(
                "{}",
                format!("'{name}' offers no services, choose another ticket service").yellow()
            );
            self.wizard.back();
            return Ok(());
        }

        let current = self.wizard.draft().selected_service_ids.clone();
        let defaults: Vec<usize> = choices
            .iter()
            .enumerate()
            .filter(|(_, c)| current.contains(&c.value))
            .map(|(i, _)| i)
            .collect();

        let selected = MultiSelect::new("Services:", choices)
            .with_default(&defaults)
            .with_help_message("space to toggle, enter to continue, esc to go back")
            .prompt_skippable()?;

        let Some(selected) = selected else {
            self.wizard.back();
            return Ok(());
        };
        let chosen: Vec<i64> = selected.into_iter().map(|c| c.value).collect();
        for service in toggles_between(&current, &chosen) {
            self.wizard.toggle_service(service)?;
        }
        self.refresh_fields().await;

        match self.wizard.next() {
            Ok(_) => Ok(()),
            Err(WizardError::NoServicesSelected) => {
                println!("{}", "Choose at least one service".yellow());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns `true` once the ticket has been created.
    async fn details_form(&mut self) -> Result<bool> {
        let resolved = self.resolver.current();
        let up_to_date = self.wizard.selection().is_some_and(|(ts, services)| {
            resolved.ticket_service_id == Some(ts) && resolved.service_ids == services
        });
        if !up_to_date {
            self.refresh_fields().await;
        }
        let fields = self.resolver.fields();

        self.fill_details(&fields).await?;

        loop {
            self.print_summary(&fields);

            let actions = vec![
                DetailsAction::Submit,
                DetailsAction::Edit,
                DetailsAction::Back,
                DetailsAction::Cancel,
            ];
            match Select::new("What next?", actions).prompt()? {
                DetailsAction::Submit => {
                    let payload = match self.wizard.assemble(&fields) {
                        Ok(payload) => payload,
                        Err(e) => {
                            println!("{}", e.to_string().yellow());
                            continue;
                        }
                    };
                    debug!(?payload, "submitting ticket");

                    match create_ticket(&self.context.client, &payload).await {
                        Ok(created) => {
                            self.wizard.submission_succeeded();
                            info!(ticket_id = ?created.id, "ticket created");
                            let number = created.id.map(|id| format!(" #{id}")).unwrap_or_default();
                            println!();
                            println!(
                                "{}{} {}",
                                "Created ticket".green().bold(),
                                number,
                                created.title.as_deref().unwrap_or(&payload.title)
                            );
                            return Ok(true);
                        }
                        Err(e) => {
                            self.wizard.submission_failed(&e);
                            println!("{}", e.to_string().red());
                        }
                    }
                }
                DetailsAction::Edit => self.fill_details(&fields).await?,
                DetailsAction::Back => {
                    self.wizard.back();
                    return Ok(false);
                }
                DetailsAction::Cancel => {
                    self.wizard.close();
                    return Ok(false);
                }
            }
        }
    }

    async fn fill_details(&mut self, fields: &[CustomField]) -> Result<()> {
        let has_template = self
            .wizard
            .selected_ticket_service()
            .and_then(|ts| ts.ticket_title.as_deref())
            .is_some_and(|t| !t.trim().is_empty());
        if !has_template {
            let title = prompts::title(self.wizard.draft().title.as_deref(), DEFAULT_TICKET_TITLE)?;
            self.wizard.set_title(title.unwrap_or_default());
        }

        let description = prompts::description(&self.wizard.draft().description)?;
        self.wizard.set_description(description);

        let priority = prompts::priority(
            &self.reference.dictionaries.priorities,
            self.wizard.draft().priority_id,
        )?;
        self.wizard.set_priority(priority);

        let due_date = prompts::due_date(self.wizard.draft().due_date.as_deref())?;
        self.wizard.set_due_date(due_date);

        let needs_structure = fields
            .iter()
            .any(|f| f.field_type == FieldType::CompanyStructure);
        if needs_structure && self.structure.is_none() {
            self.structure = Some(StructureData::load_or_empty(&self.context.client).await);
        }

        for field in fields {
            let current = self.wizard.draft().custom_fields.get(&field.id).cloned();
            let answer = prompt_field(field, current.as_ref(), self.structure.as_ref())?;
            match answer {
                Some(raw) => self.wizard.set_field_value(field, &raw)?,
                None => self.wizard.clear_field(field.id),
            }
        }
        Ok(())
    }

    fn print_summary(&self, fields: &[CustomField]) {
        let draft = self.wizard.draft();
        let ticket_service = self.wizard.selected_ticket_service();
        let services: Vec<&str> = self
            .reference
            .services
            .iter()
            .filter(|s| draft.selected_service_ids.contains(&s.id))
            .map(|s| s.name.as_str())
            .collect();
        let priority = draft.priority_id.and_then(|id| {
            self.reference
                .dictionaries
                .priorities
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.name.as_str())
        });

        println!();
        println!(
            "{}",
            resolve_title(ticket_service, draft.title.as_deref()).bold()
        );
        println!(
            "  {:<16} {}",
            "Ticket service".dimmed(),
            ticket_service.map(|ts| ts.name.as_str()).unwrap_or("—")
        );
        println!("  {:<16} {}", "Services".dimmed(), services.join(", "));
        println!("  {:<16} {}", "Priority".dimmed(), priority.unwrap_or("—"));
        println!(
            "  {:<16} {}",
            "Due date".dimmed(),
            draft
                .due_date
                .as_deref()
                .map(helpdesk_common::fields::date::iso_to_display)
                .unwrap_or_else(|| "—".to_string())
        );
        if !draft.description.is_empty() {
            println!("  {:<16} {}", "Description".dimmed(), draft.description);
        }

        for field in fields {
            if control_for(field) == FieldControl::FilePicker {
                continue;
            }
            let value = draft
                .custom_fields
                .get(&field.id)
                .map(|v| v.display())
                .unwrap_or_else(|| "—".to_string());
            println!("  {:<16} {}", field.display_name().dimmed(), value);
        }
        println!();
    }
}

/// Services to toggle to turn the `current` selection into `chosen`:
/// removals first, then additions in the order they were chosen.
fn toggles_between(current: &[i64], chosen: &[i64]) -> Vec<i64> {
    current
        .iter()
        .filter(|id| !chosen.contains(id))
        .chain(chosen.iter().filter(|id| !current.contains(id)))
        .copied()
        .collect()
}
