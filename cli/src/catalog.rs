use anyhow::{Context, Result};
use colored::Colorize;
use helpdesk_common::fields::control_for;
use helpdesk_common::models::CustomField;
use helpdesk_common::reference::{fetch_services, fetch_ticket_services, ReferenceData};
use helpdesk_common::resolver::fetch_fields;

use crate::{
    commands::CatalogCommand,
    invocation_context::InvocationContext,
    utils::{print_json, truncate},
};

pub async fn print_catalog(context: &InvocationContext, cmd: CatalogCommand) -> Result<()> {
    let client = &context.client;
    match cmd {
        CatalogCommand::TicketServices => {
            let ticket_services = fetch_ticket_services(client)
                .await
                .context("Failed to fetch ticket services")?;
            print_json(&ticket_services)
        }
        CatalogCommand::Services => {
            let services = fetch_services(client)
                .await
                .context("Failed to fetch services")?;
            print_json(&services)
        }
        // The dictionaries degrade to built-in defaults, so these never fail
        CatalogCommand::Priorities => {
            print_json(&ReferenceData::load(client).await.dictionaries.priorities)
        }
        CatalogCommand::Statuses => {
            print_json(&ReferenceData::load(client).await.dictionaries.statuses)
        }
    }
}

pub async fn print_fields(
    context: &InvocationContext,
    ticket_service_id: i64,
    service_ids: &[i64],
) -> Result<()> {
    let fields = fetch_fields(&context.client, ticket_service_id, service_ids)
        .await
        .context("Failed to resolve custom fields")?;

    if fields.is_empty() {
        println!("No custom fields for ticket service {ticket_service_id} with services {service_ids:?}.");
        return Ok(());
    }

    for field in &fields {
        println!("{}", field_line(field));
    }
    println!();
    println!("{} field(s) total.", fields.len());
    Ok(())
}

fn field_line(field: &CustomField) -> String {
    let required = if field.is_required {
        "required".red().to_string()
    } else {
        "optional".dimmed().to_string()
    };
    format!(
        "  {:>5}  {:<32} {:<18} {} {:?}",
        field.id,
        truncate(field.display_name(), 32).bold(),
        field.field_type.to_string(),
        required,
        control_for(field),
    )
}
