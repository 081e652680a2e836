use anyhow::{Context, Result};
use colored::Colorize;
use helpdesk_common::models::TicketSummary;
use helpdesk_common::tickets::fetch_tickets;

use crate::{invocation_context::InvocationContext, utils::truncate};

pub async fn list(context: &InvocationContext) -> Result<()> {
    let tickets = fetch_tickets(&context.client)
        .await
        .context("Failed to fetch tickets")?;

    if tickets.is_empty() {
        println!("No tickets found.");
        println!();
        println!("Create one with:");
        println!("  helpdesk tickets create");
        return Ok(());
    }

    for ticket in &tickets {
        print_ticket_summary(ticket);
    }

    println!();
    println!(
        "{} ticket{} total.",
        tickets.len(),
        if tickets.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

fn print_ticket_summary(ticket: &TicketSummary) {
    let status = ticket.status_name.as_deref().unwrap_or("—");
    println!(
        "  {:>6}  {:<48} {}",
        format!("#{}", ticket.id).dimmed(),
        truncate(&ticket.title, 48).bold(),
        status.cyan()
    );

    let mut details = Vec::new();
    if let Some(service) = &ticket.service_name {
        details.push(service.clone());
    }
    if let Some(priority) = &ticket.priority_name {
        details.push(format!("priority: {priority}"));
    }
    if let Some(assignee) = &ticket.assignee_name {
        details.push(format!("assignee: {assignee}"));
    }
    if let Some(due) = &ticket.due_date {
        details.push(format!("due: {due}"));
    }
    if !details.is_empty() {
        println!("          {}", details.join(" · ").dimmed());
    }
}
