use reqwest::Method;
use serde::Deserialize;
use tracing::{info, warn};

use crate::client::DeskClient;
use crate::error::{ClientError, SubmitError};
use crate::models::{CreatedTicket, TicketSummary};
use crate::submission::CreateTicketPayload;

#[derive(Deserialize)]
struct TicketsResponse {
    #[serde(default)]
    tickets: Vec<TicketSummary>,
}

/// Posts the payload to `endpoint=tickets`. Any 2xx is a created ticket, the
/// body is only read for the details it happens to carry.
pub async fn create_ticket(
    client: &DeskClient,
    payload: &CreateTicketPayload,
) -> Result<CreatedTicket, SubmitError> {
    let url = client.endpoint_url("tickets")?;
    let response = client
        .send_request(Method::POST, url, |req| req.json(payload))
        .await?;

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!("ticket created, but its response body could not be read: {e}");
            String::new()
        }
    };
    let created = read_created(&body);
    info!(ticket_id = ?created.id, "ticket created");
    Ok(created)
}

fn read_created(body: &str) -> CreatedTicket {
    match serde_json::from_str::<CreatedTicket>(body) {
        Ok(created) => created,
        Err(e) => {
            if !body.trim().is_empty() {
                warn!("ticket created, ignoring unexpected response body: {e}");
            }
            CreatedTicket::default()
        }
    }
}

pub async fn fetch_tickets(client: &DeskClient) -> Result<Vec<TicketSummary>, ClientError> {
    let response: TicketsResponse = client.get_json(client.endpoint_url("tickets")?).await?;
    Ok(response.tickets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_ticket_details_are_optional() {
        let created = read_created(r#"{"message": "Заявка создана", "ticket_id": 5}"#);
        assert_eq!(created.id, Some(5));
        assert_eq!(created.message.as_deref(), Some("Заявка создана"));

        assert_eq!(read_created(r#"{"id": 7, "title": "VPN"}"#).id, Some(7));
        assert_eq!(read_created(""), CreatedTicket::default());
        assert_eq!(read_created("[1, 2]"), CreatedTicket::default());
    }
}
