//! Catalogs the ticket wizard is built from.
//!
//! Every catalog degrades on its own: a failed or malformed response is
//! logged and leaves that catalog empty (or, for the dictionaries, on the
//! built-in defaults) so the wizard can still be shown.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::client::DeskClient;
use crate::error::ClientError;
use crate::models::{
    Category, Company, CustomField, Department, DepartmentPosition, OrgDepartment, Position,
    Priority, Service, Status, TicketService,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionaries {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub priorities: Vec<Priority>,
    #[serde(default)]
    pub statuses: Vec<Status>,
    #[serde(default)]
    pub departments: Vec<Department>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl Dictionaries {
    /// Used when the dictionaries endpoint answers with an error status.
    pub fn fallback() -> Self {
        Self {
            priorities: fallback_priorities(),
            statuses: fallback_statuses(),
            ..Default::default()
        }
    }
}

pub fn fallback_priorities() -> Vec<Priority> {
    [
        (1, "Низкий", "#6b7280"),
        (2, "Средний", "#3b82f6"),
        (3, "Высокий", "#f97316"),
        (4, "Критический", "#ef4444"),
    ]
    .into_iter()
    .map(|(id, name, color)| Priority {
        id,
        name: name.to_owned(),
        level: Some(id),
        color: Some(color.to_owned()),
    })
    .collect()
}

pub fn fallback_statuses() -> Vec<Status> {
    [
        (1, "Новая", "#3b82f6", false),
        (2, "В работе", "#eab308", false),
        (3, "Ожидание", "#f97316", false),
        (4, "Решена", "#22c55e", true),
        (5, "Закрыта", "#6b7280", true),
    ]
    .into_iter()
    .map(|(id, name, color, is_closed)| Status {
        id,
        name: name.to_owned(),
        color: Some(color.to_owned()),
        is_closed: Some(is_closed),
    })
    .collect()
}

/// Everything the wizard shows before any custom field is resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub ticket_services: Vec<TicketService>,
    pub services: Vec<Service>,
    pub dictionaries: Dictionaries,
}

impl ReferenceData {
    pub async fn load(client: &DeskClient) -> Self {
        let (ticket_services, services, dictionaries) = tokio::join!(
            fetch_ticket_services(client),
            fetch_services(client),
            fetch_dictionaries(client),
        );

        let ticket_services = ticket_services.unwrap_or_else(|e| {
            warn!("failed to load ticket services: {e}");
            Vec::new()
        });
        let services = services.unwrap_or_else(|e| {
            warn!("failed to load services: {e}");
            Vec::new()
        });
        let dictionaries = match dictionaries {
            Ok(d) => d,
            Err(e @ ClientError::ApiError(..)) => {
                warn!("dictionaries unavailable, using defaults: {e}");
                Dictionaries::fallback()
            }
            Err(e) => {
                warn!("failed to load dictionaries: {e}");
                Dictionaries::default()
            }
        };

        info!(
            ticket_services = ticket_services.len(),
            services = services.len(),
            priorities = dictionaries.priorities.len(),
            "reference data loaded"
        );

        Self {
            ticket_services,
            services,
            dictionaries,
        }
    }

    pub fn ticket_service(&self, id: i64) -> Option<&TicketService> {
        self.ticket_services.iter().find(|ts| ts.id == id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ServicesResponse {
    Wrapped { services: Vec<Service> },
    Bare(Vec<Service>),
}

pub async fn fetch_ticket_services(client: &DeskClient) -> Result<Vec<TicketService>, ClientError> {
    fetch_list(client, client.endpoint_url("ticket-services")?).await
}

pub async fn fetch_services(client: &DeskClient) -> Result<Vec<Service>, ClientError> {
    let response: Option<ServicesResponse> =
        client.get_json(client.endpoint_url("services")?).await?;
    Ok(match response {
        Some(ServicesResponse::Wrapped { services }) | Some(ServicesResponse::Bare(services)) => {
            services
        }
        None => Vec::new(),
    })
}

pub async fn fetch_dictionaries(client: &DeskClient) -> Result<Dictionaries, ClientError> {
    client
        .get_json(client.endpoint_url("ticket-dictionaries-api")?)
        .await
}

/// Companies, department trees and positions for the company structure picker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureData {
    pub companies: Vec<Company>,
    pub departments: Vec<OrgDepartment>,
    pub positions: Vec<Position>,
    pub department_positions: Vec<DepartmentPosition>,
}

impl StructureData {
    pub async fn load(client: &DeskClient) -> Result<Self, ClientError> {
        let (companies, departments, positions, department_positions) = tokio::try_join!(
            fetch_list(client, client.structure_url("companies")?),
            fetch_list(client, client.structure_url("departments")?),
            fetch_list(client, client.structure_url("positions")?),
            fetch_list(client, client.structure_url("department-positions")?),
        )?;

        Ok(Self {
            companies,
            departments,
            positions,
            department_positions,
        })
    }

    /// Like `load`, but an unreachable directory just yields an empty picker.
    pub async fn load_or_empty(client: &DeskClient) -> Self {
        Self::load(client).await.unwrap_or_else(|e| {
            warn!("failed to load company structure data: {e}");
            Self::default()
        })
    }
}

/// Reads a JSON array; any other JSON body counts as an empty list.
pub async fn fetch_list<T: DeserializeOwned>(
    client: &DeskClient,
    url: Url,
) -> Result<Vec<T>, ClientError> {
    let value: serde_json::Value = client.get_json(url.clone()).await?;
    if !value.is_array() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|e| ClientError::DecodeError(Box::new(url), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_dictionaries_have_priorities_and_statuses() {
        let fallback = Dictionaries::fallback();
        let names: Vec<_> = fallback.priorities.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Низкий", "Средний", "Высокий", "Критический"]);
        assert_eq!(fallback.statuses.len(), 5);
        assert_eq!(
            fallback.statuses.iter().filter(|s| s.is_closed == Some(true)).count(),
            2
        );
        assert!(fallback.categories.is_empty());
    }

    #[test]
    fn services_response_accepts_both_shapes() {
        let wrapped: ServicesResponse =
            serde_json::from_str(r#"{"services": [{"id": 1, "name": "1C"}]}"#).unwrap();
        let bare: ServicesResponse = serde_json::from_str(r#"[{"id": 2, "name": "AD"}]"#).unwrap();

        assert!(matches!(wrapped, ServicesResponse::Wrapped { services } if services[0].id == 1));
        assert!(matches!(bare, ServicesResponse::Bare(services) if services[0].id == 2));
    }
}
