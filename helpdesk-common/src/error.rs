use std::fmt::Display;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::models::FieldType;
use crate::wizard::WizardStep;

/// Errors talking to the helpdesk backend.
#[derive(Error, Debug)]
pub enum ClientError {
    RequestError(reqwest::Error),
    // All non-2xx status codes, with the raw body
    ApiError(u16, Box<Url>, String),
    InvalidUrl(String),
    DecodeError(Box<Url>, serde_json::Error),
}

impl Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::RequestError(err) => write!(f, "Request error: {err}"),
            ClientError::InvalidUrl(msg) => write!(f, "Failed to build URL: {msg}"),
            ClientError::ApiError(status, url, body) => match ApiErrorResponse::parse(body) {
                // The body is only parsed here so that non-JSON bodies still make it to the user
                Some(api_error) => write!(f, "API error: status='{status}' error='{}'", api_error.error),
                None => write!(f, "API error: status='{status}' url='{url}' message='{body}'"),
            },
            ClientError::DecodeError(url, err) => {
                write!(f, "Failed to decode response from '{url}': {err}")
            }
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        ClientError::RequestError(error)
    }
}

impl ClientError {
    /// The message the backend put in its `{ "error": ... }` body, if any.
    pub fn api_message(&self) -> Option<String> {
        match self {
            ClientError::ApiError(_, _, body) => ApiErrorResponse::parse(body).map(|e| e.error),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::ApiError(status, _, _) => Some(*status),
            ClientError::RequestError(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ApiErrorResponse {
    pub error: String,
}

impl ApiErrorResponse {
    fn parse(body: &str) -> Option<Self> {
        serde_json::from_str::<ApiErrorResponse>(body)
            .ok()
            .filter(|e| !e.error.is_empty())
    }
}

/// Guard violations and bad input for the ticket creation wizard.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WizardError {
    #[error("the ticket dialog is not open")]
    NotOpen,
    #[error("choose a ticket service first")]
    NoTicketService,
    #[error("choose at least one service")]
    NoServicesSelected,
    #[error("ticket service {0} does not exist")]
    UnknownTicketService(i64),
    #[error("service {0} is not offered for the chosen ticket service")]
    ServiceNotAvailable(i64),
    #[error("this action needs the {expected:?} step, the wizard is on {actual:?}")]
    WrongStep {
        expected: WizardStep,
        actual: WizardStep,
    },
    #[error("required field '{0}' is empty")]
    MissingRequiredField(String),
    #[error("invalid value for field '{field}': {source}")]
    InvalidFieldValue {
        field: String,
        source: FieldValueError,
    },
}

/// Failures decoding a wire string into a typed field value.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FieldValueError {
    #[error("value is empty")]
    Empty,
    #[error("'{0}' is not a boolean, expected \"true\" or \"false\"")]
    NotABoolean(String),
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("'{0}' is not a valid date")]
    InvalidDate(String),
    #[error("'{0}' is not a complete phone number")]
    InvalidPhone(String),
    #[error("'{value}' is not one of the options")]
    UnknownOption { value: String },
    #[error("company structure value is malformed: {0}")]
    InvalidCompanyStructure(String),
    #[error("fields of type {0} cannot be filled in here")]
    Unsupported(FieldType),
}

/// Failures selecting company, department or position in the structure picker.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StructureError {
    #[error("company {0} does not exist")]
    UnknownCompany(i64),
    #[error("choose a company first")]
    NoCompany,
    #[error("department {0} does not belong to the selected company")]
    DepartmentNotInCompany(i64),
    #[error("choose a department first")]
    NoDepartment,
    #[error("position {0} is not linked to the selected department")]
    PositionNotInDepartment(i64),
}

pub const GENERIC_SUBMIT_ERROR: &str = "Не удалось создать заявку";

/// Failures submitting the assembled ticket.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// The backend refused the ticket; carries its message or a generic one.
    #[error("{0}")]
    Rejected(String),
    #[error("network error, check your connection: {0}")]
    Network(ClientError),
}

impl From<ClientError> for SubmitError {
    fn from(error: ClientError) -> Self {
        match &error {
            ClientError::ApiError(..) => SubmitError::Rejected(
                error
                    .api_message()
                    .unwrap_or_else(|| GENERIC_SUBMIT_ERROR.to_owned()),
            ),
            ClientError::DecodeError(..) => SubmitError::Rejected(GENERIC_SUBMIT_ERROR.to_owned()),
            _ => SubmitError::Network(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status: u16, body: &str) -> ClientError {
        ClientError::ApiError(
            status,
            Box::new(Url::parse("https://desk.example/api?endpoint=tickets").unwrap()),
            body.to_owned(),
        )
    }

    #[test]
    fn api_error_display_prefers_server_message() {
        let err = api_error(400, r#"{"error": "Сервис с ID 7 не найден"}"#);
        assert_eq!(err.api_message().as_deref(), Some("Сервис с ID 7 не найден"));
        assert!(err.to_string().contains("Сервис с ID 7 не найден"));
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn api_error_display_falls_back_to_raw_body() {
        let err = api_error(502, "Bad Gateway");
        assert_eq!(err.api_message(), None);
        assert!(err.to_string().contains("message='Bad Gateway'"));
    }

    #[test]
    fn submit_error_uses_generic_message_without_server_text() {
        let err: SubmitError = api_error(500, r#"{"error": ""}"#).into();
        assert_eq!(err.to_string(), GENERIC_SUBMIT_ERROR);

        let err: SubmitError = api_error(400, r#"{"error": "Validation error: title"}"#).into();
        assert_eq!(err.to_string(), "Validation error: title");
    }
}
