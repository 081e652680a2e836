use std::collections::HashMap;
use std::str::FromStr;
use std::time;

use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "HELPDESK_API_URL", default = "http://localhost:8000/api")]
    pub api_url: String,

    /// Alternate base for `endpoint=services` requests.
    #[envconfig(from = "HELPDESK_SERVICES_URL")]
    pub services_url: Option<String>,

    #[envconfig(from = "HELPDESK_FIELD_GROUPS_URL")]
    pub field_groups_url: Option<String>,

    #[envconfig(from = "HELPDESK_SERVICE_FIELD_MAPPINGS_URL")]
    pub service_field_mappings_url: Option<String>,

    /// Base for `/companies`, `/departments`, `/positions` and `/department-positions`.
    #[envconfig(from = "HELPDESK_STRUCTURE_URL")]
    pub structure_url: Option<String>,

    #[envconfig(from = "HELPDESK_REQUEST_TIMEOUT_MS", default = "10000")]
    pub request_timeout: EnvMsDuration,
}

impl Config {
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn field_groups_url(&self) -> String {
        self.field_groups_url
            .clone()
            .unwrap_or_else(|| endpoint_on(&self.api_url, "field-groups"))
    }

    pub fn service_field_mappings_url(&self) -> String {
        self.service_field_mappings_url
            .clone()
            .unwrap_or_else(|| endpoint_on(&self.api_url, "service-field-mappings"))
    }

    pub fn structure_url(&self) -> &str {
        self.structure_url.as_deref().unwrap_or(&self.api_url)
    }

    /// Endpoints served from a different base than `api_url`, keyed by the
    /// value of their `endpoint` query parameter.
    pub fn endpoint_overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(url) = &self.services_url {
            overrides.insert("services".to_owned(), url.clone());
        }
        overrides
    }
}

fn endpoint_on(base: &str, endpoint: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}endpoint={endpoint}")
}

#[derive(Debug, Clone, Copy)]
pub struct EnvMsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvMsDurationError;

impl FromStr for EnvMsDuration {
    type Err = ParseEnvMsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.parse::<u64>().map_err(|_| ParseEnvMsDurationError)?;

        Ok(EnvMsDuration(time::Duration::from_millis(ms)))
    }
}
