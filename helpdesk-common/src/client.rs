use std::collections::HashMap;
use std::sync::Arc;

use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, Method, RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use url::Url;

use crate::auth::{AuthContext, AUTH_HEADER};
use crate::config::Config;
use crate::error::ClientError;

/// HTTP client for the helpdesk backend. Cheap to clone.
#[derive(Clone)]
pub struct DeskClient {
    client: Client,
    auth: AuthContext,
    urls: Arc<Urls>,
}

struct Urls {
    api: String,
    structure: String,
    field_groups: String,
    service_field_mappings: String,
    endpoint_overrides: HashMap<String, String>,
}

impl DeskClient {
    pub fn new(config: &Config, auth: AuthContext) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent("helpdesk-cli")
            .timeout(config.request_timeout.0)
            .build()?;

        let urls = Urls {
            api: config.api_url.clone(),
            structure: config.structure_url().to_owned(),
            field_groups: config.field_groups_url(),
            service_field_mappings: config.service_field_mappings_url(),
            endpoint_overrides: config.endpoint_overrides(),
        };

        Ok(Self {
            client,
            auth,
            urls: Arc::new(urls),
        })
    }

    /// `{api}?endpoint=<endpoint>`, redirected when that endpoint has an override.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, ClientError> {
        let mut url = parse_url(&self.urls.api)?;
        url.query_pairs_mut().append_pair("endpoint", endpoint);
        Ok(self.redirect(url))
    }

    /// `{structure}/<path>`, for the company structure directory.
    pub fn structure_url(&self, path: &str) -> Result<Url, ClientError> {
        let base = self.urls.structure.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        parse_url(&format!("{base}/{path}"))
    }

    pub fn field_groups_url(&self) -> Result<Url, ClientError> {
        parse_url(&self.urls.field_groups).map(|url| self.redirect(url))
    }

    pub fn service_field_mappings_url(&self) -> Result<Url, ClientError> {
        parse_url(&self.urls.service_field_mappings).map(|url| self.redirect(url))
    }

    /// Sends requests whose `endpoint` query parameter has an override to the
    /// override base, keeping the query string.
    pub fn redirect(&self, url: Url) -> Url {
        let endpoint = url
            .query_pairs()
            .find(|(key, _)| key == "endpoint")
            .map(|(_, value)| value.into_owned());

        let Some(base) = endpoint
            .as_deref()
            .and_then(|e| self.urls.endpoint_overrides.get(e))
        else {
            return url;
        };

        match Url::parse(base) {
            Ok(mut target) => {
                target.set_query(url.query());
                debug!("redirecting {url} -> {target}");
                target
            }
            Err(e) => {
                debug!("ignoring unparseable override {base}: {e}");
                url
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        let response = self.send_request(Method::GET, url, |req| req).await?;
        decode(response).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .send_request(Method::POST, url, |req| req.json(body))
            .await?;
        decode(response).await
    }

    pub async fn send_request<F: FnOnce(RequestBuilder) -> RequestBuilder>(
        &self,
        method: Method,
        url: Url,
        builder: F,
    ) -> Result<Response, ClientError> {
        let request = builder(self.create_request(method, url));
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let url = Box::new(response.url().clone());
            let body = response.text().await?;
            Err(ClientError::ApiError(status, url, body))
        }
    }

    fn create_request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("building request for {method} {url}");
        let request = self.client.request(method, url);
        match self.auth.token() {
            Some(token) => request.header(AUTH_HEADER, token),
            None => request,
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let url = Box::new(response.url().clone());
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ClientError::DecodeError(url, e))
}

fn parse_url(raw: &str) -> Result<Url, ClientError> {
    Url::parse(raw).map_err(|e| ClientError::InvalidUrl(format!("{e} {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with(pairs: &[(&str, &str)]) -> DeskClient {
        use envconfig::Envconfig;

        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = Config::init_from_hashmap(&env).unwrap();
        DeskClient::new(&config, AuthContext::anonymous()).unwrap()
    }

    #[test]
    fn endpoint_url_appends_endpoint_param() {
        let client = client_with(&[("HELPDESK_API_URL", "https://desk.example/api")]);
        let url = client.endpoint_url("ticket-services").unwrap();
        assert_eq!(url.as_str(), "https://desk.example/api?endpoint=ticket-services");
    }

    #[test]
    fn overridden_endpoint_is_redirected_with_its_query() {
        let client = client_with(&[
            ("HELPDESK_API_URL", "https://desk.example/api"),
            ("HELPDESK_SERVICES_URL", "https://services.example/fn"),
        ]);

        let url = client.endpoint_url("services").unwrap();
        assert_eq!(url.as_str(), "https://services.example/fn?endpoint=services");

        let untouched = client.endpoint_url("tickets").unwrap();
        assert_eq!(untouched.as_str(), "https://desk.example/api?endpoint=tickets");
    }

    #[test]
    fn structure_url_joins_paths() {
        let client = client_with(&[
            ("HELPDESK_API_URL", "https://desk.example/api"),
            ("HELPDESK_STRUCTURE_URL", "https://org.example/"),
        ]);
        assert_eq!(
            client.structure_url("/department-positions").unwrap().as_str(),
            "https://org.example/department-positions"
        );
    }

    #[test]
    fn invalid_api_url_is_reported() {
        let client = client_with(&[("HELPDESK_API_URL", "not a url")]);
        assert!(matches!(
            client.endpoint_url("tickets"),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
