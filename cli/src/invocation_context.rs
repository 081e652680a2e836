use anyhow::{Context, Result};
use envconfig::Envconfig;
use helpdesk_common::auth::AuthContext;
use helpdesk_common::client::DeskClient;
use helpdesk_common::config::Config;
use tracing::{debug, warn};

use crate::utils::auth::load_token;

/// Everything a command needs to talk to the backend, built once per invocation
/// and passed down explicitly.
pub struct InvocationContext {
    pub config: Config,
    pub client: DeskClient,
}

impl InvocationContext {
    pub fn init(api_url: Option<String>) -> Result<Self> {
        let mut config =
            Config::init_from_env().context("Failed to read configuration from environment")?;
        if let Some(api_url) = api_url {
            // If the user passed an API url, respect it
            config = config.with_api_url(api_url);
        }

        let auth = match load_token()? {
            Some(token) => AuthContext::from(token),
            None => {
                warn!("No credentials found, sending requests without a token. Run `helpdesk login` or set HELPDESK_TOKEN");
                AuthContext::anonymous()
            }
        };
        debug!(api_url = %config.api_url, ?auth, "invocation context ready");

        let client = DeskClient::new(&config, auth).context("Failed to build HTTP client")?;
        Ok(Self { config, client })
    }
}
