use std::path::PathBuf;

use anyhow::{Context, Error};
use helpdesk_common::auth::AuthContext;
use inquire::{validator::Validation, CustomUserError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::homedir::{ensure_homedir_exists, helpdesk_home_dir};

const CREDENTIALS_FILE: &str = "credentials.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
}

impl From<Token> for AuthContext {
    fn from(token: Token) -> Self {
        AuthContext::new(token.token)
    }
}

pub trait CredentialProvider {
    fn get_credentials(&self) -> Result<Token, Error>;
    fn store_credentials(&self, token: Token) -> Result<(), Error>;
    fn report_location(&self) -> String;
}

pub struct HomeDirProvider {
    home: PathBuf,
}

impl HomeDirProvider {
    pub fn new() -> Result<Self, Error> {
        Ok(Self::with_home(helpdesk_home_dir()?))
    }

    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    fn file(&self) -> PathBuf {
        self.home.join(CREDENTIALS_FILE)
    }
}

impl CredentialProvider for HomeDirProvider {
    fn get_credentials(&self) -> Result<Token, Error> {
        let file = self.file();
        let token = std::fs::read_to_string(&file).with_context(|| {
            format!("While trying to read credentials from file {file:?}")
        })?;
        let token = serde_json::from_str(&token).context("While trying to parse token")?;
        Ok(token)
    }

    fn store_credentials(&self, token: Token) -> Result<(), Error> {
        ensure_homedir_exists(&self.home)?;
        let file = self.file();
        let token = serde_json::to_string(&token).context("While trying to serialize token")?;
        std::fs::write(&file, token)
            .with_context(|| format!("While trying to write credentials to file {file:?}"))?;
        Ok(())
    }

    fn report_location(&self) -> String {
        self.file().to_string_lossy().to_string()
    }
}

/// Tries to read the token from the env var `HELPDESK_TOKEN`
pub struct EnvVarProvider;

impl CredentialProvider for EnvVarProvider {
    fn get_credentials(&self) -> Result<Token, Error> {
        let token = std::env::var("HELPDESK_TOKEN").context("While trying to read env var")?;
        Ok(Token { token })
    }

    fn store_credentials(&self, _token: Token) -> Result<(), Error> {
        anyhow::bail!("Credentials cannot be stored in the environment")
    }

    fn report_location(&self) -> String {
        "HELPDESK_TOKEN".to_string()
    }
}

/// The token from the first provider that has one. `None` means requests go out anonymously.
pub fn find_token(providers: &[&dyn CredentialProvider]) -> Option<Token> {
    for provider in providers {
        match provider.get_credentials() {
            Ok(token) if !token.token.is_empty() => {
                debug!("Using credentials from {}", provider.report_location());
                return Some(token);
            }
            Ok(_) => debug!("Empty token in {}", provider.report_location()),
            Err(e) => debug!("No credentials: {e:#}"),
        }
    }
    None
}

pub fn load_token() -> Result<Option<Token>, Error> {
    let home = HomeDirProvider::new()?;
    Ok(find_token(&[&EnvVarProvider, &home]))
}

pub fn token_validator(token: &str) -> Result<Validation, CustomUserError> {
    if token.trim().is_empty() {
        return Ok(Validation::Invalid("Token cannot be empty".into()));
    }

    if token.chars().any(char::is_whitespace) {
        return Ok(Validation::Invalid(
            "Token looks wrong, it must not contain spaces".into(),
        ));
    }

    Ok(Validation::Valid)
}
