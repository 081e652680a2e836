use std::io::{self, IsTerminal};

use anyhow::{bail, Error};
use inquire::Text;
use tracing::info;

use crate::utils::auth::{token_validator, CredentialProvider, HomeDirProvider, Token};

pub fn login() -> Result<(), Error> {
    if !io::stdout().is_terminal() {
        bail!("Failed to login. When running non-interactively, set the HELPDESK_TOKEN env variable instead")
    }

    let token = Text::new("Enter your helpdesk session token")
        .with_validator(token_validator)
        .with_help_message("Copy it from the X-Auth-Token of a signed-in browser session")
        .prompt()?;

    let token = Token {
        token: token.trim().to_string(),
    };
    let provider = HomeDirProvider::new()?;
    provider.store_credentials(token)?;
    info!("Token saved to: {}", provider.report_location());

    println!();
    println!("You can now use the CLI:");
    println!("  helpdesk tickets create");
    println!();

    Ok(())
}
