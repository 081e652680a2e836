use clap::{Parser, Subcommand};

use crate::{error::CapturedError, invocation_context::InvocationContext};

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// The helpdesk API to talk to, overriding HELPDESK_API_URL
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactively store a session token locally. You can also use the environment variable `HELPDESK_TOKEN`
    Login,

    /// Print a reference catalog as JSON
    Catalog {
        #[command(subcommand)]
        cmd: CatalogCommand,
    },

    /// Print the custom fields a ticket service and services resolve to
    Fields {
        #[arg(long)]
        ticket_service: i64,

        #[arg(long = "service", required = true)]
        services: Vec<i64>,
    },

    /// List and create tickets
    Tickets {
        #[command(subcommand)]
        cmd: TicketsCommand,
    },
}

#[derive(Subcommand, Clone, Copy)]
pub enum CatalogCommand {
    TicketServices,
    Services,
    Priorities,
    Statuses,
}

#[derive(Subcommand)]
pub enum TicketsCommand {
    /// List tickets visible to you
    List,

    /// Run the ticket creation wizard
    Create {
        /// Start with this ticket service chosen
        #[arg(long)]
        ticket_service: Option<i64>,

        /// Start with these services chosen, needs --ticket-service
        #[arg(long = "service", requires = "ticket_service")]
        services: Vec<i64>,
    },
}

impl Cli {
    pub async fn run() -> Result<(), CapturedError> {
        let Cli { api_url, command } = Cli::parse();
        // Login sets up credentials, so it runs without a context
        let context = || InvocationContext::init(api_url.clone());

        match command {
            Commands::Login => crate::login::login()?,
            Commands::Catalog { cmd } => crate::catalog::print_catalog(&context()?, cmd).await?,
            Commands::Fields {
                ticket_service,
                services,
            } => crate::catalog::print_fields(&context()?, ticket_service, &services).await?,
            Commands::Tickets { cmd } => match cmd {
                TicketsCommand::List => crate::tickets::list(&context()?).await?,
                TicketsCommand::Create {
                    ticket_service,
                    services,
                } => crate::wizard::run(&context()?, ticket_service, services).await?,
            },
        }

        Ok(())
    }
}
