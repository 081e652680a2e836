pub mod catalog;
pub mod commands;
pub mod error;
pub mod invocation_context;
pub mod login;
pub mod tickets;
pub mod utils;
pub mod wizard;

pub mod cmd {
    pub use super::commands::Cli;
}
