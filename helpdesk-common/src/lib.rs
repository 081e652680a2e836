//! Client-side building blocks for the helpdesk ticket creation flow: the
//! backend client, reference catalogs, custom field resolution, the creation
//! wizard and the create-ticket payload.
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod fields;
pub mod models;
pub mod reference;
pub mod resolver;
pub mod submission;
pub mod tickets;
pub mod wizard;
