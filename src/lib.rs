#![doc = "The `taskdeck` library crate."]
#![doc = ""]
#![doc = "Users, task lists and tasks behind password login and signed access tokens."]
#![doc = "Persistence goes through the generic `repository::Repository` trait, with a"]
#![doc = "Postgres store for production and an in-memory store for tests and embedding."]
#![doc = "An HTTP layer is expected to sit on top: `AppError` renders as a JSON response and"]
#![doc = "`auth::AuthenticatedUser` extracts the caller from a bearer token."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod notifications;
pub mod repository;
pub mod services;

pub use crate::config::Config;
pub use crate::error::AppError;
pub use crate::services::Services;
