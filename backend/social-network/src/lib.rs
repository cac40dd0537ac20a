/// Social Network Service Library
///
/// Users, posts, comments, likes and follows behind a REST API, with
/// role-based permissions and deferred post publishing.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and representations
/// - `services`: Business logic layer
/// - `domain`: Permission evaluator, toggles, search and scheduling rules
/// - `repository`: Storage traits with PostgreSQL and in-memory backends
/// - `jobs`: Background workers
/// - `middleware`: Bearer token authentication
/// - `error`: Error types and handling
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use repository::Repositories;
pub use routes::configure_routes;
