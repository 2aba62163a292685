//! Core library for the articles client.
//!
//! - `api`: HTTP client and the `AuthClient`/`ResourceClient` seams
//! - `auth`: session token persistence
//! - `models`: wire types
//! - `controller`: the session controller driving the UI state
//! - `config`: user configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod controller;
pub mod models;

pub use api::{ApiClient, ApiError, AuthClient, ResourceClient};
pub use auth::Session;
pub use config::Config;
pub use controller::{Route, SessionController};
