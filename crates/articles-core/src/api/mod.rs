//! REST API client module for the articles backend.
//!
//! This module provides the `AuthClient` and `ResourceClient` seams used by
//! the controller, and `ApiClient`, their HTTP implementation.
//!
//! Login is unauthenticated; every article call carries the session token
//! in the `Authorization` header.

pub mod client;
pub mod error;

pub use client::{ApiClient, AuthClient, ResourceClient, DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::ApiError;
