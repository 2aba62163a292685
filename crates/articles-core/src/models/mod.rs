//! Data models for the articles service.
//!
//! This module contains the wire types exchanged with the backend:
//!
//! - `Article`, `ArticleDraft`, `Topic`: the article collection
//! - `Credentials`: login form input
//! - Response envelopes carrying the server's status message

pub mod article;
pub mod auth;

pub use article::{Article, ArticleDraft, ArticleId, Topic};
pub use auth::{Credentials, LoginResponse};
pub use article::{ArticleResponse, ArticlesResponse, MessageResponse};

use thiserror::Error;

/// Client-side input validation failure. Carries the text shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);
