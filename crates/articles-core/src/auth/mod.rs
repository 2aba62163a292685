//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `Session`: explicit handle on the persisted session token
//! - `TokenStore`: the single named slot the token lives in, with file,
//!   OS keychain (`KeyringTokenStore`) and in-memory backends
//!
//! The slot is named `token`. Absence of a stored token means logged out.

pub mod credentials;
pub mod session;

pub use credentials::KeyringTokenStore;
pub use session::{FileTokenStore, MemoryTokenStore, Session, SessionData, TokenStore, TOKEN_SLOT};
