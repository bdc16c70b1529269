//! Client-side session management: persist a bearer token, restore the
//! session from it at start-up, and expose login, register, and logout.
//! This module touches security boundaries and must avoid logging passwords
//! or token material.
//!
//! Flow Overview: [`SessionManager::initialize`] reads the persisted token and,
//! when one exists, resolves it through `GET /api/auth/me`; any failure there
//! discards the token. Login and register exchange credentials for a token,
//! persist it, and publish the returned principal. Logout only clears local
//! state.

pub mod api;
pub mod error;
pub mod manager;
pub mod store;
pub mod types;

pub use api::{AuthApi, HttpAuthApi};
pub use error::{ApiError, SessionError, StoreError};
pub use manager::SessionManager;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
pub use types::{Role, Subscription, User};
