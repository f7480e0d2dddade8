//! Session feature: authenticated-user state, the auth cookie, and the backend
//! auth client. This module touches security boundaries and must avoid logging
//! passwords or token material.
//!
//! Flow overview: login posts credentials, stores the returned token in the
//! `access_token_w` cookie, then verifies. The provider verifies once on mount
//! and arms a periodic refresh while a user is present. Logout always clears
//! local state, whatever the backend says.

pub mod client;
pub mod config;
pub mod cookie;
pub mod errors;
pub mod events;
pub mod manager;
pub mod provider;
pub mod types;

pub use client::AuthClient;
pub use config::SessionConfig;
pub use cookie::{AUTH_COOKIE_NAME, CookiePolicy, CookieStore, MemoryCookieStore};
pub use errors::AppError;
pub use events::{AuthEvent, AuthEvents};
pub use manager::SessionManager;
pub use provider::SessionProvider;
pub use types::{LoginResponse, SessionState, User};
