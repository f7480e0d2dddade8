//! # PaperCut dashboard edge
//!
//! `papercut-web` carries the authentication slice of the PaperCut
//! document-management dashboard.
//!
//! ## Session Manager
//!
//! [`session::SessionManager`] owns the authenticated-user state: login,
//! logout, periodic token refresh, and bootstrap verification against the
//! backend. It keeps the `access_token_w` auth cookie and the in-memory
//! session consistent. The backend stays the authority: a failed verify always
//! clears local state, while a failed refresh is a soft failure that leaves the
//! session untouched.
//!
//! ## Route Guard
//!
//! [`guard`] runs before any page is served. It only checks the *presence* of
//! the auth cookie to decide between allow, redirect-to-login (with a `from`
//! return path), and redirect-away-from-login. It is advisory; protected API
//! calls must still be rejected by the backend.
//!
//! ## Edge server
//!
//! [`server`] puts the guard in front of the compiled dashboard bundle and
//! exposes `/health`.

pub mod cli;
pub mod guard;
pub mod server;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
