//! Route tables consulted by the guard.

use regex::Regex;
use std::sync::LazyLock;

pub const ROOT_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const CREATE_PASSWORD_PATH: &str = "/create-password";

/// Query parameter carrying a one-time magic-link token.
pub const MAGIC_LINK_PARAM: &str = "token";
/// Query parameter carrying the post-login return path.
pub const RETURN_PATH_PARAM: &str = "from";

/// Route prefixes that never require the auth cookie.
pub const PUBLIC_PATHS: &[&str] = &[
    LOGIN_PATH,
    "/register",
    "/forgot-password",
    "/reset-password",
    CREATE_PASSWORD_PATH,
    "/verify-email",
    "/privacy-policy",
    "/terms-and-conditions",
];

static STATIC_ASSET: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^/(?:_next/static/|_next/image|favicon\.ico$|assets/)|\.(?:svg|png|jpg|jpeg|gif|webp)$",
    )
    .ok()
});

/// Segment-aware prefix match: `/login` covers `/login` and `/login/…` only.
#[must_use]
pub fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[must_use]
pub fn is_public(path: &str) -> bool {
    path == ROOT_PATH || PUBLIC_PATHS.iter().any(|prefix| matches_prefix(path, prefix))
}

/// Static assets and images are served without consulting the guard.
#[must_use]
pub fn is_static_asset(path: &str) -> bool {
    STATIC_ASSET
        .as_ref()
        .is_some_and(|regex| regex.is_match(&path.to_ascii_lowercase()))
}

/// Trailing slashes are ignored when comparing against a single page.
#[must_use]
pub fn is_page(path: &str, page: &str) -> bool {
    let trimmed = path.trim_end_matches('/');
    trimmed == page
}
