//! Pure routing decision for a single request.
//!
//! Order matters: public classification, magic-link bypass, missing cookie,
//! cookie-bearing client on the login page, then allow.

use super::paths::{
    CREATE_PASSWORD_PATH, LOGIN_PATH, MAGIC_LINK_PARAM, RETURN_PATH_PARAM, is_page, is_public,
};
use url::form_urlencoded;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Magic link or password-creation page; no further checks.
    Bypass,
    /// Serve the page and describe the decision in response headers.
    Allow { authenticated: bool, public: bool },
    RedirectToLogin { location: String },
    RedirectToDashboard,
}

/// Decide what to do with a request for `path` (and optional raw `query`).
///
/// `has_auth_cookie` is presence only; validity is the backend's call.
#[must_use]
pub fn evaluate(path: &str, query: Option<&str>, has_auth_cookie: bool) -> Decision {
    let public = is_public(path);
    let magic_link = has_magic_link(query);

    if magic_link || is_page(path, CREATE_PASSWORD_PATH) {
        return Decision::Bypass;
    }

    if !has_auth_cookie && !public {
        return Decision::RedirectToLogin {
            location: login_location(path, query),
        };
    }

    if has_auth_cookie && is_page(path, LOGIN_PATH) {
        return Decision::RedirectToDashboard;
    }

    Decision::Allow {
        authenticated: has_auth_cookie,
        public,
    }
}

/// `/login?from=<path+query>` with the return path form-encoded.
#[must_use]
pub fn login_location(path: &str, query: Option<&str>) -> String {
    let mut original = path.to_string();
    if let Some(query) = query.filter(|query| !query.is_empty()) {
        original.push('?');
        original.push_str(query);
    }
    let encoded: String = form_urlencoded::byte_serialize(original.as_bytes()).collect();
    format!("{LOGIN_PATH}?{RETURN_PATH_PARAM}={encoded}")
}

fn has_magic_link(query: Option<&str>) -> bool {
    query.is_some_and(|query| {
        form_urlencoded::parse(query.as_bytes()).any(|(key, _)| key == MAGIC_LINK_PARAM)
    })
}
