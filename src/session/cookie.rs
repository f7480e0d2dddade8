//! Auth cookie policy and storage.
//!
//! The `access_token_w` cookie is the only state shared between the session
//! manager (read/write) and the route guard (presence only). Its presence is
//! not proof of a valid session; the verify round-trip is the authority.
//!
//! Cross-site policy: the cookie is always `Secure` with `SameSite=None` so the
//! dashboard and the backend may live on different sites. A `Domain` attribute
//! is only emitted for real hostnames under the configured cookie domain;
//! `localhost` and IP literals get a host-only cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use std::{
    collections::HashMap,
    fmt,
    net::IpAddr,
    sync::{PoisonError, RwLock},
};
use time::{Duration, OffsetDateTime};

pub const AUTH_COOKIE_NAME: &str = "access_token_w";
pub const AUTH_COOKIE_PATH: &str = "/";

/// Auth cookie lifetime (1 day).
pub const AUTH_COOKIE_MAX_AGE: Duration = Duration::days(1);

/// Attributes applied to every auth cookie written by the session manager.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookiePolicy {
    domain: Option<String>,
}

impl CookiePolicy {
    /// Resolve the cookie domain for the host serving the dashboard.
    #[must_use]
    pub fn for_host(host: &str, configured_domain: Option<&str>) -> Self {
        Self {
            domain: cookie_domain_for(host, configured_domain),
        }
    }

    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Build a fresh auth cookie carrying `token`, valid for one day.
    #[must_use]
    pub fn auth_cookie(&self, token: &str) -> Cookie<'static> {
        let mut builder = Cookie::build((AUTH_COOKIE_NAME, token.to_string()))
            .path(AUTH_COOKIE_PATH)
            .secure(true)
            .same_site(SameSite::None)
            .max_age(AUTH_COOKIE_MAX_AGE)
            .expires(OffsetDateTime::now_utc() + AUTH_COOKIE_MAX_AGE);
        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        builder.build()
    }

    /// Build the expired cookie that tells a browser to drop the auth cookie.
    #[must_use]
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut builder = Cookie::build((AUTH_COOKIE_NAME, String::new()))
            .path(AUTH_COOKIE_PATH)
            .secure(true)
            .same_site(SameSite::None)
            .max_age(Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH);
        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        builder.build()
    }
}

fn cookie_domain_for(host: &str, configured_domain: Option<&str>) -> Option<String> {
    let host = strip_port(host.trim()).to_ascii_lowercase();
    if host.is_empty() || host == "localhost" || host.ends_with(".localhost") {
        return None;
    }
    if host.trim_matches(['[', ']']).parse::<IpAddr>().is_ok() {
        return None;
    }

    let domain = configured_domain?
        .trim()
        .trim_start_matches('.')
        .to_ascii_lowercase();
    if domain.is_empty() {
        return None;
    }

    if host == domain || host.ends_with(&format!(".{domain}")) {
        Some(domain)
    } else {
        None
    }
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literals keep their colons.
    if host.starts_with('[') {
        return host.split_once(']').map_or(host, |(addr, _)| addr);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}

/// Client-side cookie storage used by the session manager.
pub trait CookieStore: Send + Sync + fmt::Debug {
    /// Returns the named cookie unless it is missing or expired.
    fn get(&self, name: &str) -> Option<Cookie<'static>>;
    /// Store `cookie`. An already expired cookie (see
    /// [`CookiePolicy::removal_cookie`]) means the client should drop it.
    fn set(&self, cookie: Cookie<'static>);
    fn remove(&self, name: &str);
}

/// Process-local cookie store; nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryCookieStore {
    cookies: RwLock<HashMap<String, Cookie<'static>>>,
}

impl MemoryCookieStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<Cookie<'static>> {
        let cookie = self
            .cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()?;

        let expired = cookie
            .expires_datetime()
            .is_some_and(|expires| expires <= OffsetDateTime::now_utc());
        if expired {
            self.remove(name);
            return None;
        }
        Some(cookie)
    }

    fn set(&self, cookie: Cookie<'static>) {
        self.cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(cookie.name().to_string(), cookie);
    }

    fn remove(&self, name: &str) {
        self.cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }
}
