use super::{
    decision::{Decision, evaluate},
    paths::{DASHBOARD_PATH, is_static_asset},
};
use crate::session::AUTH_COOKIE_NAME;
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

pub const AUTH_STATUS_HEADER: HeaderName = HeaderName::from_static("x-auth-status");
pub const ROUTE_TYPE_HEADER: HeaderName = HeaderName::from_static("x-route-type");

/// Gate every page request on the presence of the auth cookie.
///
/// UX-only: it avoids flashing protected pages to clients without a cookie and
/// avoids redirect loops. Real access control lives in the backend.
pub async fn route_guard(jar: CookieJar, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if is_static_asset(path) {
        return next.run(request).await;
    }

    let has_auth_cookie = jar
        .get(AUTH_COOKIE_NAME)
        .is_some_and(|cookie| !cookie.value().is_empty());

    match evaluate(path, request.uri().query(), has_auth_cookie) {
        Decision::Bypass => next.run(request).await,
        Decision::RedirectToLogin { location } => {
            debug!(path = request.uri().path(), "No auth cookie, redirecting to login");
            Redirect::temporary(&location).into_response()
        }
        Decision::RedirectToDashboard => {
            debug!("Auth cookie present on login page, redirecting to dashboard");
            Redirect::temporary(DASHBOARD_PATH).into_response()
        }
        Decision::Allow {
            authenticated,
            public,
        } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(
                AUTH_STATUS_HEADER,
                HeaderValue::from_static(if authenticated {
                    "authenticated"
                } else {
                    "unauthenticated"
                }),
            );
            headers.insert(
                ROUTE_TYPE_HEADER,
                HeaderValue::from_static(if public { "public" } else { "protected" }),
            );
            response
        }
    }
}
