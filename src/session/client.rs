//! HTTP client for the backend auth endpoints. Requests carry the auth cookie
//! (the credentialed part) and an optional cached bearer token; neither is ever
//! logged. Error bodies are trimmed and truncated before they reach callers.

use super::{
    errors::AppError,
    types::{LoginRequest, LoginResponse, RefreshResponse, User, VerifyResponse},
};
use crate::APP_USER_AGENT;
use reqwest::{
    Client, RequestBuilder, Response,
    header::{ACCEPT, COOKIE},
};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const LOGIN_PATH: &str = "/auth/login";
pub const VERIFY_PATH: &str = "/auth/verify";
pub const REFRESH_TOKEN_PATH: &str = "/auth/refresh-token";
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

/// Credentials attached to session-authenticated calls.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    /// Rendered `name=value` pair for the `Cookie` header.
    pub cookie: Option<String>,
    pub bearer: Option<SecretString>,
}

impl Credentials {
    fn apply(&self, mut builder: RequestBuilder) -> RequestBuilder {
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie);
        }
        if let Some(token) = &self.bearer {
            builder = builder.bearer_auth(token.expose_secret());
        }
        builder
    }
}

#[derive(Clone, Debug)]
pub struct AuthClient {
    http: Client,
    base_url: String,
    request_timeout: Duration,
}

impl AuthClient {
    /// Build a client for the backend rooted at `base_url`.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the base URL is empty or the HTTP client cannot be built.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(AppError::Config(
                "Auth API base URL is not configured.".to_string(),
            ));
        }
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            request_timeout,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /auth/login`.
    ///
    /// # Errors
    /// Returns the backend rejection or transport failure unchanged.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AppError> {
        let response = self
            .http
            .post(self.url(LOGIN_PATH))
            .header(ACCEPT, "application/json")
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await
            .map_err(map_request_error)?;

        handle_json_response(response).await
    }

    /// `GET /auth/verify`, bounded by `timeout`.
    ///
    /// Returns `Ok(None)` when the backend answers OK without a user payload.
    ///
    /// # Errors
    /// Returns `AppError::Timeout` once `timeout` elapses, otherwise the transport or HTTP error.
    pub async fn verify(
        &self,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Option<User>, AppError> {
        let builder = self
            .http
            .get(self.url(VERIFY_PATH))
            .header(ACCEPT, "application/json");

        let exchange = async {
            let response = credentials
                .apply(builder)
                .send()
                .await
                .map_err(map_request_error)?;
            handle_json_response::<VerifyResponse>(response).await
        };

        // Dropping the future aborts the in-flight request.
        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result.map(|body| body.user),
            Err(_) => Err(AppError::Timeout(format!(
                "Session verification exceeded {}s.",
                timeout.as_secs_f32()
            ))),
        }
    }

    /// `POST /auth/refresh-token` and return the new bearer token.
    ///
    /// # Errors
    /// Returns the transport, HTTP, or decode error.
    pub async fn refresh_token(&self, credentials: &Credentials) -> Result<String, AppError> {
        let builder = self
            .http
            .post(self.url(REFRESH_TOKEN_PATH))
            .header(ACCEPT, "application/json")
            .timeout(self.request_timeout);
        let response = credentials
            .apply(builder)
            .send()
            .await
            .map_err(map_request_error)?;

        let body: RefreshResponse = handle_json_response(response).await?;
        if body.access_token.trim().is_empty() {
            return Err(AppError::Parse(
                "Refresh response carried an empty token.".to_string(),
            ));
        }
        Ok(body.access_token)
    }

    /// `POST /auth/logout`; the response body is ignored.
    ///
    /// # Errors
    /// Returns the transport or HTTP error.
    pub async fn logout(&self, credentials: &Credentials) -> Result<(), AppError> {
        let builder = self
            .http
            .post(self.url(LOGOUT_PATH))
            .timeout(self.request_timeout);
        let response = credentials
            .apply(builder)
            .send()
            .await
            .map_err(map_request_error)?;

        handle_empty_response(response).await
    }

    fn url(&self, path: &str) -> String {
        build_url_with_base(&self.base_url, path)
    }
}

/// Builds a URL from an explicit base URL and the provided path.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

fn map_request_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_decode() {
        AppError::Parse(format!("Failed to decode response: {err}"))
    } else if err.is_builder() {
        AppError::Serialization(format!("Failed to build request: {err}"))
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    if response.status().is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
    } else {
        Err(http_error(response).await)
    }
}

async fn handle_empty_response(response: Response) -> Result<(), AppError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(http_error(response).await)
    }
}

async fn http_error(response: Response) -> AppError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    AppError::Http {
        status,
        message: sanitize_body(&body),
    }
}

/// Trims and truncates HTTP error bodies for user-facing messages.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
