use crate::session::SessionConfig;
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::time::Duration;

pub const ARG_API_BASE_URL: &str = "api-base-url";
pub const ARG_APP_HOST: &str = "app-host";
pub const ARG_COOKIE_DOMAIN: &str = "cookie-domain";
pub const ARG_VERIFY_TIMEOUT: &str = "verify-timeout";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_BASE_URL)
                .long(ARG_API_BASE_URL)
                .help("Backend API base URL, example: https://api.papercut.dev")
                .env("PAPERCUT_API_BASE_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_APP_HOST)
                .long(ARG_APP_HOST)
                .help("Host serving the dashboard, decides the auth cookie domain")
                .env("PAPERCUT_APP_HOST")
                .default_value("localhost"),
        )
        .arg(
            Arg::new(ARG_COOKIE_DOMAIN)
                .long(ARG_COOKIE_DOMAIN)
                .help("Cookie domain shared by the dashboard hosts, example: papercut.dev")
                .env("PAPERCUT_COOKIE_DOMAIN"),
        )
        .arg(
            Arg::new(ARG_VERIFY_TIMEOUT)
                .long(ARG_VERIFY_TIMEOUT)
                .help("Seconds before a session verification request is cancelled")
                .env("PAPERCUT_VERIFY_TIMEOUT")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..=300)),
        )
}

/// Build the session configuration from parsed arguments.
///
/// # Errors
/// Returns an error if the API base URL is missing or not a valid URL.
pub fn config(matches: &ArgMatches) -> Result<SessionConfig> {
    let api_base_url = matches
        .get_one::<String>(ARG_API_BASE_URL)
        .cloned()
        .context("missing required argument: --api-base-url")?;
    url::Url::parse(&api_base_url)
        .with_context(|| format!("Invalid API base URL: {api_base_url}"))?;

    let app_host = matches
        .get_one::<String>(ARG_APP_HOST)
        .cloned()
        .unwrap_or_else(|| "localhost".to_string());
    let verify_timeout = matches
        .get_one::<u64>(ARG_VERIFY_TIMEOUT)
        .copied()
        .unwrap_or(10);

    Ok(SessionConfig::new(api_base_url)
        .with_app_host(app_host)
        .with_cookie_domain(matches.get_one::<String>(ARG_COOKIE_DOMAIN).cloned())
        .with_verify_timeout(Duration::from_secs(verify_timeout)))
}
