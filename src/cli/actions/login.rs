use crate::session::{SessionConfig, SessionManager};
use anyhow::{Context, Result, bail};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub session: SessionConfig,
    pub email: String,
    pub password: SecretString,
    pub two_factor_token: Option<SecretString>,
}

/// Sign in and print the verified user as JSON.
/// # Errors
/// Returns an error if the backend rejects the credentials, a two-factor code
/// is required but missing, or the session cannot be verified afterwards.
pub async fn execute(args: Args) -> Result<()> {
    let manager = SessionManager::new(args.session)?;

    let response = manager
        .login(
            &args.email,
            args.password.expose_secret(),
            args.two_factor_token
                .as_ref()
                .map(ExposeSecret::expose_secret),
        )
        .await
        .context("Login failed")?;

    if response.requires_two_factor {
        bail!("Two-factor code required, pass --two-factor-token");
    }

    let Some(user) = manager.user() else {
        bail!("Login succeeded but the session could not be verified");
    };

    info!(user = %user.display_name(), "Signed in");
    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}
