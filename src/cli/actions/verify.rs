use crate::session::{SessionConfig, SessionManager};
use anyhow::{Result, bail};
use secrecy::SecretString;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub session: SessionConfig,
    pub token: SecretString,
}

/// Verify a bearer token against the backend and print the session user.
/// # Errors
/// Returns an error if the backend does not confirm the session.
pub async fn execute(args: Args) -> Result<()> {
    let manager = SessionManager::new(args.session)?;
    manager.set_cached_token(args.token);
    manager.check_auth().await;

    let Some(user) = manager.user() else {
        bail!("Session is not authenticated");
    };

    info!(user = %user.display_name(), "Session verified");
    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}
