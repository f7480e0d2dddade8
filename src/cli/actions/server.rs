use crate::server;
use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub static_dir: PathBuf,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the static directory is missing or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    info!(
        port = args.port,
        static_dir = %args.static_dir.display(),
        "Starting dashboard edge"
    );
    server::new(args.port, args.static_dir).await
}
