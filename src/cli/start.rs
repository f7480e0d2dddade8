use crate::cli::{actions::Action, commands, dispatch::handler, telemetry};
use anyhow::Result;
use tracing::Level;

/// Parse arguments, initialize telemetry and return the action to run.
/// # Errors
/// Returns an error if telemetry cannot be initialized or the arguments do not
/// map to an action.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let verbosity_level = get_verbosity_level(
        matches
            .get_one::<u8>(commands::logging::ARG_VERBOSITY)
            .copied(),
    );

    telemetry::init(verbosity_level)?;

    handler(&matches)
}

fn get_verbosity_level(verbose_count: Option<u8>) -> Option<Level> {
    match verbose_count {
        Some(0) | None => None,
        Some(1) => Some(Level::WARN),
        Some(2) => Some(Level::INFO),
        Some(3) => Some(Level::DEBUG),
        Some(_) => Some(Level::TRACE),
    }
}
