//! Map parsed CLI arguments to the action to run.

use crate::cli::actions::{Action, login, server, verify};
use crate::cli::commands::{
    ARG_EMAIL, ARG_PASSWORD, ARG_PORT, ARG_STATIC_DIR, ARG_TOKEN, ARG_TWO_FACTOR_TOKEN,
    CMD_LOGIN, CMD_SERVE, CMD_VERIFY, session,
};
use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use secrecy::SecretString;
use std::path::PathBuf;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((CMD_SERVE, sub)) => Ok(Action::Server(server::Args {
            port: sub.get_one::<u16>(ARG_PORT).copied().unwrap_or(3000),
            static_dir: sub
                .get_one::<String>(ARG_STATIC_DIR)
                .map_or_else(|| PathBuf::from("./dist"), PathBuf::from),
        })),
        Some((CMD_LOGIN, sub)) => Ok(Action::Login(login::Args {
            session: session::config(sub)?,
            email: required(sub, ARG_EMAIL)?,
            password: SecretString::from(required(sub, ARG_PASSWORD)?),
            two_factor_token: sub
                .get_one::<String>(ARG_TWO_FACTOR_TOKEN)
                .cloned()
                .map(SecretString::from),
        })),
        Some((CMD_VERIFY, sub)) => Ok(Action::Verify(verify::Args {
            session: session::config(sub)?,
            token: SecretString::from(required(sub, ARG_TOKEN)?),
        })),
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("missing command"),
    }
}

fn required(matches: &ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}
