pub mod logging;
pub mod session;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const CMD_SERVE: &str = "serve";
pub const CMD_LOGIN: &str = "login";
pub const CMD_VERIFY: &str = "verify";

pub const ARG_PORT: &str = "port";
pub const ARG_STATIC_DIR: &str = "static-dir";
pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_TWO_FACTOR_TOKEN: &str = "two-factor-token";
pub const ARG_TOKEN: &str = "token";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("papercut-web")
        .about("PaperCut dashboard session and route guard")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(serve())
        .subcommand(session::with_args(login()))
        .subcommand(session::with_args(verify()));

    logging::with_args(command)
}

fn serve() -> Command {
    Command::new(CMD_SERVE)
        .about("Serve the dashboard bundle behind the route guard")
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("3000")
                .env("PAPERCUT_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_STATIC_DIR)
                .long(ARG_STATIC_DIR)
                .help("Directory holding the built dashboard (index.html and assets)")
                .default_value("./dist")
                .env("PAPERCUT_STATIC_DIR"),
        )
}

fn login() -> Command {
    Command::new(CMD_LOGIN)
        .about("Sign in and print the authenticated user")
        .arg(
            Arg::new(ARG_EMAIL)
                .long(ARG_EMAIL)
                .help("Account email")
                .env("PAPERCUT_EMAIL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .long(ARG_PASSWORD)
                .help("Account password")
                .env("PAPERCUT_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_TWO_FACTOR_TOKEN)
                .long(ARG_TWO_FACTOR_TOKEN)
                .help("Two-factor code, when the account requires one")
                .env("PAPERCUT_TWO_FACTOR_TOKEN")
                .hide_env_values(true),
        )
}

fn verify() -> Command {
    Command::new(CMD_VERIFY)
        .about("Verify a bearer token and print the session user")
        .arg(
            Arg::new(ARG_TOKEN)
                .long(ARG_TOKEN)
                .help("Bearer token to verify")
                .env("PAPERCUT_TOKEN")
                .hide_env_values(true)
                .required(true),
        )
}
