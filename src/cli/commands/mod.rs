pub mod emailjs;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const ARG_DRY_RUN: &str = "dry-run";

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

    let command = Command::new("mailotp")
        .about("Sign in with a one-time passcode sent by email")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_DRY_RUN)
                .long(ARG_DRY_RUN)
                .help("Log passcodes instead of sending them through EmailJS")
                .env("MAILOTP_DRY_RUN")
                .action(ArgAction::SetTrue),
        );

    let command = emailjs::with_args(command);
    logging::with_args(command)
}
