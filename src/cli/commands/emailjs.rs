use crate::emailjs::client::{
    DEFAULT_API_URL, DEFAULT_PUBLIC_KEY, DEFAULT_SERVICE_ID, DEFAULT_TEMPLATE_ID,
};
use clap::{Arg, Command};

pub const ARG_SERVICE_ID: &str = "emailjs-service-id";
pub const ARG_TEMPLATE_ID: &str = "emailjs-template-id";
pub const ARG_PUBLIC_KEY: &str = "emailjs-public-key";
pub const ARG_PRIVATE_KEY: &str = "emailjs-private-key";
pub const ARG_API_URL: &str = "emailjs-api-url";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SERVICE_ID)
                .long(ARG_SERVICE_ID)
                .help("EmailJS service ID")
                .env("MAILOTP_EMAILJS_SERVICE_ID")
                .default_value(DEFAULT_SERVICE_ID),
        )
        .arg(
            Arg::new(ARG_TEMPLATE_ID)
                .long(ARG_TEMPLATE_ID)
                .help("EmailJS template ID")
                .long_help(
                    "EmailJS template ID. The template receives `to_email` and `otp_code` as parameters.",
                )
                .env("MAILOTP_EMAILJS_TEMPLATE_ID")
                .default_value(DEFAULT_TEMPLATE_ID),
        )
        .arg(
            Arg::new(ARG_PUBLIC_KEY)
                .long(ARG_PUBLIC_KEY)
                .help("EmailJS public key")
                .env("MAILOTP_EMAILJS_PUBLIC_KEY")
                .hide_env_values(true)
                .default_value(DEFAULT_PUBLIC_KEY),
        )
        .arg(
            Arg::new(ARG_PRIVATE_KEY)
                .long(ARG_PRIVATE_KEY)
                .help("EmailJS private key, required when the account enforces strict mode")
                .env("MAILOTP_EMAILJS_PRIVATE_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("EmailJS API base URL")
                .env("MAILOTP_EMAILJS_API_URL")
                .default_value(DEFAULT_API_URL),
        )
}
