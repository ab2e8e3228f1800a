//! Command-line argument dispatch.
//!
//! Maps parsed CLI arguments to the sign-in action with its EmailJS settings.

use crate::cli::actions::{signin::Args, Action};
use crate::cli::commands::{emailjs, ARG_DRY_RUN};
use crate::emailjs::EmailJsConfig;
use anyhow::{Context, Result};
use secrecy::SecretString;

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}

/// Map CLI matches to the sign-in action.
///
/// # Errors
/// Returns an error if required arguments are missing or the API URL is invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let service_id = required(matches, emailjs::ARG_SERVICE_ID)?;
    let template_id = required(matches, emailjs::ARG_TEMPLATE_ID)?;
    let public_key = SecretString::from(required(matches, emailjs::ARG_PUBLIC_KEY)?);
    let private_key = matches
        .get_one::<String>(emailjs::ARG_PRIVATE_KEY)
        .cloned()
        .map(SecretString::from);
    let api_url = required(matches, emailjs::ARG_API_URL)?;

    let emailjs = EmailJsConfig::new(service_id, template_id, public_key, &api_url)?
        .with_private_key(private_key);

    Ok(Action::SignIn(Args {
        emailjs,
        dry_run: matches.get_flag(ARG_DRY_RUN),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn test_handler_builds_signin_action() {
        temp_env::with_vars([("MAILOTP_EMAILJS_PRIVATE_KEY", None::<&str>)], || {
            let matches = commands::new().get_matches_from(vec![
                "mailotp",
                "--emailjs-service-id",
                "service_abc",
                "--emailjs-template-id",
                "template_xyz",
                "--emailjs-public-key",
                "public-key",
                "--dry-run",
            ]);

            let Action::SignIn(args) = handler(&matches).unwrap();
            assert!(args.dry_run);
            assert_eq!(args.emailjs.service_id, "service_abc");
            assert_eq!(args.emailjs.template_id, "template_xyz");
            assert_eq!(args.emailjs.public_key.expose_secret(), "public-key");
            assert!(args.emailjs.private_key.is_none());
        });
    }

    #[test]
    fn test_handler_rejects_bad_api_url() {
        let matches = commands::new().get_matches_from(vec![
            "mailotp",
            "--emailjs-api-url",
            "not a url",
        ]);
        assert!(handler(&matches).is_err());
    }
}
