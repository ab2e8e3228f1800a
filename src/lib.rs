//! # mailotp (Email One-Time Passcode Sign-In)
//!
//! `mailotp` signs a user in by emailing a six digit one-time passcode and
//! checking what they type back against the code held in memory.
//!
//! ## Flow
//!
//! [`signin::SignInFlow`] owns a single [`signin::Session`] and moves it
//! through `AwaitingEmail -> AwaitingOtp -> SignedIn`. Each operation updates
//! the session's user-facing notice; nothing is persisted and nothing leaves
//! the process except the dispatch request.
//!
//! ## Dispatch
//!
//! Codes are delivered through an [`emailjs::Dispatcher`]. The production
//! implementation is [`emailjs::EmailJsClient`], which calls the EmailJS REST
//! API; [`emailjs::LogDispatcher`] only logs and is meant for local runs.
//!
//! ## Caveat
//!
//! The passcode is generated and verified on the same side that asks for it.
//! This is a convenience gate, not an authentication boundary.

pub mod cli;
pub mod emailjs;
pub mod signin;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
