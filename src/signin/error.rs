use crate::emailjs::DispatchError;
use thiserror::Error;

/// Broad classes of sign-in failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed email or passcode input; nothing was attempted.
    Validation,
    /// The email service rejected or never answered the send.
    Dispatch,
    /// Passcode compared unequal.
    Mismatch,
    /// A send is already in flight.
    Busy,
    /// The flow is signed in; only a reset leaves that state.
    SignedIn,
}

/// Errors returned by [`crate::signin::SignInFlow`] operations.
///
/// The `Display` text is the notice shown to the user.
#[derive(Debug, Error)]
pub enum SignInError {
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Please enter a 6-digit OTP")]
    InvalidOtpFormat,
    #[error("Failed to send OTP. Please try again.")]
    Dispatch(#[source] DispatchError),
    #[error("Invalid OTP. Please try again.")]
    Mismatch,
    #[error("An OTP request is already in progress")]
    Busy,
    #[error("Already signed in. Sign out to start over.")]
    AlreadySignedIn,
}

impl SignInError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEmail | Self::InvalidOtpFormat => ErrorKind::Validation,
            Self::Dispatch(_) => ErrorKind::Dispatch,
            Self::Mismatch => ErrorKind::Mismatch,
            Self::Busy => ErrorKind::Busy,
            Self::AlreadySignedIn => ErrorKind::SignedIn,
        }
    }
}
