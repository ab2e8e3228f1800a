use crate::signin::otp::OtpCode;
use std::fmt;

/// Where the user is in the sign-in sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    AwaitingEmail,
    AwaitingOtp,
    SignedIn,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitingEmail => "awaiting-email",
            Self::AwaitingOtp => "awaiting-otp",
            Self::SignedIn => "signed-in",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// Last user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoticeKind::Info,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoticeKind::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoticeKind::Error,
        }
    }
}

/// In-memory sign-in state. Only [`crate::signin::SignInFlow`] mutates it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub(crate) email: String,
    pub(crate) pending_otp: Option<OtpCode>,
    pub(crate) user_input: String,
    pub(crate) phase: Phase,
    pub(crate) status: Option<Notice>,
    pub(crate) busy: bool,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn pending_otp(&self) -> Option<&OtpCode> {
        self.pending_otp.as_ref()
    }

    #[must_use]
    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn status(&self) -> Option<&Notice> {
        self.status.as_ref()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.phase == Phase::SignedIn
    }

    pub(crate) fn notify(&mut self, notice: Notice) {
        self.status = Some(notice);
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_awaits_email() {
        let session = Session::new();
        assert_eq!(session.phase(), Phase::AwaitingEmail);
        assert!(session.email().is_empty());
        assert!(session.pending_otp().is_none());
        assert!(session.user_input().is_empty());
        assert!(session.status().is_none());
        assert!(!session.is_busy());
        assert!(!session.is_signed_in());
    }

    #[test]
    fn clear_restores_defaults() {
        let mut session = Session::new();
        session.email = "user@example.com".to_string();
        session.pending_otp = OtpCode::parse("123456");
        session.user_input = "123456".to_string();
        session.phase = Phase::SignedIn;
        session.busy = true;
        session.notify(Notice::success("done"));

        session.clear();

        assert_eq!(session.phase(), Phase::AwaitingEmail);
        assert!(session.email().is_empty());
        assert!(session.pending_otp().is_none());
        assert!(session.user_input().is_empty());
        assert!(session.status().is_none());
        assert!(!session.is_busy());
    }

    #[test]
    fn phase_display() {
        assert_eq!(Phase::AwaitingEmail.to_string(), "awaiting-email");
        assert_eq!(Phase::AwaitingOtp.to_string(), "awaiting-otp");
        assert_eq!(Phase::SignedIn.to_string(), "signed-in");
    }

    #[test]
    fn notice_constructors() {
        assert_eq!(Notice::info("a").kind, NoticeKind::Info);
        assert_eq!(Notice::success("b").kind, NoticeKind::Success);
        assert_eq!(Notice::error("c").kind, NoticeKind::Error);
    }
}
