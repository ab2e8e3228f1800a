use rand::Rng;
use std::fmt;

/// Number of characters in a passcode.
pub const OTP_LENGTH: usize = 6;

const OTP_MIN: u32 = 100_000;
const OTP_MAX: u32 = 999_999;

/// A six digit one-time passcode.
///
/// Codes are drawn from `[100000, 999999]`, so the decimal rendering is always
/// exactly [`OTP_LENGTH`] ASCII digits and never needs zero padding.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Draw a fresh code uniformly from the passcode range.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let value = rng.gen_range(OTP_MIN..=OTP_MAX);
        Self(value.to_string())
    }

    /// Accept an existing code if it is exactly six ASCII digits.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        if is_well_formed(code) {
            Some(Self(code.to_string()))
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact string comparison against user input.
    #[must_use]
    pub fn matches(&self, input: &str) -> bool {
        self.0 == input
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OtpCode").field(&"***").finish()
    }
}

impl fmt::Display for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input length check applied before any comparison.
///
/// Only the length is enforced here; non-digit input of the right length is
/// simply a mismatch.
#[must_use]
pub fn has_otp_length(input: &str) -> bool {
    input.chars().count() == OTP_LENGTH
}

fn is_well_formed(code: &str) -> bool {
    code.len() == OTP_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}
