//! Email and passcode sign-in state machine.
//!
//! ```text
//! AwaitingEmail --request_otp ok--> AwaitingOtp --verify_otp match--> SignedIn
//!       ^                              |   ^                              |
//!       +------------ go_back ---------+   +-- request_otp ok (resend)    |
//!       +------------------------------ reset ----------------------------+
//! ```
//!
//! Failed sends and failed comparisons leave the phase where it was and only
//! update the session notice.

pub mod error;
pub mod flow;
pub mod otp;
pub mod session;

pub use self::error::{ErrorKind, SignInError};
pub use self::flow::{DispatchTicket, SignInFlow};
pub use self::otp::{OtpCode, OTP_LENGTH};
pub use self::session::{Notice, NoticeKind, Phase, Session};
