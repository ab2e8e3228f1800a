use crate::emailjs::{DispatchError, Dispatcher, OtpMessage};
use crate::signin::{
    error::SignInError,
    otp::{has_otp_length, OtpCode},
    session::{Notice, Phase, Session},
};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, instrument, warn};
use ulid::Ulid;

pub const OTP_SENT: &str = "OTP sent! Please check your inbox.";
pub const SIGNED_IN: &str = "Successfully signed in!";

/// A send that has been started but not yet resolved.
///
/// Returned by [`SignInFlow::begin_request`] and handed back to
/// [`SignInFlow::complete_request`] once the dispatcher answers.
#[derive(Debug)]
pub struct DispatchTicket {
    generation: u64,
    message: OtpMessage,
}

impl DispatchTicket {
    #[must_use]
    pub fn message(&self) -> &OtpMessage {
        &self.message
    }
}

/// Email then passcode sign-in.
///
/// Owns the [`Session`] and the [`Dispatcher`] used to deliver codes. Every
/// operation records a user-facing [`Notice`] on the session in addition to
/// returning a typed result.
pub struct SignInFlow<D> {
    session: Session,
    dispatcher: D,
    rng: StdRng,
    generation: u64,
    flow_id: Ulid,
}

impl<D: Dispatcher> SignInFlow<D> {
    /// New flow with an entropy-seeded generator.
    pub fn new(dispatcher: D) -> Self {
        Self::with_rng(dispatcher, StdRng::from_entropy())
    }

    pub fn with_rng(dispatcher: D, rng: StdRng) -> Self {
        Self {
            session: Session::new(),
            dispatcher,
            rng,
            generation: 0,
            flow_id: Ulid::new(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    #[must_use]
    pub fn status(&self) -> Option<&Notice> {
        self.session.status()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.session.is_busy()
    }

    #[must_use]
    pub fn email(&self) -> &str {
        self.session.email()
    }

    #[must_use]
    pub fn user_input(&self) -> &str {
        self.session.user_input()
    }

    #[must_use]
    pub fn pending_otp(&self) -> Option<&OtpCode> {
        self.session.pending_otp()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.session.is_signed_in()
    }

    /// Edit the candidate address. Only accepted while the email step is
    /// showing and no send is in flight.
    pub fn set_email(&mut self, email: &str) -> bool {
        if self.session.phase != Phase::AwaitingEmail || self.session.busy {
            return false;
        }
        self.session.email = email.to_string();
        true
    }

    pub fn set_user_input(&mut self, input: &str) {
        self.session.user_input = input.to_string();
    }

    /// Validate `email`, draw a fresh passcode and mark the session busy.
    ///
    /// The previous passcode, if any, stops validating as soon as this returns.
    ///
    /// # Errors
    /// `Busy` if a send is already in flight and `AlreadySignedIn` once the
    /// flow is signed in (nothing changes in either case), `InvalidEmail` if
    /// the address is empty or has no `@`.
    #[instrument(skip_all, fields(flow_id = %self.flow_id))]
    pub fn begin_request(&mut self, email: &str) -> Result<DispatchTicket, SignInError> {
        if self.session.busy {
            debug!("OTP request rejected: dispatch already in flight");
            return Err(SignInError::Busy);
        }

        if self.session.phase == Phase::SignedIn {
            debug!("OTP request rejected: already signed in");
            return Err(SignInError::AlreadySignedIn);
        }

        self.session.email = email.to_string();

        if email.is_empty() || !email.contains('@') {
            return Err(self.fail(SignInError::InvalidEmail));
        }

        self.session.status = None;

        let code = OtpCode::generate(&mut self.rng);
        self.session.pending_otp = Some(code.clone());
        self.session.busy = true;
        self.generation = self.generation.wrapping_add(1);

        debug!(generation = self.generation, "OTP generated");

        Ok(DispatchTicket {
            generation: self.generation,
            message: OtpMessage {
                to_email: email.to_string(),
                otp_code: code,
            },
        })
    }

    /// Apply the dispatcher's answer for `ticket`.
    ///
    /// Completions for a ticket that is no longer current (the flow was reset
    /// or a newer request started) are dropped and return `Ok`. A completion
    /// that lands after the user signed in with the new code only clears
    /// `busy`; the phase and the notice stay as they are.
    ///
    /// # Errors
    /// `Dispatch` if the send failed; the phase is left as it was.
    #[instrument(skip_all, fields(flow_id = %self.flow_id))]
    pub fn complete_request(
        &mut self,
        ticket: DispatchTicket,
        outcome: Result<(), DispatchError>,
    ) -> Result<(), SignInError> {
        if !self.session.busy || ticket.generation != self.generation {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                "ignoring stale dispatch completion"
            );
            return Ok(());
        }

        self.session.busy = false;

        if self.session.phase == Phase::SignedIn {
            debug!(
                delivered = outcome.is_ok(),
                "dispatch completed after sign-in"
            );
            return Ok(());
        }

        match outcome {
            Ok(()) => {
                self.session.phase = Phase::AwaitingOtp;
                self.session.notify(Notice::success(OTP_SENT));
                info!(to_email = %ticket.message.to_email, "OTP dispatched");
                Ok(())
            }
            Err(e) => {
                warn!("OTP dispatch failed: {e}");
                Err(self.fail(SignInError::Dispatch(e)))
            }
        }
    }

    /// Generate, store and send a passcode to `email`. Also used for resend.
    ///
    /// # Errors
    /// See [`Self::begin_request`] and [`Self::complete_request`].
    pub async fn request_otp(&mut self, email: &str) -> Result<(), SignInError> {
        let ticket = self.begin_request(email)?;
        let outcome = self.dispatcher.send(ticket.message()).await;
        self.complete_request(ticket, outcome)
    }

    /// Send a new passcode to the stored address.
    ///
    /// # Errors
    /// See [`Self::request_otp`].
    pub async fn resend_otp(&mut self) -> Result<(), SignInError> {
        let email = self.session.email.clone();
        self.request_otp(&email).await
    }

    /// Compare `input` with the pending passcode.
    ///
    /// No comparison succeeds from the email step, even when a code sent
    /// earlier is still pending.
    ///
    /// # Errors
    /// `InvalidOtpFormat` unless `input` is six characters long, `Mismatch`
    /// if it differs from the pending code.
    #[instrument(skip_all, fields(flow_id = %self.flow_id))]
    pub fn verify_otp(&mut self, input: &str) -> Result<(), SignInError> {
        self.session.user_input = input.to_string();

        if !has_otp_length(input) {
            return Err(self.fail(SignInError::InvalidOtpFormat));
        }

        let matched = self.session.phase != Phase::AwaitingEmail
            && self
                .session
                .pending_otp
                .as_ref()
                .is_some_and(|code| code.matches(input));

        if !matched {
            debug!("OTP mismatch");
            return Err(self.fail(SignInError::Mismatch));
        }

        self.session.phase = Phase::SignedIn;
        self.session.notify(Notice::success(SIGNED_IN));
        info!(email = %self.session.email, "signed in");

        Ok(())
    }

    /// Return from the passcode step to the email step.
    ///
    /// The address, the pending passcode and the notice are kept. Returns
    /// `false` and does nothing outside the passcode step.
    pub fn go_back(&mut self) -> bool {
        if self.session.phase != Phase::AwaitingOtp {
            return false;
        }
        self.session.phase = Phase::AwaitingEmail;
        true
    }

    /// Sign out: drop everything and start over at the email step.
    #[instrument(skip_all, fields(flow_id = %self.flow_id))]
    pub fn reset(&mut self) {
        self.session.clear();
        self.generation = self.generation.wrapping_add(1);
        debug!("session reset");
    }

    fn fail(&mut self, err: SignInError) -> SignInError {
        self.session.notify(Notice::error(err.to_string()));
        err
    }
}

impl<D> std::fmt::Debug for SignInFlow<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInFlow")
            .field("flow_id", &self.flow_id)
            .field("session", &self.session)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
