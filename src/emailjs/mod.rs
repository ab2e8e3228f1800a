//! Passcode delivery.
//!
//! The sign-in flow hands each fresh code to a [`Dispatcher`] and only cares
//! whether the send succeeded. [`EmailJsClient`] talks to the EmailJS REST API;
//! [`LogDispatcher`] logs the message and reports success, which is handy when
//! running the prompt without an EmailJS account.

pub mod client;
pub use self::client::{EmailJsClient, EmailJsConfig};

use crate::signin::OtpCode;
use std::{future::Future, sync::Arc};
use thiserror::Error;
use tracing::info;

/// A passcode addressed to one recipient.
#[derive(Clone, Debug)]
pub struct OtpMessage {
    pub to_email: String,
    pub otp_code: OtpCode,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("email service request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("email service rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Email delivery abstraction used by the sign-in flow.
pub trait Dispatcher: Send + Sync {
    /// Deliver the message, or return an error so the flow can surface it.
    fn send(&self, message: &OtpMessage)
        -> impl Future<Output = Result<(), DispatchError>> + Send;
}

impl<D: Dispatcher> Dispatcher for Arc<D> {
    fn send(
        &self,
        message: &OtpMessage,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send {
        (**self).send(message)
    }
}

/// Local dev dispatcher that logs the recipient instead of sending real email.
#[derive(Clone, Debug, Default)]
pub struct LogDispatcher;

impl Dispatcher for LogDispatcher {
    async fn send(&self, message: &OtpMessage) -> Result<(), DispatchError> {
        info!(
            to_email = %message.to_email,
            otp_code = %message.otp_code,
            "email dispatch stub"
        );
        Ok(())
    }
}
