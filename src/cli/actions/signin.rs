//! Interactive terminal sign-in.
//!
//! Reads one line per step from the input and renders the flow's notices to
//! the output. In the passcode step `:back` and `:resend` mirror the form's
//! buttons; `:signout` resets after a successful sign-in and `:quit` exits.

use crate::emailjs::{Dispatcher, EmailJsClient, EmailJsConfig, LogDispatcher};
use crate::signin::{Notice, NoticeKind, Phase, SignInError, SignInFlow};
use anyhow::{Context, Result};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

pub const CMD_BACK: &str = ":back";
pub const CMD_RESEND: &str = ":resend";
pub const CMD_SIGNOUT: &str = ":signout";
pub const CMD_QUIT: &str = ":quit";

#[derive(Debug)]
pub struct Args {
    pub emailjs: EmailJsConfig,
    pub dry_run: bool,
}

/// Execute the sign-in action on stdin/stdout.
/// # Errors
/// Returns an error if the EmailJS client cannot be built or the terminal I/O fails.
pub async fn execute(args: Args) -> Result<()> {
    let stdin = BufReader::new(io::stdin());
    let stdout = io::stdout();

    if args.dry_run {
        let mut flow = SignInFlow::new(LogDispatcher);
        return run(&mut flow, stdin, stdout).await;
    }

    let placeholders = args.emailjs.placeholders();
    if !placeholders.is_empty() {
        warn!(
            "EmailJS {} not configured, sends will fail",
            placeholders.join(", ")
        );
    }

    let client = EmailJsClient::new(args.emailjs)?;
    let mut flow = SignInFlow::new(client);
    run(&mut flow, stdin, stdout).await
}

/// Drive `flow` from `input` until EOF or `:quit`.
///
/// # Errors
/// Returns an error only if reading or writing the terminal fails.
pub async fn run<D, R, W>(flow: &mut SignInFlow<D>, input: R, mut output: W) -> Result<()>
where
    D: Dispatcher,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    write_header(&mut output, flow.phase()).await?;

    loop {
        write_prompt(&mut output, flow.phase()).await?;

        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };
        let line = line.trim();

        if line == CMD_QUIT {
            break;
        }

        let before = flow.phase();
        let notified = step(flow, line, &mut output).await?;

        if notified {
            if let Some(notice) = flow.status() {
                write_notice(&mut output, notice).await?;
            }
        }

        if flow.phase() != before {
            write_header(&mut output, flow.phase()).await?;
            if flow.is_signed_in() {
                let welcome = format!(
                    "You have successfully signed in with {}\n",
                    flow.email()
                );
                output.write_all(welcome.as_bytes()).await?;
            }
        }
    }

    output.flush().await?;
    Ok(())
}

/// Apply one line of input. Returns `true` when the step set a notice worth
/// showing.
async fn step<D, W>(flow: &mut SignInFlow<D>, line: &str, output: &mut W) -> Result<bool>
where
    D: Dispatcher,
    W: AsyncWrite + Unpin,
{
    match flow.phase() {
        Phase::AwaitingEmail => {
            flow.set_email(line);
            let email = flow.email().to_string();
            dispatch(flow, &email, "Sending OTP to your mail...", output).await?;
        }
        Phase::AwaitingOtp => match line {
            CMD_BACK => {
                flow.go_back();
                return Ok(false);
            }
            CMD_RESEND => {
                let email = flow.email().to_string();
                dispatch(flow, &email, "Resending...", output).await?;
            }
            code => {
                flow.set_user_input(code);
                let input = flow.user_input().to_string();
                log_failure(flow.verify_otp(&input));
            }
        },
        Phase::SignedIn => {
            if line == CMD_SIGNOUT {
                flow.reset();
            } else {
                let hint = format!("Type {CMD_SIGNOUT} to sign out or {CMD_QUIT} to exit\n");
                output.write_all(hint.as_bytes()).await?;
            }
            return Ok(false);
        }
    }

    Ok(true)
}

/// Start a send, announce it once the address is accepted, then wait for the
/// dispatcher.
async fn dispatch<D, W>(
    flow: &mut SignInFlow<D>,
    email: &str,
    progress: &str,
    output: &mut W,
) -> Result<()>
where
    D: Dispatcher,
    W: AsyncWrite + Unpin,
{
    let ticket = match flow.begin_request(email) {
        Ok(ticket) => ticket,
        Err(e) => {
            log_failure(Err(e));
            return Ok(());
        }
    };

    write_notice(output, &Notice::info(progress)).await?;

    let outcome = flow.dispatcher().send(ticket.message()).await;
    log_failure(flow.complete_request(ticket, outcome));
    Ok(())
}

fn log_failure(result: Result<(), SignInError>) {
    if let Err(e) = result {
        debug!(kind = ?e.kind(), "sign-in step failed: {e}");
    }
}

async fn write_header<W: AsyncWrite + Unpin>(output: &mut W, phase: Phase) -> Result<()> {
    let header = match phase {
        Phase::AwaitingEmail => "\nSign In\nEnter your email\n".to_string(),
        Phase::AwaitingOtp => format!(
            "\nSign In\nEnter OTP sent to your email ({CMD_BACK}, {CMD_RESEND})\n"
        ),
        Phase::SignedIn => "\nWelcome!\n".to_string(),
    };
    output.write_all(header.as_bytes()).await?;
    Ok(())
}

async fn write_prompt<W: AsyncWrite + Unpin>(output: &mut W, phase: Phase) -> Result<()> {
    let prompt = match phase {
        Phase::AwaitingEmail => "email> ",
        Phase::AwaitingOtp => "otp> ",
        Phase::SignedIn => "> ",
    };
    output.write_all(prompt.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

async fn write_notice<W: AsyncWrite + Unpin>(output: &mut W, notice: &Notice) -> Result<()> {
    let tag = match notice.kind {
        NoticeKind::Info => "info",
        NoticeKind::Success => "ok",
        NoticeKind::Error => "error",
    };
    output
        .write_all(format!("[{tag}] {}\n", notice.text).as_bytes())
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::emailjs::{DispatchError, OtpMessage};
    use crate::signin::OtpCode;
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<OtpMessage>>,
    }

    impl Dispatcher for Recorder {
        async fn send(&self, message: &OtpMessage) -> Result<(), DispatchError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    const SEED: u64 = 9;

    // The flow draws from the same seeded generator, so these are the codes it will send.
    fn expected_codes(n: usize) -> Vec<String> {
        let mut rng = StdRng::seed_from_u64(SEED);
        (0..n)
            .map(|_| OtpCode::generate(&mut rng).to_string())
            .collect()
    }

    async fn drive(script: &str) -> (SignInFlow<Recorder>, String) {
        let mut flow = SignInFlow::with_rng(Recorder::default(), StdRng::seed_from_u64(SEED));
        let mut output = Vec::new();
        run(&mut flow, script.as_bytes(), &mut output).await.unwrap();
        (flow, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn full_sign_in_and_sign_out() {
        let codes = expected_codes(2);
        let script = format!(
            "nope\nuser@example.com\n12345\n{CMD_BACK}\nuser@example.com\n{}\n{CMD_SIGNOUT}\n{CMD_QUIT}\n",
            codes[1]
        );

        let (flow, output) = drive(&script).await;

        assert!(output.contains("[error] Please enter a valid email address"));
        assert!(output.contains("[info] Sending OTP to your mail..."));
        assert!(output.contains("[ok] OTP sent! Please check your inbox."));
        assert!(output.contains("[error] Please enter a 6-digit OTP"));
        assert!(output.contains("[ok] Successfully signed in!"));
        assert!(output.contains("You have successfully signed in with user@example.com"));

        let sent = flow.dispatcher().sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].otp_code.as_str(), codes[0]);
        assert_eq!(sent[1].otp_code.as_str(), codes[1]);

        assert_eq!(flow.phase(), Phase::AwaitingEmail);
        assert!(flow.email().is_empty());
    }

    #[tokio::test]
    async fn resend_then_wrong_code() {
        let codes = expected_codes(2);
        let wrong = if codes[1] == "999999" { "999998" } else { "999999" };
        let script = format!("user@example.com\n{CMD_RESEND}\n{wrong}\n");

        let (flow, output) = drive(&script).await;

        assert!(output.contains("[info] Resending..."));
        assert!(output.contains("[error] Invalid OTP. Please try again."));
        assert_eq!(flow.phase(), Phase::AwaitingOtp);
        assert_eq!(flow.pending_otp().unwrap().as_str(), codes[1]);
    }

    #[tokio::test]
    async fn invalid_address_is_not_announced() {
        let (flow, output) = drive("nope\n").await;

        assert!(output.contains("[error] Please enter a valid email address"));
        assert!(!output.contains("Sending OTP"));
        assert!(flow.dispatcher().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn back_does_not_repeat_notice() {
        let (flow, output) = drive(&format!("user@example.com\n{CMD_BACK}\n")).await;

        assert_eq!(flow.phase(), Phase::AwaitingEmail);
        assert_eq!(output.matches("[ok] OTP sent!").count(), 1);
    }

    #[tokio::test]
    async fn eof_exits_cleanly() {
        let (flow, output) = drive("").await;
        assert!(output.contains("Enter your email"));
        assert_eq!(flow.phase(), Phase::AwaitingEmail);
    }

    #[tokio::test]
    async fn signed_in_hints_commands() {
        let codes = expected_codes(1);
        let script = format!("user@example.com\n{}\nhello\n", codes[0]);

        let (flow, output) = drive(&script).await;

        assert!(flow.is_signed_in());
        assert!(output.contains("Type :signout to sign out"));
    }
}
