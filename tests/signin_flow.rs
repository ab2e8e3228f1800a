//! End-to-end sign-in against a mocked EmailJS endpoint.
//!
//! The passcode is read back from the request body the mock received, the same
//! way a user would read it from their inbox.

use anyhow::{anyhow, Context, Result};
use mailotp::emailjs::{EmailJsClient, EmailJsConfig};
use mailotp::signin::{ErrorKind, Notice, NoticeKind, Phase, SignInFlow};
use secrecy::SecretString;
use serde_json::Value;
use std::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEND_PATH: &str = "/api/v1.0/email/send";

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn flow_for(server: &MockServer) -> Result<SignInFlow<EmailJsClient>> {
    let config = EmailJsConfig::new(
        "service_abc".to_string(),
        "template_xyz".to_string(),
        SecretString::from("public-key"),
        &server.uri(),
    )?;
    Ok(SignInFlow::new(EmailJsClient::new(config)?))
}

async fn delivered_codes(server: &MockServer) -> Result<Vec<String>> {
    let requests = server
        .received_requests()
        .await
        .ok_or_else(|| anyhow!("wiremock request recording is disabled"))?;

    requests
        .iter()
        .map(|request| -> Result<String> {
            let body: Value = request.body_json()?;
            body["template_params"]["otp_code"]
                .as_str()
                .map(str::to_string)
                .context("otp_code missing from template params")
        })
        .collect()
}

#[tokio::test]
async fn sign_in_with_emailed_code() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let mut flow = flow_for(&server)?;
    flow.request_otp("user@example.com").await?;
    assert_eq!(flow.phase(), Phase::AwaitingOtp);

    let codes = delivered_codes(&server).await?;
    assert_eq!(codes.len(), 1);
    assert_eq!(flow.pending_otp().map(|c| c.to_string()), Some(codes[0].clone()));

    flow.verify_otp(&codes[0])?;
    assert!(flow.is_signed_in());
    assert_eq!(flow.status(), Some(&Notice::success("Successfully signed in!")));

    flow.reset();
    assert_eq!(flow.phase(), Phase::AwaitingEmail);
    assert!(flow.email().is_empty());
    assert!(flow.pending_otp().is_none());
    Ok(())
}

#[tokio::test]
async fn only_latest_emailed_code_signs_in() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let mut flow = flow_for(&server)?;
    flow.request_otp("user@example.com").await?;
    flow.resend_otp().await?;

    let codes = delivered_codes(&server).await?;
    assert_eq!(codes.len(), 2);

    if codes[0] != codes[1] {
        let err = flow
            .verify_otp(&codes[0])
            .err()
            .context("stale code should not verify")?;
        assert_eq!(err.kind(), ErrorKind::Mismatch);
        assert_eq!(flow.phase(), Phase::AwaitingOtp);
    }

    flow.verify_otp(&codes[1])?;
    assert!(flow.is_signed_in());
    Ok(())
}

#[tokio::test]
async fn rejected_send_keeps_email_step() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("The Public Key is invalid"))
        .mount(&server)
        .await;

    let mut flow = flow_for(&server)?;
    let err = flow
        .request_otp("user@example.com")
        .await
        .err()
        .context("send should fail")?;

    assert_eq!(err.kind(), ErrorKind::Dispatch);
    assert_eq!(flow.phase(), Phase::AwaitingEmail);
    assert!(!flow.is_busy());
    let notice = flow.status().context("notice expected")?;
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.text, "Failed to send OTP. Please try again.");
    Ok(())
}

#[tokio::test]
async fn invalid_email_never_reaches_service() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut flow = flow_for(&server)?;
    let err = flow
        .request_otp("user.example.com")
        .await
        .err()
        .context("validation should fail")?;

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(flow.phase(), Phase::AwaitingEmail);
    Ok(())
}
