use crate::emailjs::{DispatchError, Dispatcher, OtpMessage};
use anyhow::{Context, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, error, instrument};
use url::Url;

pub const DEFAULT_SERVICE_ID: &str = "your_service_id";
pub const DEFAULT_TEMPLATE_ID: &str = "your_template_id";
pub const DEFAULT_PUBLIC_KEY: &str = "your_public_key";
pub const DEFAULT_API_URL: &str = "https://api.emailjs.com";

const SEND_PATH: &str = "/api/v1.0/email/send";

/// EmailJS account settings.
///
/// The `DEFAULT_*` values are placeholders; sending with them fails at the
/// service, not here.
#[derive(Clone)]
pub struct EmailJsConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: SecretString,
    pub private_key: Option<SecretString>,
    pub api_url: Url,
}

impl EmailJsConfig {
    /// # Errors
    /// Returns an error if `api_url` is not an absolute URL.
    pub fn new(
        service_id: String,
        template_id: String,
        public_key: SecretString,
        api_url: &str,
    ) -> Result<Self> {
        let api_url =
            Url::parse(api_url).with_context(|| format!("invalid EmailJS API URL: {api_url}"))?;
        Ok(Self {
            service_id,
            template_id,
            public_key,
            private_key: None,
            api_url,
        })
    }

    #[must_use]
    pub fn with_private_key(mut self, private_key: Option<SecretString>) -> Self {
        self.private_key = private_key;
        self
    }

    /// Names of the settings still holding their placeholder value.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.service_id == DEFAULT_SERVICE_ID {
            names.push("service_id");
        }
        if self.template_id == DEFAULT_TEMPLATE_ID {
            names.push("template_id");
        }
        if self.public_key.expose_secret() == DEFAULT_PUBLIC_KEY {
            names.push("public_key");
        }
        names
    }
}

impl std::fmt::Debug for EmailJsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailJsConfig")
            .field("service_id", &self.service_id)
            .field("template_id", &self.template_id)
            .field("public_key", &"***")
            .field("private_key", &self.private_key.as_ref().map(|_| "***"))
            .field("api_url", &self.api_url.as_str())
            .finish()
    }
}

#[derive(Serialize)]
struct TemplateParams<'a> {
    to_email: &'a str,
    otp_code: &'a str,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
}

/// Sends passcodes through the EmailJS REST API.
///
/// EmailJS rejects calls from non-browser clients unless "Allow EmailJS API for
/// non-browser applications" is enabled in the account security settings.
#[derive(Clone, Debug)]
pub struct EmailJsClient {
    client: Client,
    endpoint: Url,
    config: EmailJsConfig,
}

impl EmailJsClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or the endpoint URL is invalid.
    pub fn new(config: EmailJsConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("Error creating reqwest client")?;
        let endpoint = config
            .api_url
            .join(SEND_PATH)
            .context("Error building EmailJS send URL")?;

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[instrument(skip(self, message), fields(to_email = %message.to_email))]
    async fn post(&self, message: &OtpMessage) -> Result<(), DispatchError> {
        let body = SendRequest {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: self.config.public_key.expose_secret(),
            template_params: TemplateParams {
                to_email: &message.to_email,
                otp_code: message.otp_code.as_str(),
            },
            access_token: self
                .config
                .private_key
                .as_ref()
                .map(|key| key.expose_secret()),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Request to EmailJS failed: {e}");
                DispatchError::Transport(e)
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            error!("EmailJS error ({}): {}", status, text);
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        debug!("EmailJS accepted message: {}", text);

        Ok(())
    }
}

impl Dispatcher for EmailJsClient {
    async fn send(&self, message: &OtpMessage) -> Result<(), DispatchError> {
        self.post(message).await
    }
}
