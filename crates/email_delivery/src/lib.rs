//! Outbound delivery of case reports through a transactional email API.
//!
//! The form only depends on [`EmailDelivery`]; [`EmailJsClient`] is the
//! production implementation talking to the EmailJS REST endpoint. EmailJS
//! accounts must allow API calls from non-browser applications for it to work.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{EmailSendRequest, TemplateParams};
use thiserror::Error;
use tracing::debug;

pub const EMAILJS_SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("email request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email service rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("email delivery unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait EmailDelivery: Send + Sync {
    async fn send(
        &self,
        service_id: &str,
        template_id: &str,
        params: &TemplateParams,
        public_key: &str,
    ) -> Result<(), DeliveryError>;
}

pub struct MissingEmailDelivery;

#[async_trait]
impl EmailDelivery for MissingEmailDelivery {
    async fn send(
        &self,
        _service_id: &str,
        _template_id: &str,
        _params: &TemplateParams,
        _public_key: &str,
    ) -> Result<(), DeliveryError> {
        Err(DeliveryError::Unavailable(
            "no email service has been configured".into(),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct EmailJsOptions {
    pub endpoint: String,
    /// Private key, required when the account enforces it for API calls.
    pub access_token: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for EmailJsOptions {
    fn default() -> Self {
        Self {
            endpoint: EMAILJS_SEND_URL.into(),
            access_token: None,
            timeout: None,
        }
    }
}

pub struct EmailJsClient {
    http: Client,
    endpoint: String,
    access_token: Option<String>,
}

impl EmailJsClient {
    pub fn new(options: EmailJsOptions) -> Result<Self, DeliveryError> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            endpoint: options.endpoint,
            access_token: options.access_token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmailDelivery for EmailJsClient {
    async fn send(
        &self,
        service_id: &str,
        template_id: &str,
        params: &TemplateParams,
        public_key: &str,
    ) -> Result<(), DeliveryError> {
        let request = EmailSendRequest {
            service_id: service_id.to_string(),
            template_id: template_id.to_string(),
            user_id: public_key.to_string(),
            template_params: params.clone(),
            access_token: self.access_token.clone(),
        };

        debug!(endpoint = %self.endpoint, service_id, template_id, "sending email request");
        let response = self.http.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
