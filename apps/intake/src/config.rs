use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use email_delivery::{EmailJsOptions, EMAILJS_SEND_URL};
use form_core::{DeliveryTarget, DEFAULT_FROM_NAME, DEFAULT_SUBJECT};
use serde::Deserialize;
use shared::error::{ApiException, ErrorCode};

pub const ENV_PREFIX: &str = "INTAKE__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub emailjs_url: String,
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub private_key: Option<String>,
    pub recipient: String,
    pub subject: String,
    pub from_name: String,
    pub request_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            emailjs_url: EMAILJS_SEND_URL.into(),
            service_id: String::new(),
            template_id: String::new(),
            public_key: String::new(),
            private_key: None,
            recipient: String::new(),
            subject: DEFAULT_SUBJECT.into(),
            from_name: DEFAULT_FROM_NAME.into(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    emailjs_url: Option<String>,
    service_id: Option<String>,
    template_id: Option<String>,
    public_key: Option<String>,
    private_key: Option<String>,
    recipient: Option<String>,
    subject: Option<String>,
    from_name: Option<String>,
    request_timeout_seconds: Option<u64>,
}

/// Defaults, then the TOML file at `path` if it exists, then `INTAKE__*`
/// environment variables.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_with(path, |name| std::env::var(name).ok())
}

pub fn load_settings_with(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
        settings.apply_file(file_cfg);
    }

    let var = |key: &str| env(&format!("{ENV_PREFIX}{key}"));

    if let Some(v) = var("EMAILJS_URL") {
        settings.emailjs_url = v;
    }
    if let Some(v) = var("SERVICE_ID") {
        settings.service_id = v;
    }
    if let Some(v) = var("TEMPLATE_ID") {
        settings.template_id = v;
    }
    if let Some(v) = var("PUBLIC_KEY") {
        settings.public_key = v;
    }
    if let Some(v) = var("PRIVATE_KEY") {
        settings.private_key = Some(v).filter(|key| !key.is_empty());
    }
    if let Some(v) = var("RECIPIENT") {
        settings.recipient = v;
    }
    if let Some(v) = var("SUBJECT") {
        settings.subject = v;
    }
    if let Some(v) = var("FROM_NAME") {
        settings.from_name = v;
    }
    if let Some(v) = var("REQUEST_TIMEOUT_SECONDS") {
        settings.request_timeout_seconds = v
            .parse()
            .with_context(|| format!("{ENV_PREFIX}REQUEST_TIMEOUT_SECONDS must be a number, got '{v}'"))?;
    }

    Ok(settings)
}

impl Settings {
    fn apply_file(&mut self, file_cfg: FileSettings) {
        if let Some(v) = file_cfg.emailjs_url {
            self.emailjs_url = v;
        }
        if let Some(v) = file_cfg.service_id {
            self.service_id = v;
        }
        if let Some(v) = file_cfg.template_id {
            self.template_id = v;
        }
        if let Some(v) = file_cfg.public_key {
            self.public_key = v;
        }
        if file_cfg.private_key.is_some() {
            self.private_key = file_cfg.private_key;
        }
        if let Some(v) = file_cfg.recipient {
            self.recipient = v;
        }
        if let Some(v) = file_cfg.subject {
            self.subject = v;
        }
        if let Some(v) = file_cfg.from_name {
            self.from_name = v;
        }
        if let Some(v) = file_cfg.request_timeout_seconds {
            self.request_timeout_seconds = v;
        }
    }

    pub fn ensure_delivery_configured(&self) -> Result<(), ApiException> {
        let missing: Vec<&str> = [
            ("service_id", &self.service_id),
            ("template_id", &self.template_id),
            ("public_key", &self.public_key),
            ("recipient", &self.recipient),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            return Ok(());
        }

        Err(ApiException::new(
            ErrorCode::Configuration,
            format!("missing email settings: {}", missing.join(", ")),
        ))
    }

    pub fn delivery_target(&self) -> DeliveryTarget {
        DeliveryTarget {
            subject: self.subject.clone(),
            from_name: self.from_name.clone(),
            ..DeliveryTarget::new(
                self.service_id.clone(),
                self.template_id.clone(),
                self.public_key.clone(),
                self.recipient.clone(),
            )
        }
    }

    pub fn email_options(&self) -> EmailJsOptions {
        EmailJsOptions {
            endpoint: self.emailjs_url.clone(),
            access_token: self.private_key.clone(),
            timeout: (self.request_timeout_seconds > 0)
                .then(|| Duration::from_secs(self.request_timeout_seconds)),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
