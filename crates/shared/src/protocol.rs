use serde::{Deserialize, Serialize};

/// Variables handed to the email template. The template decides how they are
/// laid out; `message` carries the formatted report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateParams {
    pub to_email: String,
    pub subject: String,
    pub message: String,
    pub from_name: String,
}

/// Body of a send request against the EmailJS REST endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSendRequest {
    pub service_id: String,
    pub template_id: String,
    /// The account's public key.
    pub user_id: String,
    pub template_params: TemplateParams,
    #[serde(
        rename = "accessToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub access_token: Option<String>,
}
