use reqwest::StatusCode;
use serde::Serialize;

use super::types::ApiErrorBody;
use crate::domain::CampaignId;
use crate::helpers::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum MailerError {
    #[error("{0}")]
    ValidationError(String),
    #[error("The mailer API rejected the API key.")]
    AuthError(#[source] anyhow::Error),
    #[error("Campaign {0} has already been sent.")]
    AlreadySentError(CampaignId),
    #[error(transparent)]
    UpstreamError(#[from] anyhow::Error),
}

impl std::fmt::Debug for MailerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl MailerError {
    /// Maps a non-2xx response from the mailer API onto the error taxonomy.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MailerError::AuthError(
                anyhow::anyhow!("Mailer API responded with {status}: {body}"),
            ),
            StatusCode::UNPROCESSABLE_ENTITY => {
                let message = serde_json::from_str::<ApiErrorBody>(body)
                    .map(|b| b.message)
                    .unwrap_or_else(|_| body.to_string());
                MailerError::ValidationError(message)
            }
            _ => MailerError::UpstreamError(anyhow::anyhow!(
                "Mailer API responded with {status}: {body}"
            )),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MailerError::ValidationError(_) => ErrorKind::Validation,
            MailerError::AuthError(_) => ErrorKind::Auth,
            MailerError::AlreadySentError(_) => ErrorKind::AlreadySent,
            MailerError::UpstreamError(_) => ErrorKind::Upstream,
        }
    }
}

/// Machine-readable error kind reported to the invoker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "validation_error")]
    Validation,
    #[serde(rename = "auth_error")]
    Auth,
    #[serde(rename = "upstream_error")]
    Upstream,
    #[serde(rename = "already_sent_error")]
    AlreadySent,
}

impl ErrorKind {
    /// HTTP status reported by the HTTP and API Gateway surfaces.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::AlreadySent => 409,
            ErrorKind::Auth => 500,
            ErrorKind::Upstream => 502,
        }
    }
}
