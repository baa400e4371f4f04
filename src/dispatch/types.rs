use serde::{Deserialize, Serialize};

use crate::domain::{CampaignId, GroupId, NewSubscriber, SubscriberEmail};
use crate::mailer_client::{ErrorKind, MailerError, SubscriberStatus};

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignRequest {
    pub users: Vec<UserPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub email: String,
    pub name: String,
}

impl TryFrom<UserPayload> for NewSubscriber {
    type Error = String;

    fn try_from(value: UserPayload) -> Result<Self, Self::Error> {
        NewSubscriber::parse(value.name, value.email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationStatus {
    Success,
    Partial,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserStatus {
    Created,
    AlreadyExisted,
    Failed,
}

impl From<SubscriberStatus> for UserStatus {
    fn from(value: SubscriberStatus) -> Self {
        match value {
            SubscriberStatus::Created => UserStatus::Created,
            SubscriberStatus::AlreadyExisted => UserStatus::AlreadyExisted,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserOutcome {
    pub email: String,
    pub status: UserStatus,
    pub error: Option<String>,
}

impl UserOutcome {
    pub fn enrolled(email: &SubscriberEmail, status: SubscriberStatus) -> Self {
        Self {
            email: email.as_ref().to_string(),
            status: status.into(),
            error: None,
        }
    }

    pub fn failed(email: &SubscriberEmail, error: &MailerError) -> Self {
        Self {
            email: email.as_ref().to_string(),
            status: UserStatus::Failed,
            error: Some(error.to_string()),
        }
    }

    /// The same outcome reported under another spelling of the address.
    pub fn with_email(&self, email: &SubscriberEmail) -> Self {
        Self {
            email: email.as_ref().to_string(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorReport {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }
}

impl From<&MailerError> for ErrorReport {
    fn from(value: &MailerError) -> Self {
        Self {
            kind: value.kind(),
            message: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvocationResult {
    pub status: InvocationStatus,
    pub group_id: Option<GroupId>,
    pub campaign_id: Option<CampaignId>,
    pub users: Vec<UserOutcome>,
    pub error: Option<ErrorReport>,
}

impl InvocationResult {
    pub fn failed(
        error: ErrorReport,
        group_id: Option<GroupId>,
        campaign_id: Option<CampaignId>,
        users: Vec<UserOutcome>,
    ) -> Self {
        Self {
            status: InvocationStatus::Failed,
            group_id,
            campaign_id,
            users,
            error: Some(error),
        }
    }

    pub fn completed(group_id: GroupId, campaign_id: CampaignId, users: Vec<UserOutcome>) -> Self {
        let status = if users.iter().any(|u| u.status == UserStatus::Failed) {
            InvocationStatus::Partial
        } else {
            InvocationStatus::Success
        };

        Self {
            status,
            group_id: Some(group_id),
            campaign_id: Some(campaign_id),
            users,
            error: None,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.error
            .as_ref()
            .map(|error| error.kind.status_code())
            .unwrap_or(200)
    }
}
