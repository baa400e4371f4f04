use serde::{Deserialize, Serialize};

use crate::domain::{CampaignId, GroupId, SubscriberId};

#[derive(Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

#[derive(Deserialize)]
pub struct GroupRecord {
    pub id: GroupId,
    pub name: String,
}

#[derive(Deserialize)]
pub struct SubscriberRecord {
    pub id: SubscriberId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignSummary {
    pub id: CampaignId,
    pub status: String,
}

impl CampaignSummary {
    /// Scheduled, in-flight and delivered campaigns can not be scheduled again.
    pub fn is_dispatched(&self) -> bool {
        matches!(self.status.as_str(), "ready" | "sending" | "sent")
    }
}

#[derive(Serialize)]
pub struct CreateGroupRequest<'a> {
    pub name: &'a str,
}

#[derive(Serialize)]
pub struct SubscriberFields<'a> {
    pub name: &'a str,
}

#[derive(Serialize)]
pub struct CreateSubscriberRequest<'a> {
    pub email: &'a str,
    pub fields: SubscriberFields<'a>,
}

#[derive(Serialize)]
pub struct CampaignEmail<'a> {
    pub subject: &'a str,
    pub from: &'a str,
    pub from_name: &'a str,
    pub content: &'a str,
}

#[derive(Serialize)]
pub struct CreateCampaignRequest<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub campaign_type: &'a str,
    pub groups: Vec<&'a str>,
    pub emails: Vec<CampaignEmail<'a>>,
}

#[derive(Serialize)]
pub struct UpdateCampaignRequest<'a> {
    pub name: &'a str,
    pub groups: Vec<&'a str>,
    pub emails: Vec<CampaignEmail<'a>>,
}

#[derive(Serialize)]
pub struct ScheduleCampaignRequest<'a> {
    pub delivery: &'a str,
}
