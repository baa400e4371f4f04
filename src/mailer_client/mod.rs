mod errors;
mod types;

use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

pub use errors::{ErrorKind, MailerError};
pub use types::CampaignSummary;
use types::{
    CampaignEmail, CreateCampaignRequest, CreateGroupRequest, CreateSubscriberRequest, Envelope,
    GroupRecord, ScheduleCampaignRequest, SubscriberFields, SubscriberRecord,
    UpdateCampaignRequest,
};

use crate::domain::{
    CampaignId, CampaignTemplate, GroupId, GroupName, SubscriberEmail, SubscriberId,
    SubscriberName,
};

/// Whether `find_or_create_subscriber` had to create the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberStatus {
    Created,
    AlreadyExisted,
}

#[derive(Debug, Clone)]
pub struct Enrollment {
    pub id: SubscriberId,
    pub status: SubscriberStatus,
}

/// Adapter over the MailerLite REST API.
///
/// The API key is handed in at construction; the client never looks it up.
#[derive(Debug, Clone)]
pub struct MailerClient {
    http_client: Client,
    base_url: Url,
    api_key: SecretString,
}

impl MailerClient {
    pub fn new(
        base_url: &str,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Failed parsing mailer api url {base_url}."))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("{base_url} can not be used as mailer api url.");
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed building the mailer http client.")?;

        Ok(Self {
            http_client,
            base_url,
            api_key,
        })
    }

    #[tracing::instrument(name = "Looking up group by name", skip(self), fields(group_name = %name))]
    pub async fn find_group(&self, name: &GroupName) -> Result<Option<GroupId>, MailerError> {
        let request = self
            .request(Method::GET, &["groups"])?
            .query(&[("filter[name]", name.as_ref())]);

        let response = self.send(request).await?;
        let groups: Vec<GroupRecord> = parse_data(ensure_success(response).await?).await?;

        Ok(groups
            .into_iter()
            .find(|group| group.name == name.as_ref())
            .map(|group| group.id))
    }

    #[tracing::instrument(name = "Creating group", skip(self), fields(group_name = %name))]
    pub async fn create_group(&self, name: &GroupName) -> Result<GroupId, MailerError> {
        let request = self
            .request(Method::POST, &["groups"])?
            .json(&CreateGroupRequest {
                name: name.as_ref(),
            });

        let response = self.send(request).await?;
        let group: GroupRecord = parse_data(ensure_success(response).await?).await?;

        Ok(group.id)
    }

    pub async fn find_or_create_group(&self, name: &GroupName) -> Result<GroupId, MailerError> {
        match self.find_group(name).await? {
            Some(id) => Ok(id),
            None => self.create_group(name).await,
        }
    }

    #[tracing::instrument(name = "Looking up subscriber by email", skip(self), fields(subscriber_email = %email))]
    pub async fn find_subscriber(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<SubscriberId>, MailerError> {
        let request = self.request(Method::GET, &["subscribers", email.as_ref()])?;

        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let subscriber: SubscriberRecord = parse_data(ensure_success(response).await?).await?;

        Ok(Some(subscriber.id))
    }

    #[tracing::instrument(
        name = "Creating subscriber",
        skip(self),
        fields(subscriber_email = %email, subscriber_name = %name.as_ref())
    )]
    pub async fn create_subscriber(
        &self,
        email: &SubscriberEmail,
        name: &SubscriberName,
    ) -> Result<SubscriberId, MailerError> {
        let request = self
            .request(Method::POST, &["subscribers"])?
            .json(&CreateSubscriberRequest {
                email: email.as_ref(),
                fields: SubscriberFields {
                    name: name.as_ref(),
                },
            });

        let response = self.send(request).await?;
        let subscriber: SubscriberRecord = parse_data(ensure_success(response).await?).await?;

        Ok(subscriber.id)
    }

    pub async fn find_or_create_subscriber(
        &self,
        email: &SubscriberEmail,
        name: &SubscriberName,
    ) -> Result<Enrollment, MailerError> {
        if let Some(id) = self.find_subscriber(email).await? {
            return Ok(Enrollment {
                id,
                status: SubscriberStatus::AlreadyExisted,
            });
        }

        let id = self.create_subscriber(email, name).await?;
        Ok(Enrollment {
            id,
            status: SubscriberStatus::Created,
        })
    }

    #[tracing::instrument(name = "Assigning subscriber to group", skip(self))]
    pub async fn assign_to_group(
        &self,
        subscriber_id: &SubscriberId,
        group_id: &GroupId,
    ) -> Result<(), MailerError> {
        let request = self.request(
            Method::POST,
            &[
                "subscribers",
                subscriber_id.as_ref(),
                "groups",
                group_id.as_ref(),
            ],
        )?;

        let response = self.send(request).await?;
        ensure_success(response).await?;

        Ok(())
    }

    #[tracing::instrument(
        name = "Creating campaign",
        skip(self, template),
        fields(campaign_name = %template.name)
    )]
    pub async fn create_campaign(
        &self,
        template: &CampaignTemplate,
        group_id: &GroupId,
    ) -> Result<CampaignId, MailerError> {
        let request = self
            .request(Method::POST, &["campaigns"])?
            .json(&CreateCampaignRequest {
                name: &template.name,
                campaign_type: "regular",
                groups: vec![group_id.as_ref()],
                emails: vec![campaign_email(template)],
            });

        let response = self.send(request).await?;
        let campaign: CampaignSummary = parse_data(ensure_success(response).await?).await?;

        Ok(campaign.id)
    }

    #[tracing::instrument(name = "Fetching campaign", skip(self))]
    pub async fn get_campaign(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<CampaignSummary, MailerError> {
        let request = self.request(Method::GET, &["campaigns", campaign_id.as_ref()])?;

        let response = self.send(request).await?;
        parse_data(ensure_success(response).await?).await
    }

    /// Schedules the campaign for instant delivery.
    ///
    /// Delivery can not be undone or repeated. A rejected schedule is checked
    /// against the campaign's status to tell a repeated send apart from an
    /// incomplete draft.
    #[tracing::instrument(name = "Sending campaign", skip(self))]
    pub async fn send_campaign(&self, campaign_id: &CampaignId) -> Result<(), MailerError> {
        let request = self
            .request(Method::POST, &["campaigns", campaign_id.as_ref(), "schedule"])?
            .json(&ScheduleCampaignRequest {
                delivery: "instant",
            });

        let response = self.send(request).await?;
        match ensure_success(response).await {
            Ok(_) => Ok(()),
            Err(MailerError::ValidationError(message)) => match self.get_campaign(campaign_id).await {
                Ok(campaign) if campaign.is_dispatched() => {
                    Err(MailerError::AlreadySentError(campaign_id.clone()))
                }
                Ok(_) => Err(MailerError::ValidationError(message)),
                Err(e) => {
                    tracing::warn!(
                        error.cause_chain = ?e,
                        "Could not read back the rejected campaign, keeping the schedule error."
                    );
                    Err(MailerError::ValidationError(message))
                }
            },
            Err(e) => Err(e),
        }
    }

    /// Points an unsent campaign at another group, rewriting its content from
    /// `template`.
    #[tracing::instrument(
        name = "Retargeting campaign",
        skip(self, template),
        fields(campaign_name = %template.name)
    )]
    pub async fn update_campaign_group(
        &self,
        campaign_id: &CampaignId,
        template: &CampaignTemplate,
        group_id: &GroupId,
    ) -> Result<CampaignSummary, MailerError> {
        let request = self
            .request(Method::PUT, &["campaigns", campaign_id.as_ref()])?
            .json(&UpdateCampaignRequest {
                name: &template.name,
                groups: vec![group_id.as_ref()],
                emails: vec![campaign_email(template)],
            });

        let response = self.send(request).await?;
        parse_data(ensure_success(response).await?).await
    }

    /// Only `draft` and `ready` campaigns can be deleted. Deleting a `ready`
    /// campaign cancels its delivery.
    #[tracing::instrument(name = "Deleting campaign", skip(self))]
    pub async fn delete_campaign(&self, campaign_id: &CampaignId) -> Result<(), MailerError> {
        self.delete(&["campaigns", campaign_id.as_ref()]).await
    }

    /// The group's subscribers are kept.
    #[tracing::instrument(name = "Deleting group", skip(self))]
    pub async fn delete_group(&self, group_id: &GroupId) -> Result<(), MailerError> {
        self.delete(&["groups", group_id.as_ref()]).await
    }

    #[tracing::instrument(name = "Deleting subscriber", skip(self))]
    pub async fn delete_subscriber(&self, subscriber_id: &SubscriberId) -> Result<(), MailerError> {
        self.delete(&["subscribers", subscriber_id.as_ref()]).await
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), MailerError> {
        let request = self.request(Method::DELETE, segments)?;

        let response = self.send(request).await?;
        ensure_success(response).await?;

        Ok(())
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, MailerError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("{} can not be used as mailer api url.", self.base_url))?
            .pop_if_empty()
            .push("api")
            .extend(segments);

        Ok(self
            .http_client
            .request(method, url)
            .bearer_auth(self.api_key.expose_secret())
            .header("Accept", "application/json"))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, MailerError> {
        let response = request
            .send()
            .await
            .context("Failed to execute request against the mailer API.")?;
        Ok(response)
    }
}

fn campaign_email(template: &CampaignTemplate) -> CampaignEmail<'_> {
    CampaignEmail {
        subject: &template.subject,
        from: template.sender_email.as_ref(),
        from_name: &template.sender_name,
        content: &template.html,
    }
}

async fn ensure_success(response: Response) -> Result<Response, MailerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(MailerError::from_status(status, &body))
}

async fn parse_data<T: DeserializeOwned>(response: Response) -> Result<T, MailerError> {
    let envelope: Envelope<T> = response
        .json()
        .await
        .context("Failed to parse the mailer API response.")?;
    Ok(envelope.data)
}
