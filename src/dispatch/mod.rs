mod types;

use std::collections::HashMap;

use futures::{StreamExt, stream};
use uuid::Uuid;

pub use types::{
    CampaignRequest, ErrorReport, InvocationResult, InvocationStatus, UserOutcome, UserPayload,
    UserStatus,
};

use crate::domain::{CampaignId, CampaignTemplate, GroupId, GroupName, NewSubscriber};
use crate::mailer_client::{MailerClient, MailerError};

/// Runs one invocation end to end: group, enrollment, campaign, delivery.
pub struct CampaignDispatcher {
    client: MailerClient,
    template: CampaignTemplate,
    group_prefix: String,
    concurrency: usize,
}

impl CampaignDispatcher {
    pub fn new(
        client: MailerClient,
        template: CampaignTemplate,
        group_prefix: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            template,
            group_prefix: group_prefix.into(),
            concurrency: concurrency.max(1),
        }
    }

    /// Group creation, campaign creation and delivery are fatal to the batch.
    /// Enrollment failures are recorded per user and never abort the others.
    #[tracing::instrument(
        name = "Dispatching campaign",
        skip(self, request),
        fields(
            invocation_id = %Uuid::new_v4(),
            users = request.users.len(),
            group_id = tracing::field::Empty,
            campaign_id = tracing::field::Empty
        )
    )]
    pub async fn dispatch(&self, request: CampaignRequest) -> InvocationResult {
        let subscribers = match validate(request) {
            Ok(subscribers) => subscribers,
            Err(message) => {
                tracing::warn!(error.message = %message, "Rejecting invalid invocation.");
                return InvocationResult::failed(ErrorReport::validation(message), None, None, vec![]);
            }
        };

        let group_name = GroupName::generate(&self.group_prefix);
        let group_id = match self.client.find_or_create_group(&group_name).await {
            Ok(group_id) => group_id,
            Err(e) => return abort("Failed to create the subscriber group.", &e, None, None, vec![]),
        };
        tracing::Span::current().record("group_id", tracing::field::display(&group_id));

        let users = self.enroll_all(&subscribers, &group_id).await;
        if users.iter().all(|user| user.status == UserStatus::Failed) {
            let e = MailerError::UpstreamError(anyhow::anyhow!(
                "No subscriber could be enrolled into group {group_id}."
            ));
            return abort("Skipping the campaign.", &e, Some(group_id), None, users);
        }

        let campaign_id = match self.client.create_campaign(&self.template, &group_id).await {
            Ok(campaign_id) => campaign_id,
            Err(e) => {
                return abort("Failed to create the campaign.", &e, Some(group_id), None, users);
            }
        };
        tracing::Span::current().record("campaign_id", tracing::field::display(&campaign_id));

        if let Err(e) = self.client.send_campaign(&campaign_id).await {
            return abort(
                "Failed to send the campaign.",
                &e,
                Some(group_id),
                Some(campaign_id),
                users,
            );
        }

        let result = InvocationResult::completed(group_id, campaign_id, users);
        tracing::info!(status = ?result.status, "Campaign dispatched.");
        result
    }

    /// Each address is enrolled once. Repeats in the batch get a copy of the
    /// first occurrence's outcome so `users` lines up with the input.
    async fn enroll_all(&self, subscribers: &[NewSubscriber], group_id: &GroupId) -> Vec<UserOutcome> {
        let (unique, slots) = collapse_repeats(subscribers);

        let outcomes: Vec<UserOutcome> = stream::iter(unique)
            .map(|subscriber| self.enroll(subscriber, group_id))
            .buffered(self.concurrency)
            .collect()
            .await;

        subscribers
            .iter()
            .zip(slots)
            .map(|(subscriber, slot)| outcomes[slot].with_email(&subscriber.email))
            .collect()
    }

    #[tracing::instrument(
        name = "Enrolling subscriber",
        skip(self, subscriber, group_id),
        fields(subscriber_email = %subscriber.email)
    )]
    async fn enroll(&self, subscriber: &NewSubscriber, group_id: &GroupId) -> UserOutcome {
        let outcome = async {
            let enrollment = self
                .client
                .find_or_create_subscriber(&subscriber.email, &subscriber.name)
                .await?;
            self.client.assign_to_group(&enrollment.id, group_id).await?;
            Ok::<_, MailerError>(enrollment)
        }
        .await;

        match outcome {
            Ok(enrollment) => UserOutcome::enrolled(&subscriber.email, enrollment.status),
            Err(e) => {
                tracing::warn!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to enroll subscriber, continuing with the rest of the batch."
                );
                UserOutcome::failed(&subscriber.email, &e)
            }
        }
    }
}

fn abort(
    reason: &str,
    error: &MailerError,
    group_id: Option<GroupId>,
    campaign_id: Option<CampaignId>,
    users: Vec<UserOutcome>,
) -> InvocationResult {
    tracing::error!(
        error.cause_chain = ?error,
        error.message = %error,
        "{}",
        reason
    );
    InvocationResult::failed(error.into(), group_id, campaign_id, users)
}

/// Parses every entry up front so a bad batch is rejected before any call to
/// the mailer.
pub fn validate(request: CampaignRequest) -> Result<Vec<NewSubscriber>, String> {
    if request.users.is_empty() {
        return Err("'users' must be a non-empty list.".into());
    }

    request
        .users
        .into_iter()
        .enumerate()
        .map(|(index, user)| {
            NewSubscriber::try_from(user).map_err(|e| format!("Invalid user at index {index}: {e}"))
        })
        .collect()
}

/// Splits a batch into its distinct addresses (first occurrence wins) and,
/// for every entry, the position of its address among them.
fn collapse_repeats(subscribers: &[NewSubscriber]) -> (Vec<&NewSubscriber>, Vec<usize>) {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique = Vec::new();

    let slots = subscribers
        .iter()
        .map(|subscriber| {
            *positions
                .entry(subscriber.email.identity_key())
                .or_insert_with(|| {
                    unique.push(subscriber);
                    unique.len() - 1
                })
        })
        .collect();

    (unique, slots)
}
