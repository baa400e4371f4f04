use super::SubscriberEmail;

/// Static campaign definition shared by every invocation of a process.
///
/// `html` is sent as-is; the mailer rejects content without an unsubscribe
/// element, so the bundled template carries one.
#[derive(Debug, Clone)]
pub struct CampaignTemplate {
    pub name: String,
    pub subject: String,
    pub sender_email: SubscriberEmail,
    pub sender_name: String,
    pub html: String,
}

impl CampaignTemplate {
    pub const BUNDLED_HTML: &'static str = include_str!("../../templates/campaign.html");
}
