mod campaign_template;
mod group_name;
mod identifiers;
mod new_subscriber;
mod subscriber_email;
mod subscriber_name;

pub use campaign_template::CampaignTemplate;
pub use group_name::GroupName;
pub use identifiers::{CampaignId, GroupId, SubscriberId};
pub use new_subscriber::NewSubscriber;
pub use subscriber_email::SubscriberEmail;
pub use subscriber_name::SubscriberName;
