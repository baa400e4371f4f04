mod campaigns;
mod health_check;

pub use campaigns::{campaign_json_config, publish_campaign};
pub use health_check::health_check;
