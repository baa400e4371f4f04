use std::time::Duration;

use anyhow::Context;
use secrecy::SecretString;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::{CampaignTemplate, SubscriberEmail};
use crate::mailer_client::MailerClient;

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub mailer: MailerSettings,
    pub campaign: CampaignSettings,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct MailerSettings {
    pub base_url: String,
    /// Used as-is when no `secret` is configured.
    pub api_key: Option<SecretString>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_ms: u64,
    pub secret: Option<SecretSettings>,
}

/// Location of the credential blob holding the mailer API key.
#[derive(serde::Deserialize, Debug, Clone)]
pub struct SecretSettings {
    pub name: String,
    #[serde(default = "default_secret_field")]
    pub field: String,
}

fn default_secret_field() -> String {
    "MAILER_KEY".into()
}

impl MailerSettings {
    pub fn client(&self, api_key: SecretString) -> Result<MailerClient, anyhow::Error> {
        MailerClient::new(&self.base_url, api_key, self.timeout())
            .context("Failed to build the mailer API client.")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct CampaignSettings {
    pub name: String,
    pub subject: String,
    pub sender_email: String,
    pub sender_name: String,
    /// HTML body of the campaign; the bundled template is used when unset.
    pub content_path: Option<String>,
    pub group_prefix: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub concurrency: usize,
}

impl CampaignSettings {
    pub fn sender(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.sender_email.clone())
    }

    pub fn template(&self) -> Result<CampaignTemplate, anyhow::Error> {
        let sender_email = self
            .sender()
            .map_err(anyhow::Error::msg)
            .context("Invalid campaign sender email address.")?;

        let html = match &self.content_path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read campaign content from {path}"))?,
            None => CampaignTemplate::BUNDLED_HTML.to_string(),
        };

        Ok(CampaignTemplate {
            name: self.name.clone(),
            subject: self.subject.clone(),
            sender_email,
            sender_name: self.sender_name.clone(),
            html,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "production" => Ok(Environment::Production),
            other => Err(format!(
                "{other} is not supported environment. Try to use `local` or `production`",
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine current directory: {e}"))
    })?;
    let conf_dir = base_path.join("configuration");
    let env: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let settings = config::Config::builder()
        .add_source(config::File::from(conf_dir.join("base.yaml")).required(true))
        .add_source(
            config::File::from(conf_dir.join(format!("{}.yaml", env.as_str()))).required(true),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .prefix_separator("_"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
