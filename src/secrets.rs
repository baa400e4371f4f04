use anyhow::Context;
use secrecy::SecretString;

use crate::configuration::SecretSettings;

/// Source of secret strings, looked up by name.
pub trait SecretStore {
    fn secret_string(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<String, anyhow::Error>> + Send;
}

/// AWS Secrets Manager, configured from the ambient AWS environment.
pub struct AwsSecretStore {
    client: aws_sdk_secretsmanager::Client,
}

impl AwsSecretStore {
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: aws_sdk_secretsmanager::Client::new(&config),
        }
    }
}

impl SecretStore for AwsSecretStore {
    fn secret_string(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<String, anyhow::Error>> + Send {
        let request = self.client.get_secret_value().secret_id(name);
        let name = name.to_string();

        async move {
            let output = request
                .send()
                .await
                .with_context(|| format!("Failed to fetch secret {name}."))?;
            output
                .secret_string()
                .map(str::to_owned)
                .with_context(|| format!("Secret {name} has no string value."))
        }
    }
}

#[tracing::instrument(name = "Fetching mailer API key", skip(store))]
pub async fn fetch_api_key(
    store: &impl SecretStore,
    secret: &SecretSettings,
) -> Result<SecretString, anyhow::Error> {
    let blob = store.secret_string(&secret.name).await?;
    api_key_from_blob(&blob, &secret.field)
}

/// Reads `field` out of a JSON credential blob.
pub fn api_key_from_blob(blob: &str, field: &str) -> Result<SecretString, anyhow::Error> {
    let credentials: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(blob).context("The credential blob is not a JSON object.")?;

    let key = credentials
        .get(field)
        .and_then(serde_json::Value::as_str)
        .filter(|key| !key.trim().is_empty())
        .with_context(|| format!("The credential blob has no `{field}` string."))?;

    Ok(SecretString::from(key.to_string()))
}
