use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use secrecy::SecretString;
use tracing_actix_web::TracingLogger;

use crate::configuration::{MailerSettings, Settings};
use crate::dispatch::CampaignDispatcher;
use crate::routes::{campaign_json_config, health_check, publish_campaign};
use crate::secrets::{AwsSecretStore, fetch_api_key};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let dispatcher = build_dispatcher(&config).await?;

        let address = format!("{}:{}", config.application.host, config.application.port);
        let listener =
            TcpListener::bind(&address).with_context(|| format!("Failed to bind {address}"))?;
        let port = listener.local_addr()?.port();
        let server = run(listener, dispatcher)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(listener: TcpListener, dispatcher: CampaignDispatcher) -> Result<Server, anyhow::Error> {
    let dispatcher = web::Data::new(dispatcher);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/campaigns", web::post().to(publish_campaign))
            .app_data(campaign_json_config())
            .app_data(dispatcher.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

/// Resolves the API key once and wires the client, template and dispatcher
/// shared by every invocation of this process.
pub async fn build_dispatcher(config: &Settings) -> Result<CampaignDispatcher, anyhow::Error> {
    let api_key = mailer_api_key(&config.mailer).await?;
    let client = config.mailer.client(api_key)?;
    let template = config.campaign.template()?;

    Ok(CampaignDispatcher::new(
        client,
        template,
        config.campaign.group_prefix.clone(),
        config.campaign.concurrency,
    ))
}

async fn mailer_api_key(settings: &MailerSettings) -> Result<SecretString, anyhow::Error> {
    match &settings.secret {
        Some(secret) => fetch_api_key(&AwsSecretStore::from_env().await, secret).await,
        None => settings
            .api_key
            .clone()
            .context("No mailer API key configured. Set `mailer.api_key` or `mailer.secret`."),
    }
}
