pub mod configuration;
pub mod dispatch;
pub mod domain;
pub mod helpers;
pub mod lambda;
pub mod mailer_client;
pub mod routes;
pub mod secrets;
pub mod startup;
pub mod telemetry;
