use lambda_runtime::{Error, LambdaEvent, service_fn};
use mailer_dispatch::{
    configuration::get_configuration,
    lambda::{ApiGatewayResponse, handle_event},
    startup::build_dispatcher,
    telemetry::{get_subscriber, init_subscriber},
};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let subscriber = get_subscriber("mailer-dispatch".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber)?;

    let config = get_configuration()?;
    // Built once per execution environment; warm invocations reuse the key and connections.
    let dispatcher = build_dispatcher(&config).await?;
    let dispatcher = &dispatcher;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<ApiGatewayResponse, Error>(handle_event(dispatcher, event.payload).await)
    }))
    .await
}
