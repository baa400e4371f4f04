use actix_web::{
    HttpRequest, HttpResponse,
    error::{InternalError, JsonPayloadError},
    http::StatusCode,
    web,
};

use crate::dispatch::{CampaignDispatcher, CampaignRequest, ErrorReport, InvocationResult};

/// Matches the synchronous Lambda payload ceiling.
const MAX_REQUEST_BYTES: usize = 6 * 1024 * 1024;

/// Bodies the `Json` extractor rejects are answered with a failed invocation
/// result instead of actix's plain-text error.
pub fn campaign_json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_REQUEST_BYTES)
        .error_handler(reject_payload)
}

fn reject_payload(error: JsonPayloadError, _request: &HttpRequest) -> actix_web::Error {
    let message = format!("Malformed request: {error}");
    tracing::warn!(error.message = %message, "Rejecting malformed campaign request.");

    let result = InvocationResult::failed(ErrorReport::validation(message), None, None, vec![]);
    InternalError::from_response(error, HttpResponse::BadRequest().json(result)).into()
}

#[tracing::instrument(
    name = "Publishing campaign to a batch of users",
    skip(body, dispatcher),
    fields(users = body.users.len())
)]
pub async fn publish_campaign(
    body: web::Json<CampaignRequest>,
    dispatcher: web::Data<CampaignDispatcher>,
) -> HttpResponse {
    let result = dispatcher.dispatch(body.into_inner()).await;
    let status =
        StatusCode::from_u16(result.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    HttpResponse::build(status).json(result)
}
