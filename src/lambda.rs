//! Lambda surface: accepts API Gateway proxy events as well as direct
//! invocations carrying the campaign request itself.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::dispatch::{CampaignDispatcher, CampaignRequest, ErrorReport, InvocationResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

impl ApiGatewayResponse {
    fn from_result(result: &InvocationResult) -> Self {
        let body = serde_json::to_string(result).unwrap_or_else(|error| {
            json!({
                "status": "failed",
                "error": { "kind": "upstream_error", "message": error.to_string() },
            })
            .to_string()
        });

        Self {
            status_code: result.status_code(),
            headers: json!({ "Content-Type": "application/json" }),
            body,
        }
    }
}

pub async fn handle_event(dispatcher: &CampaignDispatcher, event: Value) -> ApiGatewayResponse {
    let result = match parse_event(event) {
        Ok(request) => dispatcher.dispatch(request).await,
        Err(message) => {
            tracing::warn!(error.message = %message, "Rejecting malformed invocation payload.");
            InvocationResult::failed(ErrorReport::validation(message), None, None, vec![])
        }
    };

    ApiGatewayResponse::from_result(&result)
}

pub fn parse_event(event: Value) -> Result<CampaignRequest, String> {
    let payload = normalize_apigw_event(event)?;
    serde_json::from_value(payload).map_err(|error| format!("Malformed request: {error}"))
}

fn normalize_apigw_event(event: Value) -> Result<Value, String> {
    let Some(object) = event.as_object() else {
        return Err("Request payload must be a JSON object".to_string());
    };

    let Some(body) = object.get("body") else {
        return Ok(event);
    };

    match body {
        Value::Null => Ok(json!({})),
        Value::Object(_) => Ok(body.clone()),
        Value::String(text) => {
            serde_json::from_str(text).map_err(|error| format!("Malformed JSON body: {error}"))
        }
        _ => Err("Request body must be a JSON object".to_string()),
    }
}
