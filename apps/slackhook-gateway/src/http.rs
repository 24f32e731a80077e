use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{RawQuery, State},
    http::{HeaderMap, Method as HttpMethod, StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
};
use serde_json::{Map, Value};
use slackhook_core::{Dispatcher, Handled, InboundEvent, Method, OAuthQuery, Reply};
use time::OffsetDateTime;
use tracing::{Instrument, debug, error, warn};

use crate::signature::verify_slack_sig;

#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: Dispatcher,
    pub signing_secret: Option<String>,
}

pub fn build_router(state: GatewayState, path: &str) -> Router {
    Router::new()
        .route(path, any(handle))
        .with_state(Arc::new(state))
}

async fn handle(
    State(state): State<Arc<GatewayState>>,
    method: HttpMethod,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let span = tracing::info_span!("slack.request", method = %method);
    async move {
        let event = match Method::parse(method.as_str()) {
            Method::Get => InboundEvent::get(parse_query(raw_query.as_deref())),
            Method::Post => {
                if let Some(secret) = state.signing_secret.as_deref() {
                    let now = OffsetDateTime::now_utc().unix_timestamp();
                    if !verify_slack_sig(secret, &headers, &body, now) {
                        warn!("invalid slack signature");
                        return reply_response(Reply::Unauthorized);
                    }
                }
                match parse_body(&headers, &body) {
                    Ok(value) => InboundEvent::post(value),
                    Err(err) => {
                        warn!(error = %err, "slack body parse error");
                        return reply_response(Reply::BadRequest(err.to_string()));
                    }
                }
            }
            Method::Other(other) => InboundEvent::other(other),
        };

        match state.dispatcher.handle(event).await {
            Some(Handled { reply, delivery }) => {
                if let Some(delivery) = delivery {
                    tokio::spawn(
                        async move {
                            if let Err(err) = delivery.await {
                                error!(error = %err, "slack delivery task failed");
                            }
                        }
                        .in_current_span(),
                    );
                }
                reply_response(reply)
            }
            None => {
                debug!("request ignored");
                StatusCode::NO_CONTENT.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

fn parse_query(raw: Option<&str>) -> OAuthQuery {
    raw.map(|raw| url::form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// JSON bodies are decoded as-is; anything else is read as a urlencoded form.
pub fn parse_body(headers: &HeaderMap, body: &[u8]) -> Result<Value, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false);
    if is_json {
        return serde_json::from_slice(body);
    }
    let form = url::form_urlencoded::parse(body)
        .into_owned()
        .map(|(key, value)| (key, Value::String(value)))
        .collect::<Map<_, _>>();
    Ok(Value::Object(form))
}

pub fn reply_response(reply: Reply) -> Response {
    match reply {
        Reply::Redirect(location) | Reply::InstallFailed { location } => {
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        Reply::Unauthorized => (StatusCode::UNAUTHORIZED, "[401] Unauthorized").into_response(),
        Reply::Challenge(challenge) => (StatusCode::OK, challenge).into_response(),
        Reply::Ack => StatusCode::OK.into_response(),
        Reply::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
    }
}
