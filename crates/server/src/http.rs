use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use pressy_slack::{
    events::{self, EventContext, InboundInteraction},
    ingress::ActionIngress,
    signature::{self, SignatureError},
};

#[derive(Clone)]
pub struct AppState {
    pub ingress: Arc<ActionIngress>,
    pub signing_secret: SecretString,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/slack/actions", post(slack_actions))
        .route("/health", get(crate::health::health))
        .with_state(state)
}

/// Interaction endpoint. The 200 response is the platform acknowledgment;
/// it is written before reply delivery, which runs on a spawned task.
pub async fn slack_actions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    if let Err(error) = verify_signature(&state.signing_secret, &headers, &body) {
        warn!(
            event_name = "ingress.slack.signature_rejected",
            error = %error,
            correlation_id = "unknown",
            "rejected interaction request"
        );
        return StatusCode::UNAUTHORIZED;
    }

    match events::parse_interaction_body(&body) {
        Ok(InboundInteraction::BlockActions { trigger_id, events }) => {
            let correlation_id = trigger_id.unwrap_or_else(|| "unknown".to_owned());
            info!(
                event_name = "ingress.slack.ack_sent",
                actions = events.len(),
                correlation_id = %correlation_id,
                "acknowledged interaction"
            );

            for event in events {
                let ingress = state.ingress.clone();
                let ctx = EventContext { correlation_id: correlation_id.clone() };
                tokio::spawn(async move {
                    if let Err(error) = ingress.process(&event, &ctx).await {
                        warn!(
                            event_name = "ingress.slack.processing_failed",
                            action_id = %event.action_id,
                            error = %error,
                            correlation_id = %ctx.correlation_id,
                            "interaction processing failed"
                        );
                    }
                });
            }

            StatusCode::OK
        }
        Ok(InboundInteraction::SslCheck) => {
            debug!(event_name = "ingress.slack.ssl_check", "answered ssl_check probe");
            StatusCode::OK
        }
        Ok(InboundInteraction::Unsupported { payload_type }) => {
            debug!(
                event_name = "ingress.slack.unsupported_payload",
                payload_type = %payload_type,
                "ignored unsupported interaction payload"
            );
            StatusCode::OK
        }
        Err(error) => {
            warn!(
                event_name = "ingress.slack.payload_rejected",
                error = %error,
                "could not decode interaction request"
            );
            StatusCode::BAD_REQUEST
        }
    }
}

fn verify_signature(
    signing_secret: &SecretString,
    headers: &HeaderMap,
    body: &str,
) -> Result<(), SignatureError> {
    let timestamp = header_str(headers, signature::TIMESTAMP_HEADER)?;
    let provided = header_str(headers, signature::SIGNATURE_HEADER)?;

    signature::verify(
        signing_secret.expose_secret(),
        timestamp,
        provided,
        body,
        Utc::now().timestamp(),
    )
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, SignatureError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or(SignatureError::MissingHeader(name))
}
