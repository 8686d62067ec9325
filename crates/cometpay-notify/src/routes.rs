use actix_web::{get, web, HttpRequest, HttpResponse};
use cometpay::{signature, SignablePayload, TransactionResponse};

use crate::metrics;
use crate::state::AppState;

/// Extract the notification payload from the request.
///
/// Body JSON first, URL-encoded form second; legacy form posts from the
/// processor sometimes carry the fields in the query string instead, so that
/// is the final fallback.
fn extract_payload(req: &HttpRequest, body: &[u8]) -> SignablePayload {
    if let Some(payload) = SignablePayload::parse_body(body) {
        return payload;
    }
    SignablePayload::parse_body(req.query_string().as_bytes()).unwrap_or_default()
}

/// Verify a notification against the credentials active right now.
/// Returns the metric reason label on failure — every path is fail-closed.
fn verify_notification(
    state: &AppState,
    payload: &SignablePayload,
) -> Result<(), &'static str> {
    let credentials = match state.config.active_credentials() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "notification secret key missing");
            return Err("no_secret");
        }
    };

    let provided = payload
        .get_str(cometpay::constants::SIGNATURE_FIELD)
        .unwrap_or_default();
    if provided.is_empty() {
        tracing::warn!("notification arrived without a signature field");
        return Err("missing");
    }

    if !signature::verify(payload, &provided, &credentials.secret_key) {
        return Err("mismatch");
    }

    Ok(())
}

/// Handle one asynchronous notification from the processor.
///
/// Registered at the brand's notify path. This endpoint is an audit and
/// trust boundary only — it never mutates order state; any extension that
/// does must keep the verification gate in front.
pub async fn notify(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> HttpResponse {
    let payload = extract_payload(&req, &body);
    let snapshot = TransactionResponse::from_payload(payload.clone());

    match verify_notification(&state, &payload) {
        Ok(()) => {
            metrics::NOTIFY_REQUESTS.with_label_values(&["verified"]).inc();
            tracing::info!(fields = %snapshot.safe_log_fields(), "notification verified");
            HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
        }
        Err(reason) => {
            metrics::NOTIFY_REQUESTS.with_label_values(&["rejected"]).inc();
            metrics::SIGNATURE_FAILURES
                .with_label_values(&[reason])
                .inc();
            tracing::error!(
                fields = %snapshot.safe_log_fields(),
                reason,
                "notification signature verification failed"
            );
            HttpResponse::BadRequest().json(serde_json::json!({
                "error": "signature verification failed"
            }))
        }
    }
}

#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "cometpay-notify",
        "brand": state.config.brand.display_name(),
        "mode": if state.config.test_mode { "test" } else { "live" },
    }))
}

#[get("/metrics")]
pub async fn metrics_endpoint(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    match &state.metrics_token {
        Some(token) => {
            let authorized = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| signature::constant_time_eq(t.as_bytes(), token))
                .unwrap_or(false);

            if !authorized {
                return HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "unauthorized",
                    "message": "Valid Bearer token required for /metrics"
                }));
            }
        }
        None => {
            return HttpResponse::Forbidden().json(serde_json::json!({
                "error": "forbidden",
                "message": "Set NOTIFY_METRICS_TOKEN to access /metrics"
            }));
        }
    }
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::metrics_output())
}
