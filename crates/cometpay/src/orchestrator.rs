//! Drives one payment attempt end-to-end.
//!
//! Per-attempt state machine:
//! `BUILDING -> SIGNED -> SENT -> {AWAITING_3DS, APPROVED, DECLINED,
//! TRANSPORT_FAILED, RESPONSE_UNTRUSTED}`. The first three states are
//! transient and internal; [`PaymentResult`] carries the terminal state.
//! `AWAITING_3DS` is terminal for the orchestration run — control returns to
//! the shopper's browser and the final outcome arrives via notification.
//!
//! Side effects are strictly ordered: no order hook fires before the
//! response signature has verified. Nothing here retries; a failed attempt
//! terminates and the shopper may resubmit, which produces a freshly signed
//! request under the same bill number.

use std::future::Future;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::order::{CardDetails, OrderSnapshot};
use crate::payload::SignablePayload;
use crate::request::TransactionRequest;
use crate::response::{PaymentOutcome, TransactionResponse};

/// Transport seam: submits one signed payload and returns the raw response
/// body. Production uses [`HttpProcessor`]; tests substitute canned bodies.
/// Retry policy belongs to the transport, never to the orchestrator.
pub trait Processor: Send + Sync {
    fn submit(
        &self,
        payload: &SignablePayload,
    ) -> impl Future<Output = Result<Vec<u8>, GatewayError>> + Send;
}

/// Order mutation seam, owned by the host platform's storage layer.
/// None of these fire for an unverified response.
pub trait OrderHooks {
    /// Persist the processor's transaction reference on the order record.
    fn store_reference(&mut self, reference: &str);
    /// Mark the order paid. `reference` is the processor transaction id.
    fn mark_paid(&mut self, reference: Option<&str>);
    /// Mark the order pending while the shopper completes 3D Secure.
    fn mark_pending_three_ds(&mut self);
}

/// Terminal state of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentResult {
    Approved {
        reference: Option<String>,
    },
    /// Shopper must be redirected to the processor's authentication page.
    AwaitingThreeDs {
        redirect_url: String,
    },
    Declined {
        message: String,
    },
    /// Network error, non-2xx, or unparseable body. Generic retryable
    /// failure from the shopper's perspective; detail goes to the log.
    TransportFailed,
    /// Response signature missing or mismatched. The claimed result code is
    /// never trusted and the order is never marked paid.
    ResponseUntrusted,
}

/// Submits signed payloads to the real processor endpoint over HTTPS.
pub struct HttpProcessor {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpProcessor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            // Processor latency regularly exceeds 30s on 3DS-capable cards.
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpProcessor {
    /// Targets the production processor endpoint.
    fn default() -> Self {
        Self::new(crate::constants::PAY_ENDPOINT)
    }
}

impl Processor for HttpProcessor {
    async fn submit(&self, payload: &SignablePayload) -> Result<Vec<u8>, GatewayError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .header("content-type", "application/x-www-form-urlencoded")
            .timeout(self.timeout)
            .body(payload.to_form_body())
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::Transport(format!(
                "processor returned {status}"
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(format!("body read failed: {e}")))?;

        if body.is_empty() {
            return Err(GatewayError::Transport("empty response body".to_string()));
        }

        Ok(body.to_vec())
    }
}

/// Run one checkout attempt.
///
/// Configuration and validation failures surface as `Err` before any network
/// call; every attempt that reaches the wire terminates in one of the
/// [`PaymentResult`] states.
pub async fn process_payment<P: Processor, H: OrderHooks>(
    config: &GatewayConfig,
    order: &OrderSnapshot,
    card: &CardDetails,
    processor: &P,
    hooks: &mut H,
) -> Result<PaymentResult, GatewayError> {
    // BUILDING -> SIGNED. Credentials are read fresh here, never cached
    // across a test/live toggle.
    let credentials = config.active_credentials()?;
    let request = TransactionRequest::build(config, order, card)?;

    tracing::debug!(
        order_id = order.id,
        bill_no = request.bill_number(),
        card_prefix = %card.log_prefix(),
        mode = credentials.mode.as_str(),
        "payment request signed"
    );

    // SIGNED -> SENT
    let body = match processor.submit(request.payload()).await {
        Ok(body) => body,
        Err(GatewayError::Transport(detail)) => {
            tracing::error!(order_id = order.id, %detail, "payment transport failed");
            return Ok(PaymentResult::TransportFailed);
        }
        Err(other) => return Err(other),
    };

    let response = match TransactionResponse::from_bytes(&body) {
        Ok(resp) => resp,
        Err(_) => {
            tracing::error!(order_id = order.id, "payment response body unparseable");
            return Ok(PaymentResult::TransportFailed);
        }
    };

    // Verify with the same active secret before trusting anything.
    if let Err(e) = response.require_trusted(&credentials.secret_key) {
        tracing::error!(
            order_id = order.id,
            error = %e,
            fields = %response.safe_log_fields(),
            "rejecting payment response"
        );
        return Ok(PaymentResult::ResponseUntrusted);
    }

    tracing::info!(
        order_id = order.id,
        fields = %response.safe_log_fields(),
        "payment response verified"
    );

    if let Some(reference) = response.reference() {
        hooks.store_reference(&reference);
    }

    match response.outcome(config.enable_three_ds) {
        PaymentOutcome::Approved { reference } => {
            hooks.mark_paid(reference.as_deref());
            Ok(PaymentResult::Approved { reference })
        }
        PaymentOutcome::AwaitingThreeDs { redirect_url } => {
            hooks.mark_pending_three_ds();
            Ok(PaymentResult::AwaitingThreeDs { redirect_url })
        }
        PaymentOutcome::Declined { message } => Ok(PaymentResult::Declined { message }),
    }
}
