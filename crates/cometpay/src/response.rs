use crate::constants::{CODE_APPROVED, CODE_PENDING_3DS, SIGNATURE_FIELD};
use crate::error::GatewayError;
use crate::payload::SignablePayload;
use crate::signature;

/// Parsed processor reply. A response is either trusted (signature verified)
/// or discarded; accessors never imply trust on their own.
#[derive(Debug, Clone)]
pub struct TransactionResponse {
    payload: SignablePayload,
}

impl TransactionResponse {
    /// Parse a response body: JSON object first, URL-encoded form fallback.
    pub fn from_bytes(body: &[u8]) -> Result<Self, GatewayError> {
        let payload = SignablePayload::parse_body(body)
            .ok_or_else(|| GatewayError::Transport("unparseable response body".to_string()))?;
        Ok(Self { payload })
    }

    pub fn from_payload(payload: SignablePayload) -> Self {
        Self { payload }
    }

    pub fn payload(&self) -> &SignablePayload {
        &self.payload
    }

    pub fn code(&self) -> String {
        self.payload.get_str("code").unwrap_or_default()
    }

    pub fn message(&self) -> Option<String> {
        self.payload.get_str("message")
    }

    /// Processor-side transaction reference.
    pub fn reference(&self) -> Option<String> {
        self.payload.get_str("orderNo").filter(|s| !s.is_empty())
    }

    /// Redirect URL for 3D Secure authentication, when offered.
    pub fn three_ds_url(&self) -> Option<String> {
        self.payload.get_str("auth3DUrl").filter(|s| !s.is_empty())
    }

    pub fn provided_signature(&self) -> String {
        self.payload.get_str(SIGNATURE_FIELD).unwrap_or_default()
    }

    /// Verify the response signature with the merchant secret.
    pub fn verify(&self, secret_key: &str) -> bool {
        signature::verify(&self.payload, &self.provided_signature(), secret_key)
    }

    /// Gate that callers must pass before trusting any field of the
    /// response. Missing and mismatched signatures are the same failure.
    pub fn require_trusted(&self, secret_key: &str) -> Result<(), GatewayError> {
        if self.verify(secret_key) {
            Ok(())
        } else {
            Err(GatewayError::SignatureVerification)
        }
    }

    /// The subset of fields safe to write to operator logs. Never card data,
    /// never the signature itself.
    pub fn safe_log_fields(&self) -> serde_json::Value {
        let mut safe = serde_json::Map::new();
        for key in ["code", "message", "orderNo", "billNo"] {
            if let Some(value) = self.payload.get_str(key) {
                safe.insert(key.to_string(), serde_json::Value::String(value));
            }
        }
        serde_json::Value::Object(safe)
    }

    /// Map the result code of a *verified* response to an outcome.
    ///
    /// The pending-3DS code only yields a redirect when the feature is
    /// enabled and the processor supplied a URL; otherwise it falls through
    /// to a decline like any other non-approval code.
    pub fn outcome(&self, three_ds_enabled: bool) -> PaymentOutcome {
        let code = self.code();

        if code == CODE_PENDING_3DS && three_ds_enabled {
            if let Some(url) = self.three_ds_url() {
                return PaymentOutcome::AwaitingThreeDs { redirect_url: url };
            }
        }

        if code == CODE_APPROVED {
            return PaymentOutcome::Approved {
                reference: self.reference(),
            };
        }

        PaymentOutcome::Declined {
            message: self
                .message()
                .map(|m| strip_markup(&m))
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Unable to process the credit card payment.".to_string()),
        }
    }
}

/// Outcome of a verified response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Approved { reference: Option<String> },
    AwaitingThreeDs { redirect_url: String },
    Declined { message: String },
}

/// Strip markup tags from a processor message before showing it to a
/// shopper.
pub fn strip_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}
