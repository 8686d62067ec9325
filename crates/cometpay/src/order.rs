/// Billing or shipping identity block as the host platform stores it.
/// Fields may be empty; the request builder applies the processor's
/// placeholder and cascade rules.
#[derive(Debug, Clone, Default)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub line1: String,
    pub line2: String,
    pub postcode: String,
    pub email: String,
    pub phone: String,
}

impl Address {
    /// Street lines joined the way the processor expects a single field.
    pub fn street(&self) -> String {
        format!("{} {}", self.line1, self.line2).trim().to_string()
    }
}

/// Snapshot of the order at payment submission, taken from the host
/// platform's order record. Already sanitized — never raw form input.
#[derive(Debug, Clone)]
pub struct OrderSnapshot {
    pub id: u64,
    /// Unix timestamp of order creation. Combined with the id to derive a
    /// bill number that stays stable across resubmissions of the same order.
    pub created_at: i64,
    pub total: f64,
    /// ISO currency code (`USD`, `GBP`, ...).
    pub currency: String,
    pub billing: Address,
    pub shipping: Address,
    /// Line item names, reported as product info.
    pub item_names: Vec<String>,
    pub client_ip: String,
}

/// Card entry fields collected at checkout.
pub struct CardDetails {
    pub holder: String,
    pub number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvc: String,
}

impl CardDetails {
    /// Short non-sensitive prefix of the PAN for operator logs. The full
    /// number and CVC are never persisted anywhere.
    pub fn log_prefix(&self) -> String {
        let digits: String = self.number.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            "n/a".to_string()
        } else {
            digits.chars().take(5).collect()
        }
    }
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("holder", &self.holder)
            .field("number", &format!("{}…", self.log_prefix()))
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("cvc", &"[REDACTED]")
            .finish()
    }
}
