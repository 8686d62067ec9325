/// Production processor endpoint for card payment requests.
pub const PAY_ENDPOINT: &str = "https://api.thelinemall.com/apiv2/pay";

/// Reserved payload field carrying the signature. Always excluded from
/// canonicalization, whether present or not.
pub const SIGNATURE_FIELD: &str = "md5Info";

/// Result code for an approved transaction.
pub const CODE_APPROVED: &str = "P0001";

/// Result code asking the shopper to complete 3D Secure authentication.
pub const CODE_PENDING_3DS: &str = "Q0001";

/// Language hint sent with every payment request.
pub const LANGUAGE: &str = "EN";

/// Map an ISO currency code to the processor's numeric code.
///
/// Unmapped currencies pass through unchanged; the processor rejects
/// anything it does not support.
pub fn currency_code(iso: &str) -> String {
    match iso {
        "USD" => "1",
        "EUR" => "2",
        "RMB" => "3",
        "GBP" => "4",
        "HKD" => "5",
        "JPY" => "6",
        "AUD" => "7",
        "NOK" => "8",
        "CAD" => "11",
        "DKK" => "12",
        "SEK" => "13",
        "TWD" => "14",
        other => return other.to_string(),
    }
    .to_string()
}

/// Branded variants of the gateway. One protocol core serves both; only
/// display strings, checkout field prefix, and the notification path differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Brand {
    #[default]
    Comet,
    Alc,
}

impl Brand {
    /// Title shown to shoppers at checkout.
    pub fn display_name(&self) -> &'static str {
        match self {
            Brand::Comet => "Comet Pay",
            Brand::Alc => "ALC Payment",
        }
    }

    /// Prefix for checkout form field names (`<prefix>_card_number`, ...).
    pub fn field_prefix(&self) -> &'static str {
        match self {
            Brand::Comet => "comet",
            Brand::Alc => "alc",
        }
    }

    /// Webhook path the processor posts asynchronous notifications to.
    pub fn notify_path(&self) -> &'static str {
        match self {
            Brand::Comet => "/comet-notify",
            Brand::Alc => "/alc-notify",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "comet" => Some(Brand::Comet),
            "alc" => Some(Brand::Alc),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_currencies_use_numeric_codes() {
        assert_eq!(currency_code("USD"), "1");
        assert_eq!(currency_code("GBP"), "4");
        assert_eq!(currency_code("TWD"), "14");
    }

    #[test]
    fn unmapped_currency_passes_through() {
        assert_eq!(currency_code("XYZ"), "XYZ");
    }

    #[test]
    fn brand_profiles_differ_only_in_naming() {
        assert_eq!(Brand::Comet.notify_path(), "/comet-notify");
        assert_eq!(Brand::Alc.notify_path(), "/alc-notify");
        assert_eq!(Brand::from_str_loose("ALC"), Some(Brand::Alc));
        assert_eq!(Brand::from_str_loose("unknown"), None);
    }
}
