//! Outbound payment request assembly.
//!
//! One `TransactionRequest` is built per checkout attempt, signed once, and
//! never mutated afterwards — any change after signing would invalidate the
//! signature.

use chrono::Utc;
use serde_json::json;

use crate::config::{Credentials, GatewayConfig};
use crate::constants::{currency_code, LANGUAGE, SIGNATURE_FIELD};
use crate::error::GatewayError;
use crate::order::{CardDetails, OrderSnapshot};
use crate::payload::SignablePayload;
use crate::signature;

/// Placeholder for required text fields the order does not carry.
const PLACEHOLDER_TEXT: &str = "NA";
/// Placeholder for a missing postal code.
const PLACEHOLDER_ZIP: &str = "000000";
/// Placeholder for a missing phone number.
const PLACEHOLDER_PHONE: &str = "0000000000";

/// A signed outbound request, ready to submit.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    payload: SignablePayload,
    bill_number: String,
}

impl TransactionRequest {
    /// Assemble and sign the request for one checkout attempt.
    ///
    /// Validates card entry fields first (`GatewayError::Validation`) and
    /// requires a configured secret key (`GatewayError::Config`) — both
    /// abort before any network call.
    pub fn build(
        config: &GatewayConfig,
        order: &OrderSnapshot,
        card: &CardDetails,
    ) -> Result<Self, GatewayError> {
        validate_card(card)?;
        let credentials = config.active_credentials()?;

        let bill_number = bill_number(order);
        let payload = assemble(config, &credentials, order, card, &bill_number);

        Ok(Self {
            payload,
            bill_number,
        })
    }

    /// The signed payload. Treat as immutable.
    pub fn payload(&self) -> &SignablePayload {
        &self.payload
    }

    /// Merchant-side unique reference for this order.
    pub fn bill_number(&self) -> &str {
        &self.bill_number
    }
}

fn validate_card(card: &CardDetails) -> Result<(), GatewayError> {
    let required = [
        (card.holder.trim(), "card holder name"),
        (card.number.trim(), "card number"),
        (card.expiry_month.trim(), "card expiry month"),
        (card.expiry_year.trim(), "card expiry year"),
        (card.cvc.trim(), "card CVC"),
    ];
    for (value, label) in required {
        if value.is_empty() {
            return Err(GatewayError::Validation(format!("missing {label}")));
        }
    }
    Ok(())
}

/// Digit-only unique bill number, at most 30 characters, derived from the
/// order id plus its creation timestamp. Deterministic, so a resubmission
/// after a transient failure is recognizable as the same logical
/// transaction.
pub fn bill_number(order: &OrderSnapshot) -> String {
    let raw = format!("{}{}", order.id, order.created_at);
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(30)
        .collect()
}

fn assemble(
    config: &GatewayConfig,
    credentials: &Credentials,
    order: &OrderSnapshot,
    card: &CardDetails,
    bill_number: &str,
) -> SignablePayload {
    let billing = &order.billing;
    let shipping = &order.shipping;

    let billing_first = cap(&billing.first_name, 60);
    let billing_last = cap(&billing.last_name, 30);
    let billing_city = or_placeholder(&billing.city, PLACEHOLDER_TEXT);
    let billing_street = or_placeholder(&billing.street(), PLACEHOLDER_TEXT);
    let billing_zip = or_placeholder(&billing.postcode, PLACEHOLDER_ZIP);
    let billing_email = or_placeholder(&billing.email, PLACEHOLDER_TEXT);
    let billing_phone = or_placeholder(&billing.phone, PLACEHOLDER_PHONE);

    let product_info = if order.item_names.is_empty() {
        json!([format!("Order #{}", order.id)])
    } else {
        json!(order.item_names)
    };

    let mut payload = SignablePayload::new();
    payload.insert("merNo", credentials.merchant_id.clone());
    payload.insert("amount", format!("{:.2}", order.total));
    payload.insert("billNo", bill_number);
    payload.insert("currency", currency_code(&order.currency));
    payload.insert("returnURL", config.return_url.clone());
    payload.insert("notifyUrl", config.notify_url.clone());
    payload.insert("tradeUrl", config.trade_url.clone());
    payload.insert("firstName", billing_first.clone());
    payload.insert("lastName", billing_last.clone());
    payload.insert("country", billing.country.to_uppercase());
    payload.insert("state", or_placeholder(&billing.state, PLACEHOLDER_TEXT));
    payload.insert("city", billing_city.clone());
    payload.insert("address", billing_street.clone());
    payload.insert("zipCode", billing_zip.clone());
    payload.insert("email", billing_email.clone());
    payload.insert("phone", billing_phone.clone());
    payload.insert("cardNum", digits(&card.number));
    payload.insert("month", pad_month(&card.expiry_month));
    payload.insert("year", last_four(&card.expiry_year));
    payload.insert("cvv2", digits(&card.cvc));
    payload.insert("productInfo", product_info);
    payload.insert("ip", order.client_ip.clone());
    payload.insert("dataTime", Utc::now().format("%Y%m%d%H%M%S").to_string());

    // Shipping cascades: shipping value, then billing, then placeholder.
    payload.insert(
        "shippingFirstName",
        cascade(&cap(&shipping.first_name, 60), &billing_first),
    );
    payload.insert(
        "shippingLastName",
        cascade(&cap(&shipping.last_name, 30), &billing_last),
    );
    payload.insert(
        "shippingCountry",
        cascade(&shipping.country.to_uppercase(), &billing.country.to_uppercase()),
    );
    payload.insert(
        "shippingState",
        cascade(&shipping.state, &billing.state),
    );
    payload.insert("shippingCity", cascade(&shipping.city, &billing_city));
    payload.insert(
        "shippingAddress",
        cascade(&shipping.street(), &billing_street),
    );
    payload.insert("shippingZipCode", cascade_with(&shipping.postcode, &billing_zip));
    payload.insert("shippingEmail", cascade_with(&shipping.email, &billing_email));
    payload.insert("shippingPhone", cascade_with(&shipping.phone, &billing_phone));

    payload.insert(
        "isThreeDPay",
        if config.enable_three_ds { "Y" } else { "N" },
    );
    payload.insert("language", LANGUAGE);

    let sig = signature::sign(&payload, &credentials.secret_key);
    payload.insert(SIGNATURE_FIELD, sig);

    payload
}

fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn cap(s: &str, max: usize) -> String {
    s.trim().chars().take(max).collect()
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        placeholder.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Shipping field cascade where the billing value may itself be empty.
fn cascade(shipping: &str, billing: &str) -> String {
    let shipping = shipping.trim();
    if !shipping.is_empty() {
        return shipping.to_string();
    }
    or_placeholder(billing, PLACEHOLDER_TEXT)
}

/// Cascade against a billing value that already carries its placeholder.
fn cascade_with(shipping: &str, billing_resolved: &str) -> String {
    let shipping = shipping.trim();
    if shipping.is_empty() {
        billing_resolved.to_string()
    } else {
        shipping.to_string()
    }
}

fn pad_month(month: &str) -> String {
    let m = digits(month);
    format!("{m:0>2}")
}

fn last_four(year: &str) -> String {
    let y = digits(year);
    let len = y.len();
    y.chars().skip(len.saturating_sub(4)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::order::Address;
    use crate::signature::verify;

    fn full_billing() -> Address {
        Address {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            country: "us".to_string(),
            state: "CA".to_string(),
            city: "San Jose".to_string(),
            line1: "1 Main St".to_string(),
            line2: "Apt 2".to_string(),
            postcode: "95110".to_string(),
            email: "jane@example.com".to_string(),
            phone: "+1 555 0100".to_string(),
        }
    }

    fn order() -> OrderSnapshot {
        OrderSnapshot {
            id: 4200,
            created_at: 1_715_000_000,
            total: 111.0,
            currency: "USD".to_string(),
            billing: full_billing(),
            shipping: Address::default(),
            item_names: vec!["Widget".to_string()],
            client_ip: "203.0.113.9".to_string(),
        }
    }

    fn card() -> CardDetails {
        CardDetails {
            holder: "Jane Doe".to_string(),
            number: "4111 1111 1111 1111".to_string(),
            expiry_month: "7".to_string(),
            expiry_year: "2027".to_string(),
            cvc: "123".to_string(),
        }
    }

    #[test]
    fn full_order_produces_verifiable_request() {
        let config = test_config("sandbox-secret");
        let request = TransactionRequest::build(&config, &order(), &card()).unwrap();
        let payload = request.payload();

        assert_eq!(payload.get_str("amount").as_deref(), Some("111.00"));
        assert_eq!(payload.get_str("currency").as_deref(), Some("1"));
        assert_eq!(payload.get_str("merNo").as_deref(), Some("M1001"));
        assert_eq!(payload.get_str("country").as_deref(), Some("US"));

        let sig = payload.get_str("md5Info").expect("signature attached");
        assert!(verify(payload, &sig, "sandbox-secret"));
    }

    #[test]
    fn bill_number_is_deterministic_digits_capped_at_30() {
        let o = order();
        let a = bill_number(&o);
        let b = bill_number(&o);
        assert_eq!(a, b);
        assert_eq!(a, "42001715000000");
        assert!(a.len() <= 30);
        assert!(a.bytes().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn card_fields_are_normalized() {
        let config = test_config("sandbox-secret");
        let request = TransactionRequest::build(&config, &order(), &card()).unwrap();
        let payload = request.payload();

        assert_eq!(
            payload.get_str("cardNum").as_deref(),
            Some("4111111111111111")
        );
        assert_eq!(payload.get_str("month").as_deref(), Some("07"));
        assert_eq!(payload.get_str("year").as_deref(), Some("2027"));
        assert_eq!(payload.get_str("cvv2").as_deref(), Some("123"));
    }

    #[test]
    fn empty_shipping_cascades_to_billing_then_placeholders() {
        let config = test_config("sandbox-secret");
        let mut o = order();
        o.billing.phone = String::new();
        o.billing.postcode = String::new();

        let request = TransactionRequest::build(&config, &o, &card()).unwrap();
        let payload = request.payload();

        assert_eq!(payload.get_str("shippingFirstName").as_deref(), Some("Jane"));
        assert_eq!(payload.get_str("shippingCity").as_deref(), Some("San Jose"));
        // billing phone/zip absent: placeholder flows through the cascade
        assert_eq!(payload.get_str("shippingPhone").as_deref(), Some("0000000000"));
        assert_eq!(payload.get_str("shippingZipCode").as_deref(), Some("000000"));
        assert_eq!(payload.get_str("phone").as_deref(), Some("0000000000"));
        assert_eq!(payload.get_str("zipCode").as_deref(), Some("000000"));
    }

    #[test]
    fn missing_billing_identity_uses_placeholders() {
        let config = test_config("sandbox-secret");
        let mut o = order();
        o.billing = Address::default();
        o.shipping = Address::default();

        let request = TransactionRequest::build(&config, &o, &card()).unwrap();
        let payload = request.payload();

        assert_eq!(payload.get_str("city").as_deref(), Some("NA"));
        assert_eq!(payload.get_str("address").as_deref(), Some("NA"));
        assert_eq!(payload.get_str("state").as_deref(), Some("NA"));
        assert_eq!(payload.get_str("email").as_deref(), Some("NA"));
        assert_eq!(payload.get_str("shippingCountry").as_deref(), Some("NA"));
    }

    #[test]
    fn empty_item_list_reports_order_reference() {
        let config = test_config("sandbox-secret");
        let mut o = order();
        o.item_names.clear();

        let request = TransactionRequest::build(&config, &o, &card()).unwrap();
        assert_eq!(
            request.payload().get_str("productInfo").as_deref(),
            Some(r#"["Order #4200"]"#)
        );
    }

    #[test]
    fn missing_card_field_is_a_validation_error() {
        let config = test_config("sandbox-secret");
        let mut c = card();
        c.cvc = "  ".to_string();

        let err = TransactionRequest::build(&config, &order(), &c).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[test]
    fn missing_secret_key_aborts_before_assembly() {
        let config = test_config("");
        let err = TransactionRequest::build(&config, &order(), &card()).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn three_ds_flag_follows_configuration() {
        let mut config = test_config("sandbox-secret");
        config.enable_three_ds = true;
        let request = TransactionRequest::build(&config, &order(), &card()).unwrap();
        assert_eq!(request.payload().get_str("isThreeDPay").as_deref(), Some("Y"));
    }
}
