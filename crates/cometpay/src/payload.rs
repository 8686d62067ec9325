use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A flat key/value payload in the shape the processor signs and verifies.
///
/// Keys are held in a `BTreeMap`, so iteration order is already the
/// ascending byte order the signature protocol requires. Values are JSON
/// values: scalars are rendered as their plain string form, composites are
/// serialized to compact JSON before use on the wire or in a signature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignablePayload {
    fields: BTreeMap<String, Value>,
}

impl SignablePayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Fetch a field rendered as a string, the way it would appear in the
    /// canonical form. Returns `None` for absent fields.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.fields.get(key).map(render_value)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterate fields in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Encode the payload as an `application/x-www-form-urlencoded` body.
    pub fn to_form_body(&self) -> String {
        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.iter() {
            ser.append_pair(key, &render_value(value));
        }
        ser.finish()
    }

    /// Parse an inbound body: JSON object first, URL-encoded form second.
    ///
    /// Both the synchronous response path and the asynchronous notification
    /// path accept either encoding from the processor. Returns `None` when
    /// neither parse yields any fields.
    pub fn parse_body(body: &[u8]) -> Option<Self> {
        if let Ok(payload) = serde_json::from_slice::<Self>(body) {
            return Some(payload);
        }

        let fields: BTreeMap<String, Value> = url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();

        if fields.is_empty() {
            None
        } else {
            Some(Self { fields })
        }
    }
}

impl FromIterator<(String, Value)> for SignablePayload {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Render a value the way the wire format and the signature base expect it:
/// strings as-is, other scalars via their display form, composites as
/// compact JSON with stable key order.
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(value).unwrap_or_default()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn iteration_is_key_sorted_regardless_of_insertion_order() {
        let mut payload = SignablePayload::new();
        payload.insert("zebra", "1");
        payload.insert("alpha", "2");
        payload.insert("mango", "3");

        let keys: Vec<&str> = payload.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["alpha", "mango", "zebra"]);
    }

    #[test]
    fn parse_body_accepts_json_object() {
        let body = br#"{"code":"P0001","orderNo":"12345"}"#;
        let payload = SignablePayload::parse_body(body).unwrap();
        assert_eq!(payload.get_str("code").as_deref(), Some("P0001"));
        assert_eq!(payload.get_str("orderNo").as_deref(), Some("12345"));
    }

    #[test]
    fn parse_body_falls_back_to_form_encoding() {
        let body = b"code=P0001&message=Approved%20OK";
        let payload = SignablePayload::parse_body(body).unwrap();
        assert_eq!(payload.get_str("code").as_deref(), Some("P0001"));
        assert_eq!(payload.get_str("message").as_deref(), Some("Approved OK"));
    }

    #[test]
    fn parse_body_rejects_garbage() {
        assert!(SignablePayload::parse_body(b"").is_none());
    }

    #[test]
    fn composite_values_render_as_compact_json() {
        let mut payload = SignablePayload::new();
        payload.insert("productInfo", json!(["Widget", "Gadget"]));
        assert_eq!(
            payload.get_str("productInfo").as_deref(),
            Some(r#"["Widget","Gadget"]"#)
        );
    }

    #[test]
    fn form_body_is_key_sorted() {
        let mut payload = SignablePayload::new();
        payload.insert("b", "2");
        payload.insert("a", "1 1");
        assert_eq!(payload.to_form_body(), "a=1+1&b=2");
    }
}
