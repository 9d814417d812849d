//! Wire shapes for payloads and envelopes.
//!
//! Field names here are the wire names. Decoding is plain serde: numbers of
//! any representation land on `f64`, and a wrong JSON type at any field is a
//! [`EnvelopeError::Decode`].

use c5_canonical::{timestamp_from_millis, whole_number, CanonicalValue, ToCanonical};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::EnvelopeError;

/// Envelope format version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Version {
    /// The only version defined so far.
    #[default]
    #[serde(rename = "A")]
    A,
}

impl Version {
    /// Wire text of the version tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::A => "A",
        }
    }
}

/// Largest integer every JSON producer represents exactly (2^53 - 1).
const MAX_SAFE_MILLIS: i64 = 9_007_199_254_740_991;

/// Version written into every new envelope.
pub const CURRENT_VERSION: Version = Version::A;

/// Application payload: a kind tag plus arbitrary data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Application-defined payload type.
    pub kind: String,
    /// Payload content.
    pub data: CanonicalValue,
}

impl Payload {
    /// Creates a payload.
    pub fn new(kind: impl Into<String>, data: impl Into<CanonicalValue>) -> Self {
        Self {
            kind: kind.into(),
            data: data.into(),
        }
    }

    /// Payload whose data is any serializable value.
    pub fn from_serialize<T: Serialize + ?Sized>(
        kind: impl Into<String>,
        data: &T,
    ) -> Result<Self, EnvelopeError> {
        Ok(Self::new(kind, CanonicalValue::from_serialize(data)?))
    }

    /// Decodes a payload from JSON text.
    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decodes a payload from a generic JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Generic JSON form.
    pub fn to_value(&self) -> serde_json::Value {
        self.to_canonical().to_json_value()
    }
}

impl ToCanonical for Payload {
    fn to_canonical(&self) -> CanonicalValue {
        CanonicalValue::record([
            ("data", self.data.clone()),
            ("kind", CanonicalValue::from(self.kind.as_str())),
        ])
    }
}

/// A versioned message container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Format version.
    pub v: Version,
    /// Message identity.
    pub id: String,
    /// Sender, opaque.
    pub src: String,
    /// Destinations, opaque.
    pub dst: Vec<String>,
    /// Creation time in milliseconds since the Unix epoch.
    pub t: f64,
    /// Time to live in seconds.
    pub ttl: f64,
    /// Carried payload.
    pub data: Payload,
}

impl Envelope {
    /// Decodes an envelope from JSON text.
    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decodes an envelope from a generic JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Generic JSON form; integral numbers stay integers.
    pub fn to_value(&self) -> serde_json::Value {
        self.to_canonical().to_json_value()
    }

    /// Creation time as an instant; `t` must be whole epoch millis.
    pub fn sent_at(&self) -> Result<DateTime<Utc>, EnvelopeError> {
        let millis = whole_number("t", self.t, -MAX_SAFE_MILLIS, MAX_SAFE_MILLIS)?;
        Ok(timestamp_from_millis(millis)?)
    }

    /// Time to live in whole seconds.
    pub fn ttl_secs(&self) -> Result<u32, EnvelopeError> {
        let secs = whole_number("ttl", self.ttl, 0, i64::from(u32::MAX))?;
        Ok(secs as u32)
    }
}

impl ToCanonical for Envelope {
    fn to_canonical(&self) -> CanonicalValue {
        CanonicalValue::record([
            ("data", self.data.to_canonical()),
            ("dst", self.dst.to_canonical()),
            ("id", self.id.to_canonical()),
            ("src", self.src.to_canonical()),
            ("t", self.t.to_canonical()),
            ("ttl", self.ttl.to_canonical()),
            ("v", CanonicalValue::from(self.v.as_str())),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c5_canonical::ValidationError;
    use serde_json::json;

    fn wire() -> serde_json::Value {
        json!({
            "v": "A",
            "id": "id",
            "src": "envelope",
            "dst": ["a", "b"],
            "t": 4711,
            "ttl": 10,
            "data": {"kind": "kind", "data": {"y": 4}}
        })
    }

    #[test]
    fn decodes_wire_shape() {
        let envelope = Envelope::from_value(wire()).unwrap();
        assert_eq!(envelope.v, Version::A);
        assert_eq!(envelope.dst, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(envelope.t, 4711.0);
        assert_eq!(envelope.ttl, 10.0);
        assert_eq!(envelope.data.kind, "kind");
        assert_eq!(envelope.data.data.get("y"), Some(&CanonicalValue::Number(4.0)));
    }

    #[test]
    fn numbers_coerce_to_float() {
        let mut value = wire();
        value["t"] = json!(4711.0);
        value["ttl"] = json!(10u8);
        let envelope = Envelope::from_value(value).unwrap();
        assert_eq!(envelope.t, 4711.0);
        assert_eq!(envelope.ttl, 10.0);
    }

    #[test]
    fn wrong_types_fail_to_decode() {
        let mut value = wire();
        value["t"] = json!("4711");
        assert!(matches!(
            Envelope::from_value(value),
            Err(EnvelopeError::Decode(_))
        ));

        let mut value = wire();
        value["dst"] = json!("a");
        assert!(Envelope::from_value(value).is_err());

        let mut value = wire();
        value["v"] = json!("B");
        assert!(Envelope::from_value(value).is_err());
    }

    #[test]
    fn payload_requires_kind_and_data() {
        assert!(Payload::from_json(r#"{"kind":"k"}"#).is_err());
        let payload = Payload::from_json(r#"{"kind":"k","data":[1,"x"]}"#).unwrap();
        assert_eq!(payload, Payload::new("k", json!([1, "x"])));
    }

    #[test]
    fn payload_from_serializable_data() {
        #[derive(Serialize)]
        struct Reading {
            sensor: &'static str,
            celsius: f64,
        }
        let payload = Payload::from_serialize(
            "reading",
            &Reading {
                sensor: "s1",
                celsius: 21.5,
            },
        )
        .unwrap();
        assert_eq!(
            payload.to_value(),
            json!({"kind": "reading", "data": {"celsius": 21.5, "sensor": "s1"}})
        );

        let mut keyed = std::collections::HashMap::new();
        keyed.insert(vec![1u8], "one");
        assert!(matches!(
            Payload::from_serialize("bad", &keyed),
            Err(EnvelopeError::Canonical(_))
        ));
    }

    #[test]
    fn to_value_round_trips() {
        let envelope = Envelope::from_value(wire()).unwrap();
        assert_eq!(Envelope::from_value(envelope.to_value()).unwrap(), envelope);
        assert_eq!(envelope.to_value(), wire());
    }

    #[test]
    fn sent_at_converts_millis() {
        let envelope = Envelope::from_value(wire()).unwrap();
        assert_eq!(envelope.sent_at().unwrap().timestamp_millis(), 4711);
        assert_eq!(envelope.ttl_secs().unwrap(), 10);
    }

    #[test]
    fn fractional_or_negative_numbers_are_rejected() {
        for (field, bad) in [("t", json!(4711.5)), ("ttl", json!(10.5)), ("ttl", json!(-1))] {
            let mut value = wire();
            value[field] = bad;
            let envelope = Envelope::from_value(value).unwrap();
            let err = if field == "t" {
                envelope.sent_at().unwrap_err()
            } else {
                envelope.ttl_secs().map(|_| ()).unwrap_err()
            };
            assert!(matches!(
                err,
                EnvelopeError::Validation(ValidationError::NotWholeInRange { .. })
            ));
        }

        let mut value = wire();
        value["ttl"] = json!(1e12);
        assert!(Envelope::from_value(value).unwrap().ttl_secs().is_err());
    }
}
