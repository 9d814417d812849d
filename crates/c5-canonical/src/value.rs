//! The closed value model the traversal engine walks.
//!
//! Every external shape (records, maps, sequences, JSON documents) is converted
//! into a [`CanonicalValue`] once, at the boundary, through [`ToCanonical`] or
//! [`CanonicalValue::from_serialize`]. The engine itself only pattern-matches
//! this enum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

use crate::canonicalizer::CanonicalError;
use crate::validation::ValidationError;

/// strftime pattern for timestamp leaves: UTC, millisecond precision, `Z` designator.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Largest integer an f64 carries exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A value in canonical form.
///
/// Object members keep the order they were inserted in; the traversal sorts
/// them, and equality between two objects ignores member order.
#[derive(Debug, Clone, Default)]
pub enum CanonicalValue {
    /// JSON `null`, also used for absent values.
    #[default]
    Null,
    /// Boolean leaf.
    Bool(bool),
    /// Numeric leaf with float64 semantics.
    Number(f64),
    /// String leaf.
    String(String),
    /// Absolute instant, rendered with [`TIMESTAMP_FORMAT`].
    Timestamp(DateTime<Utc>),
    /// Ordered sequence.
    Array(Vec<CanonicalValue>),
    /// Named members, in insertion order.
    Object(Vec<(String, CanonicalValue)>),
}

impl CanonicalValue {
    /// Builds an object from `(field name, value)` pairs.
    ///
    /// The names are the resolved wire names, so callers apply any rename here.
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, CanonicalValue)>,
    {
        CanonicalValue::Object(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// Resolves any serde-serializable type, honouring `#[serde(rename)]`.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalError::Serialization`] when the value cannot be
    /// represented as JSON (for example a map with non-string keys).
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, CanonicalError> {
        let json = serde_json::to_value(value)
            .map_err(|e| CanonicalError::Serialization(e.to_string()))?;
        Ok(CanonicalValue::from(&json))
    }

    /// Looks up an object member by name.
    pub fn get(&self, name: &str) -> Option<&CanonicalValue> {
        match self {
            CanonicalValue::Object(members) => members
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Returns the string content of a string leaf.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CanonicalValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts into a `serde_json::Value`.
    ///
    /// Integral numbers become JSON integers; timestamps become their text.
    pub fn to_json_value(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            CanonicalValue::Null => Value::Null,
            CanonicalValue::Bool(b) => Value::Bool(*b),
            CanonicalValue::Number(n) => number_to_json(*n),
            CanonicalValue::String(s) => Value::String(s.clone()),
            CanonicalValue::Timestamp(ts) => Value::String(format_timestamp(ts)),
            CanonicalValue::Array(items) => {
                Value::Array(items.iter().map(CanonicalValue::to_json_value).collect())
            }
            CanonicalValue::Object(members) => Value::Object(
                members
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json_value()))
                    .collect(),
            ),
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

impl PartialEq for CanonicalValue {
    fn eq(&self, other: &Self) -> bool {
        use CanonicalValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Number(a), Number(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Object(a), Object(b)) => a.len() == b.len() && sorted(a) == sorted(b),
            _ => false,
        }
    }
}

fn sorted(members: &[(String, CanonicalValue)]) -> Vec<(&str, &CanonicalValue)> {
    let mut pairs: Vec<_> = members
        .iter()
        .map(|(name, value)| (name.as_str(), value))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
}

/// Renders a number the way JSON producers in browsers do.
///
/// Integral values print without a fraction, `-0` prints as `0`, and very
/// large or very small magnitudes switch to exponent form with an explicit
/// sign. NaN and infinities have no JSON form and print as `null`.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return "null".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let text = format!("{:e}", n);
        return match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => text,
        };
    }
    // Shortest round-trip digits; integral values print without a fraction.
    format!("{}", n)
}

/// Renders a timestamp leaf: `2021-06-19T22:00:00.000Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// `n` as an integer, provided it is whole and within `min..=max`.
///
/// Wire numbers are all `f64`; this is the checked way back to integer
/// fields. `field` names the value in the error.
pub fn whole_number(
    field: &'static str,
    n: f64,
    min: i64,
    max: i64,
) -> Result<i64, ValidationError> {
    if n.is_finite() && n.fract() == 0.0 && n >= min as f64 && n <= max as f64 {
        Ok(n as i64)
    } else {
        Err(ValidationError::NotWholeInRange {
            field,
            value: format_number(n),
        })
    }
}

/// Instant for `millis` since the Unix epoch.
pub fn timestamp_from_millis(millis: i64) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::from_timestamp_millis(millis).ok_or(ValidationError::TimestampOutOfRange { millis })
}

/// JSON string literal for `text`, quoted and escaped.
pub(crate) fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text.escape_default()))
}

impl Serialize for CanonicalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CanonicalValue::Null => serializer.serialize_unit(),
            CanonicalValue::Bool(b) => serializer.serialize_bool(*b),
            CanonicalValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            CanonicalValue::String(s) => serializer.serialize_str(s),
            CanonicalValue::Timestamp(ts) => serializer.serialize_str(&format_timestamp(ts)),
            CanonicalValue::Array(items) => serializer.collect_seq(items),
            CanonicalValue::Object(members) => {
                serializer.collect_map(members.iter().map(|(name, value)| (name, value)))
            }
        }
    }
}

impl<'de> Deserialize<'de> for CanonicalValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Every JSON number, integer or not, lands on f64.
        serde_json::Value::deserialize(deserializer).map(|json| CanonicalValue::from(&json))
    }
}

impl From<&serde_json::Value> for CanonicalValue {
    fn from(json: &serde_json::Value) -> Self {
        use serde_json::Value;
        match json {
            Value::Null => CanonicalValue::Null,
            Value::Bool(b) => CanonicalValue::Bool(*b),
            Value::Number(n) => n
                .as_f64()
                .map(CanonicalValue::Number)
                .unwrap_or(CanonicalValue::Null),
            Value::String(s) => CanonicalValue::String(s.clone()),
            Value::Array(items) => {
                CanonicalValue::Array(items.iter().map(CanonicalValue::from).collect())
            }
            Value::Object(map) => CanonicalValue::Object(
                map.iter()
                    .map(|(name, value)| (name.clone(), CanonicalValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for CanonicalValue {
    fn from(json: serde_json::Value) -> Self {
        CanonicalValue::from(&json)
    }
}

impl From<bool> for CanonicalValue {
    fn from(b: bool) -> Self {
        CanonicalValue::Bool(b)
    }
}

impl From<f64> for CanonicalValue {
    fn from(n: f64) -> Self {
        CanonicalValue::Number(n)
    }
}

impl From<i64> for CanonicalValue {
    fn from(n: i64) -> Self {
        CanonicalValue::Number(n as f64)
    }
}

impl From<&str> for CanonicalValue {
    fn from(s: &str) -> Self {
        CanonicalValue::String(s.to_string())
    }
}

impl From<String> for CanonicalValue {
    fn from(s: String) -> Self {
        CanonicalValue::String(s)
    }
}

impl From<DateTime<Utc>> for CanonicalValue {
    fn from(ts: DateTime<Utc>) -> Self {
        CanonicalValue::Timestamp(ts)
    }
}

impl From<Vec<CanonicalValue>> for CanonicalValue {
    fn from(items: Vec<CanonicalValue>) -> Self {
        CanonicalValue::Array(items)
    }
}

/// Conversion into the canonical value model.
///
/// Implement this for schema types instead of going through serde when the
/// type carries timestamps that must stay distinguished leaves.
pub trait ToCanonical {
    /// Produces the canonical value for `self`.
    fn to_canonical(&self) -> CanonicalValue;
}

macro_rules! numeric_to_canonical {
    ($($t:ty),*) => {
        $(
            impl ToCanonical for $t {
                fn to_canonical(&self) -> CanonicalValue {
                    CanonicalValue::Number(*self as f64)
                }
            }
        )*
    };
}

numeric_to_canonical!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl ToCanonical for bool {
    fn to_canonical(&self) -> CanonicalValue {
        CanonicalValue::Bool(*self)
    }
}

impl ToCanonical for str {
    fn to_canonical(&self) -> CanonicalValue {
        CanonicalValue::String(self.to_string())
    }
}

impl ToCanonical for String {
    fn to_canonical(&self) -> CanonicalValue {
        CanonicalValue::String(self.clone())
    }
}

impl ToCanonical for DateTime<Utc> {
    fn to_canonical(&self) -> CanonicalValue {
        CanonicalValue::Timestamp(*self)
    }
}

impl ToCanonical for CanonicalValue {
    fn to_canonical(&self) -> CanonicalValue {
        self.clone()
    }
}

impl ToCanonical for serde_json::Value {
    fn to_canonical(&self) -> CanonicalValue {
        CanonicalValue::from(self)
    }
}

impl<T: ToCanonical + ?Sized> ToCanonical for &T {
    fn to_canonical(&self) -> CanonicalValue {
        (**self).to_canonical()
    }
}

impl<T: ToCanonical> ToCanonical for Option<T> {
    fn to_canonical(&self) -> CanonicalValue {
        match self {
            Some(value) => value.to_canonical(),
            None => CanonicalValue::Null,
        }
    }
}

impl<T: ToCanonical> ToCanonical for [T] {
    fn to_canonical(&self) -> CanonicalValue {
        CanonicalValue::Array(self.iter().map(ToCanonical::to_canonical).collect())
    }
}

impl<T: ToCanonical> ToCanonical for Vec<T> {
    fn to_canonical(&self) -> CanonicalValue {
        self.as_slice().to_canonical()
    }
}

impl<T: ToCanonical> ToCanonical for BTreeMap<String, T> {
    fn to_canonical(&self) -> CanonicalValue {
        CanonicalValue::Object(
            self.iter()
                .map(|(name, value)| (name.clone(), value.to_canonical()))
                .collect(),
        )
    }
}

impl<T: ToCanonical, S> ToCanonical for HashMap<String, T, S> {
    fn to_canonical(&self) -> CanonicalValue {
        CanonicalValue::Object(
            self.iter()
                .map(|(name, value)| (name.clone(), value.to_canonical()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integral_numbers_have_no_fraction() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-17.0), "-17");
        assert_eq!(format_number(1_624_140_000_000.0), "1624140000000");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2f64.powi(60)), "1152921504606847000");
        assert_eq!(format_number(1.2345678901234568e20), "123456789012345680000");
    }

    #[test]
    fn fractional_and_extreme_numbers() {
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(123.456), "123.456");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(f64::NAN), "null");
        assert_eq!(format_number(f64::INFINITY), "null");
    }

    #[test]
    fn timestamp_has_millis_and_zulu() {
        let ts = DateTime::from_timestamp_millis(1_624_140_000_123).unwrap();
        assert_eq!(format_timestamp(&ts), "2021-06-19T22:00:00.123Z");
        let whole = DateTime::from_timestamp_millis(444).unwrap();
        assert_eq!(format_timestamp(&whole), "1970-01-01T00:00:00.444Z");
    }

    #[test]
    fn whole_numbers_are_checked() {
        assert_eq!(whole_number("ttl", 10.0, 0, 100), Ok(10));
        assert_eq!(whole_number("t", -5.0, -10, 10), Ok(-5));
        assert_eq!(
            whole_number("ttl", 10.5, 0, 100),
            Err(ValidationError::NotWholeInRange {
                field: "ttl",
                value: "10.5".into()
            })
        );
        assert!(whole_number("ttl", -1.0, 0, 100).is_err());
        assert!(whole_number("ttl", 101.0, 0, 100).is_err());
        assert!(whole_number("ttl", f64::NAN, 0, 100).is_err());
    }

    #[test]
    fn millis_outside_chrono_range_are_rejected() {
        assert_eq!(timestamp_from_millis(444).unwrap().timestamp_millis(), 444);
        assert_eq!(
            timestamp_from_millis(i64::MAX),
            Err(ValidationError::TimestampOutOfRange { millis: i64::MAX })
        );
    }

    #[test]
    fn object_equality_ignores_member_order() {
        let a = CanonicalValue::record([("x", 1i64.into()), ("y", "b".into())]);
        let b = CanonicalValue::record([("y", "b".into()), ("x", 1i64.into())]);
        let c = CanonicalValue::record([("y", "c".into()), ("x", 1i64.into())]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn json_numbers_become_floats() {
        let value = CanonicalValue::from(json!({"y": 4, "z": [1.5, -2]}));
        assert_eq!(value.get("y"), Some(&CanonicalValue::Number(4.0)));
        assert_eq!(
            value.get("z"),
            Some(&CanonicalValue::Array(vec![
                CanonicalValue::Number(1.5),
                CanonicalValue::Number(-2.0)
            ]))
        );
    }

    #[test]
    fn serde_field_renames_resolve_names() {
        #[derive(Serialize)]
        struct Sample {
            #[serde(rename = "date")]
            when: String,
            name: String,
        }

        let value = CanonicalValue::from_serialize(&Sample {
            when: "2021-05-20".into(),
            name: "object".into(),
        })
        .unwrap();
        assert_eq!(value.get("date").and_then(CanonicalValue::as_str), Some("2021-05-20"));
        assert!(value.get("when").is_none());
    }

    #[test]
    fn non_string_map_keys_fail_to_resolve() {
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1);
        let err = CanonicalValue::from_serialize(&map).unwrap_err();
        assert!(matches!(err, CanonicalError::Serialization(_)));
    }

    #[test]
    fn serializes_integral_numbers_as_integers() {
        let value = CanonicalValue::record([
            ("n", 4i64.into()),
            ("f", 0.25.into()),
            ("t", DateTime::from_timestamp_millis(0).unwrap().into()),
        ]);
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({"n": 4, "f": 0.25, "t": "1970-01-01T00:00:00.000Z"})
        );
        assert_eq!(value.to_json_value(), serde_json::to_value(&value).unwrap());
    }

    #[test]
    fn collections_convert_through_trait() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), vec![Some(1u32), None]);
        let value = map.to_canonical();
        assert_eq!(
            value,
            CanonicalValue::record([(
                "b",
                CanonicalValue::Array(vec![CanonicalValue::Number(1.0), CanonicalValue::Null])
            )])
        );
    }
}
