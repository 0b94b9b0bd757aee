//! Firestore Value encoding
//!
//! Maps tagged native values to the REST wire format's `Value` objects
//! (<https://firebase.google.com/docs/firestore/reference/rest/v1/Value>).
//!
//! Values are a closed tagged union: exactly one variant is populated, and
//! the dynamic boundary constructor [`Value::from_tagged`] validates the
//! supplied payload against the declared tag before admitting it.

use crate::error::FirestoreError;
use base64::Engine as _;
use chrono::Utc;
use serde_json::json;

/// Maximum read staleness, in seconds, accepted by the backend for
/// timestamp-relative snapshot reads.
pub const MAX_READ_STALENESS_SECS: i64 = 269;

/// Current UTC time minus `staleness` seconds, in Zulu format with second
/// precision (`YYYY-MM-DDTHH:MM:SSZ`).
pub(crate) fn utc_timestamp(staleness: i64) -> Result<String, FirestoreError> {
    if !(0..=MAX_READ_STALENESS_SECS).contains(&staleness) {
        return Err(FirestoreError::OutOfRange(format!(
            "time staleness {} not within limits 0 <= value <= {}",
            staleness, MAX_READ_STALENESS_SECS
        )));
    }
    let time = Utc::now() - chrono::Duration::seconds(staleness);
    Ok(time.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

/// The eleven value tags accepted at the dynamic construction boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `null`: the null value
    Null,
    /// `bool`: boolean
    Bool,
    /// `int`: 64-bit integer
    Int,
    /// `double`: 64-bit float
    Double,
    /// `time`: UTC timestamp (preformatted string or staleness offset)
    Time,
    /// `string`: UTF-8 string
    String,
    /// `bytes`: base64-encoded byte string
    Bytes,
    /// `ref`: document reference path
    Ref,
    /// `geo`: latitude/longitude pair
    Geo,
    /// `array`: single-child array wrapper
    Array,
    /// `map`: single-entry map wrapper
    Map,
}

impl ValueKind {
    /// All known kinds, in wire documentation order
    pub const ALL: [ValueKind; 11] = [
        ValueKind::Null,
        ValueKind::Bool,
        ValueKind::Int,
        ValueKind::Double,
        ValueKind::Time,
        ValueKind::String,
        ValueKind::Bytes,
        ValueKind::Ref,
        ValueKind::Geo,
        ValueKind::Array,
        ValueKind::Map,
    ];

    /// The tag string this kind is constructed from
    pub fn tag(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Double => "double",
            ValueKind::Time => "time",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Ref => "ref",
            ValueKind::Geo => "geo",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
        }
    }
}

impl std::str::FromStr for ValueKind {
    type Err = FirestoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueKind::ALL
            .iter()
            .find(|kind| kind.tag() == s)
            .copied()
            .ok_or_else(|| FirestoreError::UnknownValueKind(s.to_string()))
    }
}

/// A Firestore value
///
/// Closed tagged union over the wire format's value variants. `Array` and
/// `Map` deliberately carry exactly one child value, matching the constrained
/// model this client implements; they are wrappers, not general containers.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Double value
    Double(f64),
    /// Timestamp value, Zulu-formatted string
    Timestamp(String),
    /// String value
    String(String),
    /// Bytes value, base64 string
    Bytes(String),
    /// Document reference path
    Reference(String),
    /// Geographic point (WGS84 degrees)
    GeoPoint {
        /// Latitude in degrees
        latitude: f64,
        /// Longitude in degrees
        longitude: f64,
    },
    /// Array wrapping a single child value
    Array(Box<Value>),
    /// Map with a single key and child value
    Map {
        /// Entry key
        key: String,
        /// Entry value
        value: Box<Value>,
    },
}

impl Value {
    /// The kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Int,
            Value::Double(_) => ValueKind::Double,
            Value::Timestamp(_) => ValueKind::Time,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Reference(_) => ValueKind::Ref,
            Value::GeoPoint { .. } => ValueKind::Geo,
            Value::Array(_) => ValueKind::Array,
            Value::Map { .. } => ValueKind::Map,
        }
    }

    /// True if this is a NaN double
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Double(d) if d.is_nan())
    }

    /// Timestamp value for "now minus `staleness` seconds"
    ///
    /// `staleness` must be within `[0, 269]`, the maximum staleness the
    /// backend accepts for snapshot reads.
    pub fn timestamp_staleness(staleness: i64) -> Result<Self, FirestoreError> {
        Ok(Value::Timestamp(utc_timestamp(staleness)?))
    }

    /// Bytes value from raw bytes, base64-encoded
    pub fn bytes_from_raw(bytes: &[u8]) -> Self {
        Value::Bytes(base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    /// Construct a value from a tag string and a dynamic JSON payload
    ///
    /// The boundary for string-keyed construction: the tag must name one of
    /// the eleven known kinds and the payload's JSON type must match it
    /// exactly. Notably:
    ///
    /// - `"int"` requires a JSON integer (booleans and floats are rejected),
    /// - `"double"` requires an actual float (`18` is rejected, `18.0` is not),
    /// - `"time"` accepts a preformatted Zulu string, or an integer N meaning
    ///   "current UTC time minus N seconds" with `0 <= N <= 269`,
    /// - `"geo"` requires a two-element array of floats; latitude/longitude
    ///   bounds are not range-checked beyond the float type,
    /// - `"array"` requires an object with exactly the slots `key` (a nested
    ///   tag) and `value` (its payload),
    /// - `"map"` requires an object with exactly the slots `key` (the entry
    ///   name) and `value` (an object shaped like an `array` payload).
    ///
    /// # Example
    /// ```
    /// use firebase_rest_client::firestore::Value;
    /// use serde_json::json;
    ///
    /// let v = Value::from_tagged("int", &json!(23)).unwrap();
    /// assert_eq!(v, Value::Integer(23));
    /// ```
    pub fn from_tagged(tag: &str, payload: &serde_json::Value) -> Result<Self, FirestoreError> {
        let kind: ValueKind = tag.parse()?;
        match kind {
            ValueKind::Null => {
                if payload.is_null() {
                    Ok(Value::Null)
                } else {
                    Err(mismatch(kind, "null", payload))
                }
            }
            ValueKind::Bool => match payload.as_bool() {
                Some(b) => Ok(Value::Boolean(b)),
                None => Err(mismatch(kind, "bool", payload)),
            },
            ValueKind::Int => match payload.as_i64() {
                Some(i) => Ok(Value::Integer(i)),
                None => Err(mismatch(kind, "int", payload)),
            },
            ValueKind::Double => {
                // as_f64 would silently widen integers; require a real float
                if payload.is_f64() {
                    Ok(Value::Double(payload.as_f64().unwrap_or_default()))
                } else {
                    Err(mismatch(kind, "float", payload))
                }
            }
            ValueKind::Time => {
                if let Some(s) = payload.as_str() {
                    Ok(Value::Timestamp(s.to_string()))
                } else if let Some(n) = payload.as_i64() {
                    Value::timestamp_staleness(n)
                } else {
                    Err(mismatch(kind, "str or int", payload))
                }
            }
            ValueKind::String => match payload.as_str() {
                Some(s) => Ok(Value::String(s.to_string())),
                None => Err(mismatch(kind, "str", payload)),
            },
            ValueKind::Bytes => match payload.as_str() {
                Some(s) => Ok(Value::Bytes(s.to_string())),
                None => Err(mismatch(kind, "str", payload)),
            },
            ValueKind::Ref => match payload.as_str() {
                Some(s) => Ok(Value::Reference(s.to_string())),
                None => Err(mismatch(kind, "str", payload)),
            },
            ValueKind::Geo => {
                let Some(pair) = payload.as_array() else {
                    return Err(mismatch(kind, "pair of floats", payload));
                };
                if pair.len() != 2 {
                    return Err(FirestoreError::MalformedComposite(
                        "value for tag geo can only contain 2 elements of type float \
                         corresponding to latitude and longitude"
                            .to_string(),
                    ));
                }
                // Integer coordinates are rejected, mirroring the strict tagging
                if !pair[0].is_f64() || !pair[1].is_f64() {
                    return Err(mismatch(kind, "pair of floats", payload));
                }
                Ok(Value::GeoPoint {
                    latitude: pair[0].as_f64().unwrap_or_default(),
                    longitude: pair[1].as_f64().unwrap_or_default(),
                })
            }
            ValueKind::Array => {
                let (child_tag, child_payload) = composite_slots(payload, "array")?;
                Ok(Value::Array(Box::new(Value::from_tagged(
                    child_tag,
                    child_payload,
                )?)))
            }
            ValueKind::Map => {
                let (entry_key, entry_value) = map_slots(payload)?;
                let (child_tag, child_payload) = composite_slots(entry_value, "map")?;
                Ok(Value::Map {
                    key: entry_key.to_string(),
                    value: Box::new(Value::from_tagged(child_tag, child_payload)?),
                })
            }
        }
    }

    /// Encode this value as a wire-format JSON object
    ///
    /// Output uses the singular wire key for the populated variant (e.g.
    /// `{"integerValue": 7}`) and is ready for direct serialization.
    pub fn to_wire(&self) -> serde_json::Value {
        match self {
            Value::Null => json!({"nullValue": "NULL_VALUE"}),
            Value::Boolean(b) => json!({"booleanValue": b}),
            Value::Integer(i) => json!({"integerValue": i}),
            Value::Double(d) => json!({"doubleValue": d}),
            Value::Timestamp(t) => json!({"timestampValue": t}),
            Value::String(s) => json!({"stringValue": s}),
            Value::Bytes(b) => json!({"bytesValue": b}),
            Value::Reference(r) => json!({"referenceValue": r}),
            Value::GeoPoint {
                latitude,
                longitude,
            } => json!({"geoPointValue": {"latitude": latitude, "longitude": longitude}}),
            Value::Array(child) => json!({"arrayValue": {"values": [child.to_wire()]}}),
            Value::Map { key, value } => {
                json!({"mapValue": {"fields": {key.clone(): value.to_wire()}}})
            }
        }
    }
}

fn mismatch(kind: ValueKind, expected: &str, payload: &serde_json::Value) -> FirestoreError {
    FirestoreError::TypeMismatch(format!(
        "tag {:?} requires a value of type {}, got {}",
        kind.tag(),
        expected,
        json_type_name(payload)
    ))
}

fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "str",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Validate a composite payload: an object with exactly the slots `key`
/// (holding a nested tag string) and `value` (holding its payload).
fn composite_slots<'a>(
    payload: &'a serde_json::Value,
    tag: &str,
) -> Result<(&'a str, &'a serde_json::Value), FirestoreError> {
    let (key_slot, value_slot) = two_slots(payload, tag)?;
    let Some(child_tag) = key_slot.as_str() else {
        return Err(FirestoreError::TypeMismatch(format!(
            "'key' slot of a {} value must hold a tag string",
            tag
        )));
    };
    Ok((child_tag, value_slot))
}

/// Validate a map payload's outer object: `key` holds the entry name,
/// `value` holds the tagged child.
fn map_slots(payload: &serde_json::Value) -> Result<(&str, &serde_json::Value), FirestoreError> {
    let (key_slot, value_slot) = two_slots(payload, "map")?;
    let Some(entry_key) = key_slot.as_str() else {
        return Err(FirestoreError::TypeMismatch(
            "'key' slot of a map value must hold the entry name as a string".to_string(),
        ));
    };
    Ok((entry_key, value_slot))
}

fn two_slots<'a>(
    payload: &'a serde_json::Value,
    tag: &str,
) -> Result<(&'a serde_json::Value, &'a serde_json::Value), FirestoreError> {
    let Some(obj) = payload.as_object() else {
        return Err(FirestoreError::TypeMismatch(format!(
            "tag {:?} requires a value of type object, got {}",
            tag,
            json_type_name(payload)
        )));
    };
    if obj.len() != 2 || !obj.contains_key("key") || !obj.contains_key("value") {
        return Err(FirestoreError::MalformedComposite(format!(
            "value for tag {} can only contain 2 elements with the slot names 'key' and 'value'",
            tag
        )));
    }
    Ok((&obj["key"], &obj["value"]))
}
