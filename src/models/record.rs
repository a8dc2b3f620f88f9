// src/models/record.rs

//! Dataset records before and after normalization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::GeoPoint;

/// A dataset row exactly as the upstream API returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Field value, treating JSON `null` as absent.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Why a raw record was excluded from the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedRecord {
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("geolocation is not a pair of numbers: {0}")]
    InvalidGeolocation(String),

    #[error("coordinates out of range: ({latitude}, {longitude})")]
    OutOfRange { latitude: f64, longitude: f64 },

    #[error("year is not usable as an ordering key: {0}")]
    InvalidYear(String),
}

/// A validated record ready for enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub name: String,
    pub location: GeoPoint,
    pub year: i32,
    /// The geolocation value as received, rendered as compact JSON
    pub raw_location: String,
}

impl NormalizedRecord {
    pub fn latitude(&self) -> f64 {
        self.location.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.location.longitude
    }
}

impl TryFrom<&RawRecord> for NormalizedRecord {
    type Error = MalformedRecord;

    fn try_from(raw: &RawRecord) -> Result<Self, Self::Error> {
        let name = raw
            .field("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(MalformedRecord::MissingField("name"))?;

        let geolocation = raw
            .field("geolocation")
            .ok_or(MalformedRecord::MissingField("geolocation"))?;

        let year_value = raw
            .field("year")
            .ok_or(MalformedRecord::MissingField("year"))?;

        let location = parse_geolocation(geolocation)?;
        let year = parse_year(year_value)?;

        Ok(Self {
            name: name.to_string(),
            location,
            year,
            raw_location: geolocation.to_string(),
        })
    }
}

fn parse_geolocation(value: &Value) -> Result<GeoPoint, MalformedRecord> {
    let invalid = || MalformedRecord::InvalidGeolocation(value.to_string());

    let object = value.as_object().ok_or_else(invalid)?;
    let latitude = object.get("latitude").and_then(coordinate).ok_or_else(invalid)?;
    let longitude = object
        .get("longitude")
        .and_then(coordinate)
        .ok_or_else(invalid)?;

    GeoPoint::checked(latitude, longitude).ok_or(MalformedRecord::OutOfRange {
        latitude,
        longitude,
    })
}

/// Coordinates arrive as JSON strings from Socrata, but plain numbers are accepted too.
fn coordinate(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Accepts a bare year (`2001`, `"2001"`) or a floating timestamp (`"2001-01-01T00:00:00.000"`).
fn parse_year(value: &Value) -> Result<i32, MalformedRecord> {
    let invalid = || MalformedRecord::InvalidYear(value.to_string());

    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|y| i32::try_from(y).ok())
            .ok_or_else(invalid),
        Value::String(s) => {
            let s = s.trim();
            let end = s
                .char_indices()
                .find(|&(_, c)| !c.is_ascii_digit())
                .map_or(s.len(), |(i, _)| i);
            s[..end].parse::<i32>().map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalizes_socrata_row() {
        let record = raw(json!({
            "name": "Aachen",
            "id": "1",
            "year": "1880-01-01T00:00:00.000",
            "geolocation": { "latitude": "50.775", "longitude": "6.08333" }
        }));

        let normalized = NormalizedRecord::try_from(&record).unwrap();
        assert_eq!(normalized.name, "Aachen");
        assert_eq!(normalized.year, 1880);
        assert_eq!(normalized.latitude(), 50.775);
        assert_eq!(normalized.longitude(), 6.08333);
        assert_eq!(
            normalized.raw_location,
            r#"{"latitude":"50.775","longitude":"6.08333"}"#
        );
    }

    #[test]
    fn test_raw_location_keeps_upstream_key_order() {
        let record: RawRecord = serde_json::from_str(
            r#"{"name":"Aachen","year":"1880","geolocation":{"longitude":"6.08333","latitude":"50.775"}}"#,
        )
        .unwrap();

        let normalized = NormalizedRecord::try_from(&record).unwrap();
        assert_eq!(
            normalized.raw_location,
            r#"{"longitude":"6.08333","latitude":"50.775"}"#
        );
        assert_eq!(normalized.location, GeoPoint::new(50.775, 6.08333));
    }

    #[test]
    fn test_accepts_numeric_fields() {
        let record = raw(json!({
            "name": "Numeric",
            "year": 2001,
            "geolocation": { "latitude": -12.5, "longitude": 130 }
        }));

        let normalized = NormalizedRecord::try_from(&record).unwrap();
        assert_eq!(normalized.year, 2001);
        assert_eq!(normalized.location, GeoPoint::new(-12.5, 130.0));
    }

    #[test]
    fn test_missing_fields() {
        let no_name = raw(json!({ "year": "2001", "geolocation": { "latitude": "1", "longitude": "2" } }));
        let no_geo = raw(json!({ "name": "A", "year": "2001" }));
        let no_year = raw(json!({ "name": "A", "geolocation": { "latitude": "1", "longitude": "2" } }));
        let null_geo = raw(json!({ "name": "A", "year": "2001", "geolocation": null }));

        assert_eq!(
            NormalizedRecord::try_from(&no_name),
            Err(MalformedRecord::MissingField("name"))
        );
        assert_eq!(
            NormalizedRecord::try_from(&no_geo),
            Err(MalformedRecord::MissingField("geolocation"))
        );
        assert_eq!(
            NormalizedRecord::try_from(&no_year),
            Err(MalformedRecord::MissingField("year"))
        );
        assert_eq!(
            NormalizedRecord::try_from(&null_geo),
            Err(MalformedRecord::MissingField("geolocation"))
        );
    }

    #[test]
    fn test_unparseable_geolocation() {
        let record = raw(json!({ "name": "A", "year": "2001", "geolocation": { "latitude": "abc" } }));
        assert!(matches!(
            NormalizedRecord::try_from(&record),
            Err(MalformedRecord::InvalidGeolocation(_))
        ));

        let record = raw(json!({ "name": "A", "year": "2001", "geolocation": { "latitude": "NaN", "longitude": "0" } }));
        assert!(matches!(
            NormalizedRecord::try_from(&record),
            Err(MalformedRecord::InvalidGeolocation(_))
        ));
    }

    #[test]
    fn test_out_of_range_geolocation() {
        let record = raw(json!({ "name": "A", "year": "2001", "geolocation": { "latitude": "91", "longitude": "0" } }));
        assert!(matches!(
            NormalizedRecord::try_from(&record),
            Err(MalformedRecord::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_invalid_year() {
        let record = raw(json!({ "name": "A", "year": "unknown", "geolocation": { "latitude": "1", "longitude": "2" } }));
        assert!(matches!(
            NormalizedRecord::try_from(&record),
            Err(MalformedRecord::InvalidYear(_))
        ));
    }
}
