//! Encoding and decoding of single station records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::RecordError;
use crate::domain::{Station, normalize_name, round_coordinate};

/// Marker placed at the start of every encoded record.
pub const RECORD_SEPARATOR: char = '\u{1e}';

#[derive(Serialize)]
struct FeatureCollectionOut<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    features: [FeatureOut<'a>; 1],
}

#[derive(Serialize)]
struct FeatureOut<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    geometry: PointOut,
    properties: PropertiesOut<'a>,
}

#[derive(Serialize)]
struct PointOut {
    #[serde(rename = "type")]
    kind: &'static str,
    /// `[longitude, latitude]`
    coordinates: [f64; 2],
}

#[derive(Serialize)]
struct PropertiesOut<'a> {
    address: &'a str,
    name: &'a str,
    capacity: String,
    latitude: String,
    longitude: String,
    #[serde(rename = "oldName", skip_serializing_if = "Option::is_none")]
    old_name: Option<&'a str>,
}

#[derive(Deserialize)]
struct FeatureCollectionIn {
    features: Option<Vec<FeatureIn>>,
}

#[derive(Deserialize)]
struct FeatureIn {
    properties: Option<PropertiesIn>,
}

/// Properties are kept as raw JSON values so that string and numeric
/// spellings are both accepted, and so a bad value can be reported by
/// property name.
#[derive(Deserialize)]
struct PropertiesIn {
    address: Option<Value>,
    name: Option<Value>,
    capacity: Option<Value>,
    latitude: Option<Value>,
    longitude: Option<Value>,
    #[serde(rename = "oldName")]
    old_name: Option<Value>,
}

/// Encode a station as a single record line (without the trailing newline).
///
/// The station's coordinates should pass
/// [`valid_coordinates`](crate::domain::valid_coordinates); the snapshot
/// sources drop stations that do not, and [`decode`] rejects such records.
///
/// ```
/// use station_tracker::domain::Station;
/// use station_tracker::record::{decode, encode};
///
/// let station = Station::new("7000", "Fort York  Blvd", 43.639832, -79.395954).with_capacity(35);
/// let line = encode(&station);
/// assert!(line.starts_with('\u{1e}'));
/// assert!(!line.contains('\n'));
///
/// let decoded = decode(&line).unwrap();
/// assert_eq!(decoded.name(), "Fort York Blvd");
/// assert_eq!(decoded.capacity, 35);
/// ```
pub fn encode(station: &Station) -> String {
    encode_with(station, None)
}

/// Encode a renamed station, carrying its previous name as `oldName`.
pub fn encode_renamed(station: &Station, previous_name: &str) -> String {
    let previous_name = normalize_name(previous_name);
    encode_with(station, Some(&previous_name))
}

fn encode_with(station: &Station, old_name: Option<&str>) -> String {
    let latitude = round_coordinate(station.latitude);
    let longitude = round_coordinate(station.longitude);

    let document = FeatureCollectionOut {
        kind: "FeatureCollection",
        features: [FeatureOut {
            kind: "Feature",
            geometry: PointOut {
                kind: "Point",
                coordinates: [longitude, latitude],
            },
            properties: PropertiesOut {
                address: &station.id,
                name: station.name(),
                capacity: station.capacity.to_string(),
                latitude: format_coordinate(latitude),
                longitude: format_coordinate(longitude),
                old_name,
            },
        }],
    };

    // Plain strings and floats; serde_json writes non-finite floats as null
    let json = serde_json::to_string(&document).expect("record envelope is serializable");

    let mut line = String::with_capacity(json.len() + 1);
    line.push(RECORD_SEPARATOR);
    line.push_str(&json);
    line
}

/// Render a rounded coordinate with a `.` decimal point and no exponent.
fn format_coordinate(value: f64) -> String {
    // Adding zero turns -0.0 into 0.0
    format!("{}", value + 0.0)
}

/// Decode one record line into a station.
///
/// A leading record separator is optional. Coordinates are rounded to five
/// decimal places and the name is normalized.
pub fn decode(line: &str) -> Result<Station, RecordError> {
    decode_with_old_name(line).map(|(station, _)| station)
}

/// Decode one record line, also returning its `oldName` property if present.
pub fn decode_with_old_name(line: &str) -> Result<(Station, Option<String>), RecordError> {
    let body = line.trim();
    let body = body.strip_prefix(RECORD_SEPARATOR).unwrap_or(body).trim();
    if body.is_empty() {
        return Err(RecordError::Empty);
    }

    let document: FeatureCollectionIn =
        serde_json::from_str(body).map_err(|e| RecordError::Json {
            message: e.to_string(),
        })?;

    let feature = document
        .features
        .and_then(|features| features.into_iter().next())
        .ok_or(RecordError::NoFeatures)?;
    let properties = feature.properties.ok_or(RecordError::NoProperties)?;

    let id = required_text("address", properties.address)?;
    let name = required_text("name", properties.name)?;
    let latitude = parse_coordinate("latitude", properties.latitude, 90.0)?;
    let longitude = parse_coordinate("longitude", properties.longitude, 180.0)?;

    let capacity = properties
        .capacity
        .and_then(|value| scalar_text(&value))
        .and_then(|text| text.trim().parse::<u32>().ok())
        .unwrap_or(0);

    let old_name = properties
        .old_name
        .and_then(|value| scalar_text(&value))
        .map(|text| normalize_name(&text));

    let station = Station::new(id, &name, latitude, longitude).with_capacity(capacity);
    Ok((station, old_name))
}

/// String or number rendered as text; anything else is `None`.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_text(property: &'static str, value: Option<Value>) -> Result<String, RecordError> {
    match value {
        None | Some(Value::Null) => Err(RecordError::MissingProperty(property)),
        Some(value) => scalar_text(&value).ok_or_else(|| RecordError::InvalidProperty {
            property,
            reason: format!("expected a string, found {value}"),
        }),
    }
}

fn parse_coordinate(
    property: &'static str,
    value: Option<Value>,
    limit: f64,
) -> Result<f64, RecordError> {
    let text = required_text(property, value)?;
    let parsed = text
        .trim()
        .parse::<f64>()
        .map_err(|_| RecordError::InvalidProperty {
            property,
            reason: format!("`{text}` is not a decimal number"),
        })?;

    if !parsed.is_finite() || parsed.abs() > limit {
        return Err(RecordError::InvalidProperty {
            property,
            reason: format!("{text} is outside [-{limit}, {limit}]"),
        });
    }

    Ok(round_coordinate(parsed))
}
