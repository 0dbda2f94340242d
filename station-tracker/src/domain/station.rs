//! Bike-share station model.

use std::fmt;

/// Number of decimal places coordinates are rounded to on the wire.
///
/// Five places is roughly 1.1 m at the equator.
pub const COORDINATE_DECIMALS: i32 = 5;

/// Round a coordinate to [`COORDINATE_DECIMALS`] places.
///
/// Rounding is idempotent: rounding an already-rounded value returns it
/// unchanged.
///
/// # Examples
///
/// ```
/// use station_tracker::domain::round_coordinate;
///
/// assert_eq!(round_coordinate(43.6532256), 43.65323);
/// assert_eq!(round_coordinate(round_coordinate(-79.383184)), round_coordinate(-79.383184));
/// ```
pub fn round_coordinate(value: f64) -> f64 {
    let scale = 10f64.powi(COORDINATE_DECIMALS);
    (value * scale).round() / scale
}

/// Whether a latitude/longitude pair is finite and on the globe.
///
/// ```
/// use station_tracker::domain::valid_coordinates;
///
/// assert!(valid_coordinates(43.65, -79.38));
/// assert!(!valid_coordinates(91.0, -79.38));
/// assert!(!valid_coordinates(f64::NAN, 0.0));
/// ```
pub fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && latitude.abs() <= 90.0
        && longitude.abs() <= 180.0
}

/// Collapse every run of whitespace to a single space and trim the ends.
///
/// ```
/// use station_tracker::domain::normalize_name;
///
/// assert_eq!(normalize_name("  Queen St \t W  "), "Queen St W");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Kind of map-data element a station was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Node,
    Way,
    Relation,
}

impl ElementType {
    /// Parse the element type names used by the map-data API.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "node" => Some(ElementType::Node),
            "way" => Some(ElementType::Way),
            "relation" => Some(ElementType::Relation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Node => "node",
            ElementType::Way => "way",
            ElementType::Relation => "relation",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Linkage back to the map-data element a station was built from.
///
/// Only stations that came from the map-data source carry this. It is
/// pass-through metadata: reconciliation never looks at it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLink {
    pub element_type: ElementType,
    pub element_id: i64,
    pub version: Option<u32>,
    /// The element exactly as the API returned it.
    pub raw: serde_json::Value,
}

/// A docking station as seen by one data source at one point in time.
///
/// The name is normalized on every write, so two stations whose names
/// differ only in whitespace compare equal by name.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Stable identity shared across snapshots.
    pub id: String,
    name: String,
    /// Number of docks. Advisory only.
    pub capacity: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub source: Option<SourceLink>,
}

impl Station {
    /// Create a station with zero capacity and no source linkage.
    pub fn new(id: impl Into<String>, name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            name: normalize_name(name),
            capacity: 0,
            latitude,
            longitude,
            source: None,
        }
    }

    /// Set the dock count.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Attach map-data linkage.
    pub fn with_source(mut self, source: SourceLink) -> Self {
        self.source = Some(source);
        self
    }

    /// The normalized name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the name, normalizing it.
    pub fn set_name(&mut self, name: &str) {
        self.name = normalize_name(name);
    }
}
