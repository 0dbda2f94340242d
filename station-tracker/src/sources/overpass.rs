//! Overpass API client for community-mapped bike-share stations.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::error::SourceError;
use crate::domain::{ElementType, SourceLink, Station, valid_coordinates};

/// Default public Overpass endpoint.
const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Default request timeout. Overpass queries can be slow.
const DEFAULT_TIMEOUT_SECS: u64 = 90;

/// Server-side query timeout written into the query itself.
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 60;

/// Geographic bounds for a query, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Create a bounding box. South must be below north and west left of east.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self, SourceError> {
        let in_range = south.abs() <= 90.0
            && north.abs() <= 90.0
            && west.abs() <= 180.0
            && east.abs() <= 180.0;
        if !in_range || south >= north || west >= east {
            return Err(SourceError::Config {
                message: format!("invalid bounding box ({south},{west},{north},{east})"),
            });
        }
        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }

    /// Parse `south,west,north,east`.
    pub fn parse(s: &str) -> Result<Self, SourceError> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| SourceError::Config {
                message: format!("bounding box `{s}` is not four numbers"),
            })?;

        match parts.as_slice() {
            [south, west, north, east] => Self::new(*south, *west, *north, *east),
            _ => Err(SourceError::Config {
                message: format!("bounding box `{s}` must be south,west,north,east"),
            }),
        }
    }
}

/// An Overpass QL query for bike-share docking stations.
#[derive(Debug, Clone)]
pub struct OverpassQuery {
    pub bbox: BoundingBox,
    /// Restrict to one `network=*` value, for areas with several systems.
    pub network: Option<String>,
    pub timeout_secs: u64,
}

impl OverpassQuery {
    /// Query every `amenity=bicycle_rental` element inside `bbox`.
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            network: None,
            timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }

    /// Only match elements tagged with this network.
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    /// Render the query as Overpass QL.
    ///
    /// ```
    /// use station_tracker::sources::{BoundingBox, OverpassQuery};
    ///
    /// let bbox = BoundingBox::new(43.58, -79.64, 43.86, -79.11).unwrap();
    /// let ql = OverpassQuery::new(bbox).with_network("Bike Share Toronto").to_ql();
    /// assert!(ql.contains(r#"["network"="Bike Share Toronto"]"#));
    /// assert!(ql.ends_with("out center meta;"));
    /// ```
    pub fn to_ql(&self) -> String {
        let BoundingBox {
            south,
            west,
            north,
            east,
        } = self.bbox;

        let mut ql = format!("[out:json][timeout:{}];\n", self.timeout_secs);
        ql.push_str(r#"nwr["amenity"="bicycle_rental"]"#);
        if let Some(network) = &self.network {
            ql.push_str(&format!(r#"["network"="{}"]"#, escape_ql(network)));
        }
        ql.push_str(&format!("({south},{west},{north},{east});\nout center meta;"));
        ql
    }
}

/// Escape a value for use inside a double-quoted Overpass QL string.
fn escape_ql(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Configuration for the Overpass client.
#[derive(Debug, Clone)]
pub struct OverpassClientConfig {
    /// Interpreter endpoint URL
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OverpassClientConfig {
    /// Create a config pointing at the public endpoint.
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom endpoint (for testing or a private instance).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Default for OverpassClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for an Overpass API instance.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<Center>,
    version: Option<u32>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Center {
    lat: f64,
    lon: f64,
}

impl OverpassClient {
    /// Create a new Overpass client.
    pub fn new(config: OverpassClientConfig) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint,
        })
    }

    /// Run `query` and convert matching elements to stations.
    pub async fn fetch_stations(&self, query: &OverpassQuery) -> Result<Vec<Station>, SourceError> {
        let ql = query.to_ql();
        debug!(%ql, "running Overpass query");

        let response = self
            .http
            .post(&self.endpoint)
            .form(&[("data", ql.as_str())])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let stations = parse_elements(&body)?;
        info!(endpoint = %self.endpoint, count = stations.len(), "fetched map stations");

        Ok(stations)
    }
}

/// Parse an Overpass JSON response.
///
/// Elements need a `ref` tag (the feed's station id), a `name` tag, and a
/// valid position (directly, or a `center` for ways and relations); the
/// rest are skipped.
fn parse_elements(body: &str) -> Result<Vec<Station>, SourceError> {
    let response: OverpassResponse = serde_json::from_str(body).map_err(|e| SourceError::Json {
        message: e.to_string(),
    })?;

    let mut stations = Vec::with_capacity(response.elements.len());
    for raw in response.elements {
        let element: OverpassElement =
            serde_json::from_value(raw.clone()).map_err(|e| SourceError::Json {
                message: e.to_string(),
            })?;
        if let Some(station) = convert_element(element, raw) {
            stations.push(station);
        }
    }
    Ok(stations)
}

fn convert_element(element: OverpassElement, raw: Value) -> Option<Station> {
    let Some(element_type) = ElementType::parse(&element.kind) else {
        debug!(kind = %element.kind, id = element.id, "skipping unknown element type");
        return None;
    };

    let position = match (element.lat, element.lon, &element.center) {
        (Some(lat), Some(lon), _) => Some((lat, lon)),
        (_, _, Some(center)) => Some((center.lat, center.lon)),
        _ => None,
    };

    let (Some(id), Some(name), Some((lat, lon))) = (
        element.tags.get("ref"),
        element.tags.get("name"),
        position,
    ) else {
        debug!(%element_type, id = element.id, "skipping element without ref, name or position");
        return None;
    };

    if !valid_coordinates(lat, lon) {
        debug!(%element_type, id = element.id, lat, lon, "skipping element with out-of-range coordinates");
        return None;
    }

    let capacity = element
        .tags
        .get("capacity")
        .and_then(|c| c.trim().parse().ok())
        .unwrap_or(0);

    let link = SourceLink {
        element_type,
        element_id: element.id,
        version: element.version,
        raw,
    };

    Some(
        Station::new(id.clone(), name, lat, lon)
            .with_capacity(capacity)
            .with_source(link),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "version": 0.6,
        "elements": [
            {
                "type": "node",
                "id": 2107389547,
                "lat": 43.6398,
                "lon": -79.3959,
                "version": 7,
                "tags": {
                    "amenity": "bicycle_rental",
                    "capacity": "35",
                    "name": "Fort York Blvd / Capreol Ct",
                    "network": "Bike Share Toronto",
                    "ref": "7000"
                }
            },
            {
                "type": "way",
                "id": 4410021,
                "center": { "lat": 43.66496, "lon": -79.38355 },
                "version": 2,
                "tags": { "amenity": "bicycle_rental", "name": "Wellesley", "ref": "7001" }
            },
            {
                "type": "node",
                "id": 99,
                "lat": 43.7,
                "lon": -79.4,
                "tags": { "amenity": "bicycle_rental", "name": "No Ref" }
            },
            {
                "type": "node",
                "id": 100,
                "lat": 43.7,
                "lon": -79.4
            }
        ]
    }"#;

    fn bbox() -> BoundingBox {
        BoundingBox::new(43.58, -79.64, 43.86, -79.11).unwrap()
    }

    #[test]
    fn query_without_network() {
        let ql = OverpassQuery::new(bbox()).to_ql();
        assert_eq!(
            ql,
            "[out:json][timeout:60];\n\
             nwr[\"amenity\"=\"bicycle_rental\"](43.58,-79.64,43.86,-79.11);\n\
             out center meta;"
        );
    }

    #[test]
    fn network_is_escaped() {
        let ql = OverpassQuery::new(bbox()).with_network(r#"Say "Hi""#).to_ql();
        assert!(ql.contains(r#"["network"="Say \"Hi\""]"#));
    }

    #[test]
    fn bounding_box_validation() {
        assert!(BoundingBox::new(43.86, -79.64, 43.58, -79.11).is_err());
        assert!(BoundingBox::new(43.58, -79.11, 43.86, -79.64).is_err());
        assert!(BoundingBox::new(-91.0, -79.64, 43.86, -79.11).is_err());
    }

    #[test]
    fn bounding_box_parse() {
        assert_eq!(BoundingBox::parse("43.58, -79.64, 43.86, -79.11").unwrap(), bbox());
        assert!(BoundingBox::parse("43.58,-79.64,43.86").is_err());
        assert!(BoundingBox::parse("a,b,c,d").is_err());
    }

    #[test]
    fn config_defaults() {
        let config = OverpassClientConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.timeout_secs, 90);

        let config = config.with_endpoint("http://localhost:12345/api/interpreter");
        assert_eq!(config.endpoint, "http://localhost:12345/api/interpreter");
    }

    #[test]
    fn parses_nodes_and_way_centers() {
        let stations = parse_elements(RESPONSE).unwrap();
        assert_eq!(stations.len(), 2);

        assert_eq!(stations[0].id, "7000");
        assert_eq!(stations[0].capacity, 35);
        assert_eq!(stations[1].id, "7001");
        assert_eq!(stations[1].latitude, 43.66496);
        assert_eq!(stations[1].capacity, 0);
    }

    #[test]
    fn skips_elements_off_the_globe() {
        let response = r#"{"elements":[
            {"type":"node","id":1,"lat":-95.0,"lon":-79.4,"tags":{"ref":"1","name":"South"}},
            {"type":"way","id":2,"center":{"lat":43.0,"lon":181.0},"tags":{"ref":"2","name":"East"}},
            {"type":"node","id":3,"lat":43.7,"lon":-79.4,"tags":{"ref":"3","name":"Fine"}}
        ]}"#;
        let stations = parse_elements(response).unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].id, "3");
    }

    #[test]
    fn stations_carry_source_link() {
        let stations = parse_elements(RESPONSE).unwrap();

        let link = stations[0].source.as_ref().unwrap();
        assert_eq!(link.element_type, ElementType::Node);
        assert_eq!(link.element_id, 2107389547);
        assert_eq!(link.version, Some(7));
        assert_eq!(link.raw["tags"]["network"], "Bike Share Toronto");

        let link = stations[1].source.as_ref().unwrap();
        assert_eq!(link.element_type, ElementType::Way);
    }

    #[test]
    fn malformed_response_is_json_error() {
        assert!(matches!(
            parse_elements("<html>busy</html>"),
            Err(SourceError::Json { .. })
        ));
    }
}
