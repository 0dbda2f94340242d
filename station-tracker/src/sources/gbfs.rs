//! GBFS `station_information` client.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::error::SourceError;
use crate::domain::{Station, valid_coordinates};

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level GBFS document.
#[derive(Debug, Deserialize)]
struct StationInformationResponse {
    last_updated: Option<Value>,
    data: StationInformationData,
}

#[derive(Debug, Deserialize)]
struct StationInformationData {
    stations: Vec<GbfsStation>,
}

/// One entry of `data.stations`. Only the fields we track.
#[derive(Debug, Deserialize)]
struct GbfsStation {
    station_id: Value,
    name: Option<GbfsName>,
    lat: Option<f64>,
    lon: Option<f64>,
    capacity: Option<Value>,
}

/// GBFS 3 localizes names; earlier versions use a plain string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GbfsName {
    Plain(String),
    Localized(Vec<LocalizedText>),
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

impl GbfsName {
    fn into_text(self) -> Option<String> {
        match self {
            GbfsName::Plain(text) => Some(text),
            GbfsName::Localized(texts) => texts.into_iter().next().map(|t| t.text),
        }
    }
}

/// Configuration for the GBFS client.
#[derive(Debug, Clone)]
pub struct GbfsClientConfig {
    /// Full URL of the `station_information.json` document
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl GbfsClientConfig {
    /// Create a new config for the given feed URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Client for an operator's GBFS station feed.
#[derive(Debug, Clone)]
pub struct GbfsClient {
    http: reqwest::Client,
    url: String,
}

impl GbfsClient {
    /// Create a new GBFS client.
    pub fn new(config: GbfsClientConfig) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: config.url,
        })
    }

    /// Fetch the current station list.
    pub async fn fetch_stations(&self) -> Result<Vec<Station>, SourceError> {
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let stations = parse_station_information(&body)?;
        info!(url = %self.url, count = stations.len(), "fetched GBFS stations");

        Ok(stations)
    }
}

/// Parse a `station_information` document into stations.
///
/// Entries without a name or valid coordinates are skipped. A missing or
/// unparseable capacity becomes 0.
fn parse_station_information(body: &str) -> Result<Vec<Station>, SourceError> {
    let response: StationInformationResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Json {
            message: e.to_string(),
        })?;

    if let Some(last_updated) = &response.last_updated {
        debug!(%last_updated, "GBFS feed timestamp");
    }

    Ok(response
        .data
        .stations
        .into_iter()
        .filter_map(convert_station)
        .collect())
}

fn convert_station(entry: GbfsStation) -> Option<Station> {
    let id = match entry.station_id {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        other => {
            debug!(station_id = %other, "skipping GBFS station with unusable id");
            return None;
        }
    };

    let (Some(name), Some(lat), Some(lon)) =
        (entry.name.and_then(GbfsName::into_text), entry.lat, entry.lon)
    else {
        debug!(%id, "skipping GBFS station without name or coordinates");
        return None;
    };

    if !valid_coordinates(lat, lon) {
        debug!(%id, lat, lon, "skipping GBFS station with out-of-range coordinates");
        return None;
    }

    let capacity = match entry.capacity {
        Some(Value::Number(n)) => n.as_u64().and_then(|c| u32::try_from(c).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .unwrap_or(0);

    Some(Station::new(id, &name, lat, lon).with_capacity(capacity))
}
