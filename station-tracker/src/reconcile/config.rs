//! Move tolerances for the two kinds of comparison.

/// Default tolerance between consecutive snapshots of the same feed.
const DEFAULT_SAME_FEED_M: f64 = 3.0;

/// Default tolerance between the live feed and community map data.
const DEFAULT_MAP_DATA_M: f64 = 30.0;

/// Distance thresholds (meters) below which a position change is noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Used when comparing a feed against its own earlier snapshot.
    /// Coordinates should barely move between syncs.
    pub same_feed_m: f64,

    /// Used when comparing the feed against hand-mapped data, which is
    /// less precise.
    pub map_data_m: f64,
}

impl Tolerances {
    /// Create tolerances with explicit values.
    pub fn new(same_feed_m: f64, map_data_m: f64) -> Self {
        Self {
            same_feed_m,
            map_data_m,
        }
    }

    /// Override the same-feed tolerance.
    pub fn with_same_feed(mut self, meters: f64) -> Self {
        self.same_feed_m = meters;
        self
    }

    /// Override the map-data tolerance.
    pub fn with_map_data(mut self, meters: f64) -> Self {
        self.map_data_m = meters;
        self
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::new(DEFAULT_SAME_FEED_M, DEFAULT_MAP_DATA_M)
    }
}
