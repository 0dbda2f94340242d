use std::path::{Component, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use station_tracker::domain::ensure_unique_ids;
use station_tracker::history::{GitHistory, HistoryError, reference_snapshot};
use station_tracker::output::{OutputError, OutputWriter, STATIONS_FILE};
use station_tracker::reconcile::{Tolerances, compare};
use station_tracker::sources::{
    BoundingBox, GbfsClient, GbfsClientConfig, OverpassClient, OverpassClientConfig, OverpassQuery,
    SourceError,
};

/// Subdirectory of the output directory for feed-vs-map results.
const MAP_SUBDIR: &str = "map";

/// Track bike-share station changes between syncs and against map data.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// URL of the GBFS station_information.json document
    #[arg(long, env = "STATION_TRACKER_FEED_URL")]
    feed_url: String,

    /// Output directory, relative to --repo
    #[arg(long, env = "STATION_TRACKER_OUTPUT_DIR", value_parser = parse_relative_dir)]
    output_dir: PathBuf,

    /// Git repository holding earlier snapshots
    #[arg(long, env = "STATION_TRACKER_REPO", default_value = ".")]
    repo: PathBuf,

    /// Revision to read the previous snapshot from
    #[arg(long, env = "STATION_TRACKER_REVISION", default_value = "HEAD")]
    revision: String,

    /// Move tolerance between consecutive feed snapshots, in meters
    #[arg(long, env = "STATION_TRACKER_SAME_FEED_TOLERANCE")]
    same_feed_tolerance: Option<f64>,

    /// Move tolerance between the feed and map data, in meters
    #[arg(long, env = "STATION_TRACKER_MAP_TOLERANCE")]
    map_tolerance: Option<f64>,

    /// Compare against map data inside this box: south,west,north,east
    #[arg(long, env = "STATION_TRACKER_BBOX")]
    bbox: Option<String>,

    /// Only match map elements with this network tag
    #[arg(long, env = "STATION_TRACKER_NETWORK")]
    network: Option<String>,

    /// Overpass interpreter endpoint
    #[arg(long, env = "STATION_TRACKER_OVERPASS_ENDPOINT")]
    overpass_endpoint: Option<String>,
}

/// Accept only relative paths, so the written snapshot can be found again
/// in history under the same path.
fn parse_relative_dir(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_absolute() || path.has_root() {
        return Err(format!("`{s}` must be relative to --repo"));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(format!("`{s}` must stay inside --repo"));
    }
    Ok(path)
}

impl Args {
    fn tolerances(&self) -> Tolerances {
        let mut tolerances = Tolerances::default();
        if let Some(meters) = self.same_feed_tolerance {
            tolerances = tolerances.with_same_feed(meters);
        }
        if let Some(meters) = self.map_tolerance {
            tolerances = tolerances.with_map_data(meters);
        }
        tolerances
    }
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "station tracking failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<(), RunError> {
    let tolerances = args.tolerances();

    let feed = GbfsClient::new(GbfsClientConfig::new(&args.feed_url))?;
    let current = feed.fetch_stations().await?;
    if let Err(e) = ensure_unique_ids(&current) {
        warn!(error = %e, "feed repeats station ids; the last occurrence of each is used");
    }

    let history = GitHistory::new(&args.repo);
    let snapshot_path = args.output_dir.join(STATIONS_FILE);
    let reference = reference_snapshot(&history, &args.revision, &snapshot_path)?;

    let comparison = compare(&current, &reference, tolerances.same_feed_m);
    info!(
        changes = comparison.change_count(),
        tolerance_m = tolerances.same_feed_m,
        "compared feed with previous snapshot"
    );

    let writer = OutputWriter::new(args.repo.join(&args.output_dir));
    writer.write_stations(&current)?;
    writer.write_comparison(&comparison)?;

    if let Some(bbox) = &args.bbox {
        let mut query = OverpassQuery::new(BoundingBox::parse(bbox)?);
        if let Some(network) = &args.network {
            query = query.with_network(network);
        }

        let mut config = OverpassClientConfig::default();
        if let Some(endpoint) = &args.overpass_endpoint {
            config = config.with_endpoint(endpoint);
        }

        let mapped = OverpassClient::new(config)?.fetch_stations(&query).await?;
        let map_comparison = compare(&current, &mapped, tolerances.map_data_m);
        info!(
            changes = map_comparison.change_count(),
            tolerance_m = tolerances.map_data_m,
            "compared feed with map data"
        );

        let map_writer = OutputWriter::new(writer.dir().join(MAP_SUBDIR));
        map_writer.write_stations(&mapped)?;
        map_writer.write_comparison(&map_comparison)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dir_must_be_relative() {
        assert_eq!(parse_relative_dir("toronto"), Ok(PathBuf::from("toronto")));
        assert_eq!(
            parse_relative_dir("systems/toronto"),
            Ok(PathBuf::from("systems/toronto"))
        );
        assert!(parse_relative_dir("/srv/stations/toronto").is_err());
        assert!(parse_relative_dir("../elsewhere").is_err());
    }

    #[test]
    fn absolute_output_dir_rejected_by_cli() {
        let result = Args::try_parse_from([
            "station-tracker",
            "--feed-url",
            "https://example.org/station_information.json",
            "--output-dir",
            "/srv/stations/toronto",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_defaults() {
        let args = Args::try_parse_from([
            "station-tracker",
            "--feed-url",
            "https://example.org/station_information.json",
            "--output-dir",
            "toronto",
        ])
        .unwrap();

        assert_eq!(args.repo, PathBuf::from("."));
        assert_eq!(args.revision, "HEAD");
        assert_eq!(args.tolerances(), Tolerances::default());
    }
}
