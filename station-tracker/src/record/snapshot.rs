//! Whole snapshot files: one record per line.

use super::codec::{decode, decode_with_old_name, encode, encode_renamed};
use super::error::SnapshotError;
use crate::domain::Station;

/// Parse a snapshot file. Blank lines are skipped.
pub fn read_snapshot(text: &str) -> Result<Vec<Station>, SnapshotError> {
    records(text)
        .map(|(line, record)| decode(record).map_err(|source| SnapshotError::Record { line, source }))
        .collect()
}

/// Parse a renamed-set file into stations paired with their previous names.
pub fn read_renamed(text: &str) -> Result<Vec<(Station, Option<String>)>, SnapshotError> {
    records(text)
        .map(|(line, record)| {
            decode_with_old_name(record).map_err(|source| SnapshotError::Record { line, source })
        })
        .collect()
}

/// Non-blank lines with their 1-based line numbers.
fn records(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, line))
}

/// Serialize stations as a snapshot file, sorted by id.
///
/// Every record, including the last, is terminated by `\n`.
pub fn write_snapshot<'a>(stations: impl IntoIterator<Item = &'a Station>) -> String {
    let mut sorted: Vec<&Station> = stations.into_iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut out = String::new();
    for station in sorted {
        out.push_str(&encode(station));
        out.push('\n');
    }
    out
}

/// Serialize `(current, previous_name)` pairs as a renamed-set file, sorted
/// by id.
pub fn write_renamed<'a>(pairs: impl IntoIterator<Item = (&'a Station, &'a str)>) -> String {
    let mut sorted: Vec<(&Station, &str)> = pairs.into_iter().collect();
    sorted.sort_by(|a, b| a.0.id.cmp(&b.0.id));

    let mut out = String::new();
    for (station, previous_name) in sorted {
        out.push_str(&encode_renamed(station, previous_name));
        out.push('\n');
    }
    out
}
