//! Snapshot and change-set files on disk.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::Station;
use crate::reconcile::Comparison;
use crate::record::{write_renamed, write_snapshot};

/// Full current snapshot.
pub const STATIONS_FILE: &str = "stations.geojson";
/// Stations that appeared.
pub const ADDED_FILE: &str = "added.geojson";
/// Stations that disappeared.
pub const REMOVED_FILE: &str = "removed.geojson";
/// Stations that changed position.
pub const MOVED_FILE: &str = "moved.geojson";
/// Stations that changed name, with `oldName`.
pub const RENAMED_FILE: &str = "renamed.geojson";

/// Errors writing output files.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Writes one comparison's files into a directory.
///
/// Records in every file are sorted by station id, so re-running with the
/// same inputs produces byte-identical files.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    /// Write into `dir`, creating it on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of one of the output files.
    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Write the full current snapshot.
    pub fn write_stations(&self, stations: &[Station]) -> Result<(), OutputError> {
        self.write_all(&[(STATIONS_FILE, write_snapshot(stations))])
    }

    /// Write the four change-set files.
    ///
    /// All four are staged first; if staging fails the existing files are
    /// left untouched.
    pub fn write_comparison(&self, comparison: &Comparison) -> Result<(), OutputError> {
        self.write_all(&[
            (ADDED_FILE, write_snapshot(&comparison.added)),
            (REMOVED_FILE, write_snapshot(&comparison.removed)),
            (MOVED_FILE, write_snapshot(&comparison.moved)),
            (RENAMED_FILE, write_renamed(comparison.renamed_pairs())),
        ])?;

        info!(
            dir = %self.dir.display(),
            added = comparison.added.len(),
            removed = comparison.removed.len(),
            moved = comparison.moved.len(),
            renamed = comparison.renamed.len(),
            "wrote change sets"
        );
        Ok(())
    }

    /// Hidden sibling a file is staged under before being renamed into place.
    fn staging_path(&self, file: &str) -> PathBuf {
        self.dir.join(format!(".{file}.tmp"))
    }

    fn write_all(&self, files: &[(&str, String)]) -> Result<(), OutputError> {
        if !self.dir.as_os_str().is_empty() && !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(|source| OutputError::Io {
                path: self.dir.clone(),
                source,
            })?;
        }

        for (i, (file, contents)) in files.iter().enumerate() {
            let staged = self.staging_path(file);
            if let Err(source) = std::fs::write(&staged, contents) {
                // Best-effort cleanup; the write error is what gets reported
                for (done, _) in &files[..i] {
                    let _ = std::fs::remove_file(self.staging_path(done));
                }
                let _ = std::fs::remove_file(&staged);
                return Err(OutputError::Io {
                    path: staged,
                    source,
                });
            }
        }

        for (file, _) in files {
            let path = self.path(file);
            std::fs::rename(self.staging_path(file), &path)
                .map_err(|source| OutputError::Io { path, source })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::compare;
    use crate::record::{read_renamed, read_snapshot};
    use tempfile::tempdir;

    fn read(writer: &OutputWriter, file: &str) -> String {
        std::fs::read_to_string(writer.path(file)).unwrap()
    }

    fn comparison() -> Comparison {
        let reference = vec![
            Station::new("1", "A", 43.0, -79.0),
            Station::new("2", "B", 43.1, -79.1),
            Station::new("4", "Old", 43.3, -79.3),
        ];
        let current = vec![
            Station::new("4", "New", 43.3, -79.3),
            Station::new("3", "C", 43.2, -79.2),
            Station::new("2", "B", 43.2, -79.1),
            Station::new("0", "Z", 43.4, -79.4),
        ];
        compare(&current, &reference, 3.0)
    }

    #[test]
    fn writes_all_files() {
        let dir = tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());

        writer
            .write_stations(&[Station::new("1", "A", 43.0, -79.0)])
            .unwrap();
        writer.write_comparison(&comparison()).unwrap();

        for file in [STATIONS_FILE, ADDED_FILE, REMOVED_FILE, MOVED_FILE, RENAMED_FILE] {
            assert!(writer.path(file).exists(), "{file} missing");
        }

        let added: Vec<String> = read_snapshot(&read(&writer, ADDED_FILE))
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(added, vec!["0", "3"]);

        assert_eq!(read_snapshot(&read(&writer, REMOVED_FILE)).unwrap()[0].id, "1");
        assert_eq!(read_snapshot(&read(&writer, MOVED_FILE)).unwrap()[0].id, "2");

        let renamed = read_renamed(&read(&writer, RENAMED_FILE)).unwrap();
        assert_eq!(renamed.len(), 1);
        assert_eq!(renamed[0].0.name(), "New");
        assert_eq!(renamed[0].1.as_deref(), Some("Old"));
    }

    #[test]
    fn empty_change_sets_are_empty_files() {
        let dir = tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        writer.write_comparison(&Comparison::default()).unwrap();

        assert_eq!(read(&writer, ADDED_FILE), "");
        assert_eq!(read(&writer, RENAMED_FILE), "");
    }

    #[test]
    fn creates_nested_directories() {
        let dir = tempdir().unwrap();
        let writer = OutputWriter::new(dir.path().join("toronto").join("map"));
        writer.write_stations(&[]).unwrap();
        assert!(writer.path(STATIONS_FILE).exists());
    }

    #[test]
    fn no_staging_files_left_behind() {
        let dir = tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        writer.write_stations(&[]).unwrap();
        writer.write_comparison(&comparison()).unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[test]
    fn failed_staging_keeps_previous_files() {
        let dir = tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        writer.write_comparison(&Comparison::default()).unwrap();

        // A directory where the last file would be staged makes staging fail
        std::fs::create_dir(writer.staging_path(RENAMED_FILE)).unwrap();

        let err = writer.write_comparison(&comparison()).unwrap_err();
        assert!(matches!(err, OutputError::Io { .. }));

        assert_eq!(read(&writer, ADDED_FILE), "");
        assert_eq!(read(&writer, REMOVED_FILE), "");
        assert!(!writer.staging_path(ADDED_FILE).exists());
    }

    #[test]
    fn rewriting_is_byte_identical() {
        let dir = tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());

        writer.write_comparison(&comparison()).unwrap();
        let first = read(&writer, ADDED_FILE);
        writer.write_comparison(&comparison()).unwrap();
        assert_eq!(read(&writer, ADDED_FILE), first);
    }
}
