//! Domain error types.
//!
//! These represent violated preconditions on snapshots. They are distinct
//! from decoding errors, which are raised at the record boundary.

use std::collections::HashSet;

use super::Station;

/// Domain-level precondition violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Two stations in one snapshot share an id
    #[error("duplicate station id in snapshot: {0}")]
    DuplicateId(String),
}

/// Check that no two stations in a snapshot share an id.
///
/// Reconciliation tolerates duplicates (the last occurrence wins); this
/// lets a caller reject them up front instead.
pub fn ensure_unique_ids(stations: &[Station]) -> Result<(), DomainError> {
    let mut seen = HashSet::with_capacity(stations.len());
    for station in stations {
        if !seen.insert(station.id.as_str()) {
            return Err(DomainError::DuplicateId(station.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::DuplicateId("7000".into());
        assert_eq!(err.to_string(), "duplicate station id in snapshot: 7000");
    }

    #[test]
    fn unique_ids_pass() {
        let stations = vec![
            Station::new("1", "A", 43.0, -79.0),
            Station::new("2", "B", 43.1, -79.1),
        ];
        assert_eq!(ensure_unique_ids(&stations), Ok(()));
        assert_eq!(ensure_unique_ids(&[]), Ok(()));
    }

    #[test]
    fn first_duplicate_reported() {
        let stations = vec![
            Station::new("1", "A", 43.0, -79.0),
            Station::new("2", "B", 43.1, -79.1),
            Station::new("2", "B again", 43.1, -79.1),
            Station::new("1", "A again", 43.0, -79.0),
        ];
        assert_eq!(
            ensure_unique_ids(&stations),
            Err(DomainError::DuplicateId("2".into()))
        );
    }
}
