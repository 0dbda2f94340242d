//! Record decoding error types.

/// A record line that could not be decoded into a station.
///
/// Every variant names the constraint that was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// Input was empty or whitespace
    #[error("empty record")]
    Empty,

    /// Input was not a well-formed feature collection
    #[error("malformed record JSON: {message}")]
    Json { message: String },

    /// The features array is missing or empty
    #[error("record has no features")]
    NoFeatures,

    /// The first feature has no properties object
    #[error("record feature has no properties")]
    NoProperties,

    /// A required property is absent
    #[error("record is missing required property `{0}`")]
    MissingProperty(&'static str),

    /// A property is present but unusable
    #[error("record property `{property}` is invalid: {reason}")]
    InvalidProperty {
        property: &'static str,
        reason: String,
    },
}

/// A snapshot file containing an undecodable record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    /// The record on `line` (1-based) failed to decode
    #[error("line {line}: {source}")]
    Record { line: usize, source: RecordError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(RecordError::Empty.to_string(), "empty record");
        assert_eq!(
            RecordError::MissingProperty("latitude").to_string(),
            "record is missing required property `latitude`"
        );

        let err = RecordError::InvalidProperty {
            property: "longitude",
            reason: "200 is outside [-180, 180]".into(),
        };
        assert_eq!(
            err.to_string(),
            "record property `longitude` is invalid: 200 is outside [-180, 180]"
        );

        let err = SnapshotError::Record {
            line: 3,
            source: RecordError::NoFeatures,
        };
        assert_eq!(err.to_string(), "line 3: record has no features");
    }
}
