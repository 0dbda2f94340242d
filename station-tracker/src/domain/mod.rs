//! Domain types for station tracking.
//!
//! A [`Station`] is normalized on construction, so code that receives one
//! can compare names directly without re-normalizing.

mod error;
mod station;

pub use error::{DomainError, ensure_unique_ids};
pub use station::{
    COORDINATE_DECIMALS, ElementType, SourceLink, Station, normalize_name, round_coordinate,
    valid_coordinates,
};
