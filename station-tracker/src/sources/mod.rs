//! Remote snapshot sources.
//!
//! Two independently maintained sources describe the same stations:
//! the operator's GBFS feed, and community map data served by an
//! Overpass API instance. Both produce plain [`Station`](crate::domain::Station)
//! lists; everything after fetching is source-agnostic.

mod error;
mod gbfs;
mod overpass;

pub use error::SourceError;
pub use gbfs::{GbfsClient, GbfsClientConfig};
pub use overpass::{BoundingBox, OverpassClient, OverpassClientConfig, OverpassQuery};
