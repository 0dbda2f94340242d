//! Line-oriented station record format.
//!
//! Each station is written as one line: an ASCII record separator (0x1E)
//! followed by a single-feature GeoJSON feature collection. Keeping every
//! record on its own line means a line-based diff of two snapshot files
//! shows whole stations being inserted or deleted.

mod codec;
mod error;
mod snapshot;

pub use codec::{RECORD_SEPARATOR, decode, decode_with_old_name, encode, encode_renamed};
pub use error::{RecordError, SnapshotError};
pub use snapshot::{read_renamed, read_snapshot, write_renamed, write_snapshot};
