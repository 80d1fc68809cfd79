pub mod decode;
pub mod ingest;
pub mod optimize;
pub mod source;

#[cfg(feature = "test-support")]
pub mod testing;

pub use ingest::{load_rows, parse_rows, PARSE_ERROR_TOLERANCE};
pub use source::{HttpSnapshotSource, SnapshotSource};
