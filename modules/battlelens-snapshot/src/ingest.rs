use std::time::Instant;

use tracing::{info, warn};

use battlelens_common::{BattleLensError, Dataset, Result, Row};

use crate::decode::decompress;
use crate::source::SnapshotSource;

/// Unparseable records tolerated per snapshot before the whole batch is rejected.
pub const PARSE_ERROR_TOLERANCE: usize = 10;

/// Parse decompressed CSV bytes into rows.
///
/// Blank lines are skipped by the reader. Records without a property
/// description are dropped, and survivors are numbered from 1 in order.
pub fn parse_rows(csv_bytes: &[u8]) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_bytes);

    let mut rows = Vec::new();
    let mut errors = 0usize;
    let mut dropped = 0usize;

    for (idx, record) in reader.deserialize::<Row>().enumerate() {
        match record {
            Ok(row) if row.has_property() => rows.push(row),
            Ok(_) => dropped += 1,
            Err(e) => {
                errors += 1;
                warn!(record = idx + 1, error = %e, "Skipping unparseable snapshot record");
                if errors > PARSE_ERROR_TOLERANCE {
                    return Err(BattleLensError::Parse(format!(
                        "more than {PARSE_ERROR_TOLERANCE} unparseable records (last: {e})"
                    )));
                }
            }
        }
    }

    for (i, row) in rows.iter_mut().enumerate() {
        row.row_id = i as u64 + 1;
    }

    if dropped > 0 || errors > 0 {
        info!(
            kept = rows.len(),
            dropped,
            errors,
            "Filtered snapshot records"
        );
    }
    Ok(rows)
}

/// Fetch, decompress and parse one dataset snapshot.
pub async fn load_rows(source: &dyn SnapshotSource, dataset: &Dataset) -> Result<Vec<Row>> {
    let started = Instant::now();

    let raw = source.fetch(&dataset.path).await?;
    let csv_bytes = decompress(&raw)?;
    let rows = parse_rows(&csv_bytes)?;

    info!(
        dataset = %dataset.key,
        compressed_bytes = raw.len(),
        csv_bytes = csv_bytes.len(),
        rows = rows.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "Loaded snapshot"
    );
    Ok(rows)
}
