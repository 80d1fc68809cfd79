//! Split a full property snapshot into a light "table" file for listings and
//! a "detail" file with full responses, plus a JSON index describing both.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use battlelens_common::{truncate_chars, DESCRIPTION_PREVIEW_CHARS, EVIDENCE_PREVIEW_CHARS};

use crate::decode::decompress;

/// Columns needed to render listings.
pub const TABLE_COLUMNS: &[&str] = &[
    "prompt",
    "model",
    "type",
    "impact",
    "unexpected_behavior",
    "property_description_coarse_cluster_label",
    "property_description_fine_cluster_label",
    "property_description",
    "category",
    "evidence",
];

/// Extra columns only the detail view needs.
pub const DETAIL_COLUMNS: &[&str] = &[
    "model_1_response",
    "model_2_response",
    "model_1_name",
    "model_2_name",
    "differences",
    "parsed_differences",
    "parse_error",
    "reason",
    "property_description_coarse_cluster_id",
    "property_description_fine_cluster_id",
];

pub const TABLE_FILE: &str = "table_data.csv.gz";
pub const DETAIL_FILE: &str = "detail_data.csv.gz";
pub const INDEX_FILE: &str = "data_index.json";

#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    pub max_detail_rows: usize,
    pub sample_seed: u64,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            max_detail_rows: 10_000,
            sample_seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailableColumns {
    pub table: Vec<String>,
    pub detail: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataIndex {
    pub total_rows: usize,
    pub table_rows: usize,
    pub detail_rows: usize,
    pub available_columns: AvailableColumns,
    /// Row ids kept in the detail file, only when it was sampled.
    pub row_id_mapping: Option<Vec<u64>>,
}

#[derive(Debug)]
pub struct OptimizeReport {
    pub table_file: PathBuf,
    pub detail_file: PathBuf,
    pub index_file: PathBuf,
    pub index: DataIndex,
    pub input_bytes: u64,
    pub table_bytes: u64,
    pub detail_bytes: u64,
}

pub fn optimize_snapshot(
    input: &Path,
    output_dir: &Path,
    options: &OptimizeOptions,
) -> Result<OptimizeReport> {
    let raw = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let csv_bytes = decompress(&raw)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_bytes.as_slice());
    let headers = reader.headers()?.clone();
    let records = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to parse {}", input.display()))?;
    info!(rows = records.len(), columns = headers.len(), "Read snapshot");

    // Ingestion numbers only rows that carry a property, so drop the rest
    // before assigning ids.
    let records = with_property(&headers, records);

    let table_cols = present_columns(&headers, TABLE_COLUMNS.iter().copied());
    let detail_cols = present_columns(
        &headers,
        TABLE_COLUMNS.iter().chain(DETAIL_COLUMNS.iter()).copied(),
    );

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let table_file = output_dir.join(TABLE_FILE);
    write_projection(&table_file, &table_cols, records.iter().enumerate(), true)?;

    let detail_ids = detail_sample(records.len(), options);
    let detail_rows: Vec<(usize, &csv::StringRecord)> = match &detail_ids {
        Some(ids) => ids.iter().map(|&i| (i, &records[i])).collect(),
        None => records.iter().enumerate().collect(),
    };
    if detail_ids.is_some() {
        info!(
            total = records.len(),
            kept = detail_rows.len(),
            "Sampled detail rows"
        );
    }
    let detail_file = output_dir.join(DETAIL_FILE);
    write_projection(&detail_file, &detail_cols, detail_rows.iter().copied(), false)?;

    let index = DataIndex {
        total_rows: records.len(),
        table_rows: records.len(),
        detail_rows: detail_rows.len(),
        available_columns: AvailableColumns {
            table: table_cols.iter().map(|(name, _)| name.to_string()).collect(),
            detail: detail_cols.iter().map(|(name, _)| name.to_string()).collect(),
        },
        row_id_mapping: detail_ids.map(|ids| ids.iter().map(|&i| i as u64 + 1).collect()),
    };
    let index_file = output_dir.join(INDEX_FILE);
    fs::write(&index_file, serde_json::to_vec_pretty(&index)?)
        .with_context(|| format!("Failed to write {}", index_file.display()))?;

    let report = OptimizeReport {
        input_bytes: raw.len() as u64,
        table_bytes: fs::metadata(&table_file)?.len(),
        detail_bytes: fs::metadata(&detail_file)?.len(),
        table_file,
        detail_file,
        index_file,
        index,
    };
    info!(
        input_bytes = report.input_bytes,
        table_bytes = report.table_bytes,
        detail_bytes = report.detail_bytes,
        "Optimization complete"
    );
    Ok(report)
}

fn with_property(
    headers: &csv::StringRecord,
    records: Vec<csv::StringRecord>,
) -> Vec<csv::StringRecord> {
    let Some(pos) = headers.iter().position(|h| h == "property_description") else {
        return records;
    };
    let total = records.len();
    let kept: Vec<_> = records
        .into_iter()
        .filter(|r| !r.get(pos).unwrap_or("").trim().is_empty())
        .collect();
    if kept.len() < total {
        info!(
            dropped = total - kept.len(),
            "Dropped rows without a property description"
        );
    }
    kept
}

/// Wanted columns that exist in `headers`, in wanted order, each once.
fn present_columns<'a>(
    headers: &csv::StringRecord,
    wanted: impl Iterator<Item = &'a str>,
) -> Vec<(&'a str, usize)> {
    let mut out: Vec<(&str, usize)> = Vec::new();
    for name in wanted {
        if out.iter().any(|(n, _)| *n == name) {
            continue;
        }
        if let Some(pos) = headers.iter().position(|h| h == name) {
            out.push((name, pos));
        }
    }
    out
}

/// Sorted record indices to keep in the detail file, or `None` to keep all.
fn detail_sample(total: usize, options: &OptimizeOptions) -> Option<Vec<usize>> {
    if total <= options.max_detail_rows {
        return None;
    }
    let mut rng = StdRng::seed_from_u64(options.sample_seed);
    let mut ids = rand::seq::index::sample(&mut rng, total, options.max_detail_rows).into_vec();
    ids.sort_unstable();
    Some(ids)
}

fn write_projection<'r>(
    path: &Path,
    columns: &[(&str, usize)],
    records: impl Iterator<Item = (usize, &'r csv::StringRecord)>,
    truncate: bool,
) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut writer = csv::Writer::from_writer(encoder);

    let mut header: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    header.push("row_id");
    writer.write_record(&header)?;

    for (idx, record) in records {
        let mut out: Vec<String> = columns
            .iter()
            .map(|(name, pos)| {
                let value = record.get(*pos).unwrap_or("");
                match (*name, truncate) {
                    ("property_description", true) => {
                        truncate_chars(value, DESCRIPTION_PREVIEW_CHARS)
                    }
                    ("evidence", true) => truncate_chars(value, EVIDENCE_PREVIEW_CHARS),
                    _ => value.to_string(),
                }
            })
            .collect();
        out.push((idx + 1).to_string());
        writer.write_record(&out)?;
    }

    let encoder = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush {}: {}", path.display(), e.error()))?;
    let mut file = encoder.finish()?;
    file.flush()?;
    Ok(())
}
