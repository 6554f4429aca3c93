//! Dataset CSV ingest.
//!
//! Turns the market-data CSV into clean `PropertyRecord`s that are safe to fit.
//!
//! Schema (header names are matched case-insensitively):
//!
//! ```text
//! comuna,surface_m2,distance_to_metro,price_uf
//! ```
//!
//! - A missing file is `DataSourceMissing`, never an empty dataset.
//! - Missing required columns fail the whole load.
//! - Bad rows are skipped and reported with their line number. A `comuna`
//!   outside the closed district set is a bad row.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{District, PropertyFeatures, PropertyRecord};
use crate::error::OracleError;

pub const COL_DISTRICT: &str = "comuna";
pub const COL_SURFACE: &str = "surface_m2";
pub const COL_DISTANCE: &str = "distance_to_metro";
pub const COL_PRICE: &str = "price_uf";

const REQUIRED_COLUMNS: [&str; 4] = [COL_DISTRICT, COL_SURFACE, COL_DISTANCE, COL_PRICE];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: usable records + what was skipped.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub records: Vec<PropertyRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl IngestedData {
    pub fn rows_used(&self) -> usize {
        self.records.len()
    }
}

/// Load and validate the training dataset.
pub fn load_dataset(path: &Path) -> Result<IngestedData, OracleError> {
    if !path.is_file() {
        return Err(OracleError::DataSourceMissing(path.to_path_buf()));
    }
    let file = File::open(path)
        .map_err(|e| OracleError::io(format!("failed to open dataset '{}'", path.display()), e))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| OracleError::InvalidDataset(format!("failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !header_map.contains_key(**c)) {
        return Err(OracleError::InvalidDataset(format!(
            "missing required column: `{missing}`"
        )));
    }

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_row(&record, &header_map));
        match parsed {
            Ok(r) => records.push(r),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        warn!(
            skipped = row_errors.len(),
            first_line = row_errors[0].line,
            first_error = %row_errors[0].message,
            "Skipped invalid dataset rows"
        );
    }
    if records.is_empty() {
        return Err(OracleError::InvalidDataset(format!(
            "no valid rows in '{}' ({rows_read} read)",
            path.display()
        )));
    }

    info!(path = %path.display(), rows_read, rows_used = records.len(), "Loaded dataset");

    Ok(IngestedData {
        records,
        row_errors,
        rows_read,
    })
}

/// Write records using the dataset schema, creating parent directories.
pub fn write_dataset(path: &Path, records: &[PropertyRecord]) -> Result<(), OracleError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| OracleError::io(format!("failed to create '{}'", parent.display()), e))?;
    }

    let write_err = |e: csv::Error| OracleError::io(format!("failed to write dataset '{}'", path.display()), e.into());

    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    writer.write_record(REQUIRED_COLUMNS).map_err(write_err)?;
    for r in records {
        writer
            .write_record([
                r.features.district.clone(),
                r.features.surface_m2.to_string(),
                r.features.distance_to_metro.to_string(),
                r.price_uf.to_string(),
            ])
            .map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| OracleError::io(format!("failed to flush dataset '{}'", path.display()), e))?;
    Ok(())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<PropertyRecord, String> {
    let label = get_required(record, header_map, COL_DISTRICT)?;
    let district = District::from_label(label).ok_or_else(|| format!("unknown comuna '{label}'"))?;
    let surface_m2 = parse_number(record, header_map, COL_SURFACE)?;
    let distance_to_metro = parse_number(record, header_map, COL_DISTANCE)?;
    let price_uf = parse_number(record, header_map, COL_PRICE)?;

    if surface_m2 <= 0.0 {
        return Err(format!("`{COL_SURFACE}` must be > 0, got {surface_m2}"));
    }
    // Listings right next to a station report 0 m.
    if distance_to_metro < 0.0 {
        return Err(format!("`{COL_DISTANCE}` must be >= 0, got {distance_to_metro}"));
    }

    Ok(PropertyRecord {
        features: PropertyFeatures::for_district(district, surface_m2, distance_to_metro),
        price_uf,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    column: &str,
) -> Result<&'a str, String> {
    let value = header_map
        .get(column)
        .and_then(|&idx| record.get(idx))
        .unwrap_or("");
    if value.is_empty() {
        return Err(format!("missing value for `{column}`"));
    }
    Ok(value)
}

fn parse_number(record: &StringRecord, header_map: &HashMap<String, usize>, column: &str) -> Result<f64, String> {
    let raw = get_required(record, header_map, column)?;
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("`{column}` is not a number: '{raw}'"))?;
    if !value.is_finite() {
        return Err(format!("`{column}` is not finite: '{raw}'"));
    }
    Ok(value)
}
