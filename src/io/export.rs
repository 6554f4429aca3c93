//! Export held-out predictions to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use crate::domain::PropertyRecord;
use crate::error::OracleError;

const HEADER: [&str; 6] = [
    "comuna",
    "surface_m2",
    "distance_to_metro",
    "price_uf",
    "predicted_uf",
    "residual_uf",
];

/// Write one line per held-out row: features, true price, prediction, residual.
pub fn write_predictions_csv(
    path: &Path,
    records: &[PropertyRecord],
    predicted: &[f64],
) -> Result<(), OracleError> {
    if records.len() != predicted.len() {
        return Err(OracleError::InvalidInput(format!(
            "{} records but {} predictions",
            records.len(),
            predicted.len()
        )));
    }

    let write_err =
        |e: csv::Error| OracleError::io(format!("failed to write export CSV '{}'", path.display()), e.into());

    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    writer.write_record(HEADER).map_err(write_err)?;

    for (r, &y_fit) in records.iter().zip(predicted) {
        let f = &r.features;
        writer
            .write_record([
                f.district.clone(),
                f.surface_m2.to_string(),
                f.distance_to_metro.to_string(),
                format!("{:.2}", r.price_uf),
                format!("{y_fit:.4}"),
                format!("{:.4}", r.price_uf - y_fit),
            ])
            .map_err(write_err)?;
    }

    writer
        .flush()
        .map_err(|e| OracleError::io(format!("failed to flush export CSV '{}'", path.display()), e))?;
    Ok(())
}
