//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during training and serving
//! - read from / written to the dataset CSV and the model artifact
//! - exchanged as request/response bodies

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::OracleError;

/// A district (comuna) of the simulated market.
///
/// The set is closed: requests naming anything else violate the input contract.
/// The preprocessor still copes with unseen labels (see `models::preprocess`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
pub enum District {
    #[serde(rename = "Vitacura")]
    Vitacura,
    #[serde(rename = "Las Condes")]
    #[value(name = "las-condes")]
    LasCondes,
    #[serde(rename = "Lo Barnechea")]
    #[value(name = "lo-barnechea")]
    LoBarnechea,
    #[serde(rename = "Providencia")]
    Providencia,
    #[serde(rename = "Ñuñoa")]
    #[value(name = "nunoa")]
    Nunoa,
    #[serde(rename = "San Miguel")]
    #[value(name = "san-miguel")]
    SanMiguel,
    #[serde(rename = "Macul")]
    Macul,
    #[serde(rename = "Santiago")]
    Santiago,
    #[serde(rename = "La Florida")]
    #[value(name = "la-florida")]
    LaFlorida,
    #[serde(rename = "Maipú")]
    #[value(name = "maipu")]
    Maipu,
    #[serde(rename = "Estación Central")]
    #[value(name = "estacion-central")]
    EstacionCentral,
}

impl District {
    pub const ALL: [District; 11] = [
        District::Vitacura,
        District::LasCondes,
        District::LoBarnechea,
        District::Providencia,
        District::Nunoa,
        District::SanMiguel,
        District::Macul,
        District::Santiago,
        District::LaFlorida,
        District::Maipu,
        District::EstacionCentral,
    ];

    /// The label used in datasets, requests and the encoder vocabulary.
    pub fn display_name(self) -> &'static str {
        match self {
            District::Vitacura => "Vitacura",
            District::LasCondes => "Las Condes",
            District::LoBarnechea => "Lo Barnechea",
            District::Providencia => "Providencia",
            District::Nunoa => "Ñuñoa",
            District::SanMiguel => "San Miguel",
            District::Macul => "Macul",
            District::Santiago => "Santiago",
            District::LaFlorida => "La Florida",
            District::Maipu => "Maipú",
            District::EstacionCentral => "Estación Central",
        }
    }

    /// Resolve a dataset/request label to a district (exact display name).
    pub fn from_label(label: &str) -> Option<District> {
        let label = label.trim();
        District::ALL.into_iter().find(|d| d.display_name() == label)
    }
}

impl fmt::Display for District {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Raw (unlabelled) features of one apartment.
///
/// `district` is kept as a free label: the regression pipeline must produce a
/// prediction for labels it never saw during fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFeatures {
    pub district: String,
    pub surface_m2: f64,
    pub distance_to_metro: f64,
}

impl PropertyFeatures {
    pub fn new(district: impl Into<String>, surface_m2: f64, distance_to_metro: f64) -> Self {
        Self {
            district: district.into(),
            surface_m2,
            distance_to_metro,
        }
    }

    pub fn for_district(district: District, surface_m2: f64, distance_to_metro: f64) -> Self {
        Self::new(district.display_name(), surface_m2, distance_to_metro)
    }
}

/// A labelled training row.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRecord {
    pub features: PropertyFeatures,
    /// Monthly rent in UF.
    pub price_uf: f64,
}

/// Request body of the prediction contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInput {
    pub comuna: String,
    pub surface_m2: f64,
    pub distance_to_metro: f64,
}

impl PropertyInput {
    /// Enforce the request contract: a known district and positive, finite numerics.
    pub fn validate(&self) -> Result<PropertyFeatures, OracleError> {
        let district = District::from_label(&self.comuna)
            .ok_or_else(|| OracleError::InvalidInput(format!("unknown comuna '{}'", self.comuna)))?;
        if !(self.surface_m2.is_finite() && self.surface_m2 > 0.0) {
            return Err(OracleError::InvalidInput(format!(
                "surface_m2 must be a positive number, got {}",
                self.surface_m2
            )));
        }
        if !(self.distance_to_metro.is_finite() && self.distance_to_metro > 0.0) {
            return Err(OracleError::InvalidInput(format!(
                "distance_to_metro must be a positive number, got {}",
                self.distance_to_metro
            )));
        }
        Ok(PropertyFeatures::for_district(
            district,
            self.surface_m2,
            self.distance_to_metro,
        ))
    }
}

/// Pricing unit tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrencyUnit {
    #[serde(rename = "UF")]
    Uf,
}

impl CurrencyUnit {
    pub fn code(self) -> &'static str {
        match self {
            CurrencyUnit::Uf => "UF",
        }
    }
}

/// Point estimate plus a symmetric confidence band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    pub estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub unit: CurrencyUnit,
}

/// Response body of the prediction contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub estimated_price_uf: f64,
    pub confidence_interval_lower: f64,
    pub confidence_interval_upper: f64,
    pub currency: CurrencyUnit,
}

impl From<PredictionResult> for PredictionResponse {
    fn from(result: PredictionResult) -> Self {
        Self {
            estimated_price_uf: result.estimate,
            confidence_interval_lower: result.lower_bound,
            confidence_interval_upper: result.upper_bound,
            currency: result.unit,
        }
    }
}

/// Held-out accuracy of one training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub r_squared: f64,
    pub mean_absolute_error: f64,
}

/// Half-width of the symmetric confidence band served with every estimate.
///
/// Derived from the held-out MAE of the training run that produced the
/// artifact and stored inside it, so the band always matches the served model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub half_width: f64,
}

impl ConfidenceBand {
    /// Keeps `lower < estimate < upper` strict even for a perfect fit.
    pub const MIN_HALF_WIDTH: f64 = 0.01;

    /// MAE rounded to cents (the precision estimates are served at).
    pub fn from_mae(mean_absolute_error: f64) -> Self {
        let rounded = crate::math::round_to(mean_absolute_error, 2);
        let half_width = if rounded.is_finite() {
            rounded.max(Self::MIN_HALF_WIDTH)
        } else {
            Self::MIN_HALF_WIDTH
        };
        Self { half_width }
    }
}

/// Readiness report polled by whatever hosts the serving context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub model_loaded: bool,
}

/// Hyperparameters of the boosted ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoosterParams {
    pub n_estimators: usize,
    pub max_depth: u32,
    pub learning_rate: f64,
    pub min_leaf_size: usize,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: 3,
            learning_rate: 0.1,
            min_leaf_size: 1,
        }
    }
}

/// Market simulation settings.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub samples: usize,
    pub seed: u64,
    pub output: PathBuf,
}

/// A full training run's configuration as understood by the protocol.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    /// Seed for the train/held-out shuffle.
    pub seed: u64,
    /// Fraction of rows held out for evaluation.
    pub test_fraction: f64,
    pub booster: BoosterParams,
    /// Refuse to persist when held-out R² falls below this value.
    pub min_r_squared: Option<f64>,
    /// Write held-out predictions to this CSV.
    pub export_predictions: Option<PathBuf>,
}

impl TrainConfig {
    pub const DEFAULT_SEED: u64 = 42;
    pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

    pub fn new(data_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            model_path: model_path.into(),
            seed: Self::DEFAULT_SEED,
            test_fraction: Self::DEFAULT_TEST_FRACTION,
            booster: BoosterParams::default(),
            min_r_squared: None,
            export_predictions: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn district_labels_round_trip() {
        for d in District::ALL {
            assert_eq!(District::from_label(d.display_name()), Some(d));
        }
        assert_eq!(District::from_label("  Ñuñoa "), Some(District::Nunoa));
        assert_eq!(District::from_label("Atlantis"), None);
    }

    #[test]
    fn district_serializes_as_display_name() {
        let json = serde_json::to_string(&District::EstacionCentral).unwrap();
        assert_eq!(json, "\"Estación Central\"");
    }

    #[test]
    fn input_validation_rejects_unknown_district_and_non_positive_values() {
        let ok = PropertyInput {
            comuna: "Providencia".to_string(),
            surface_m2: 55.0,
            distance_to_metro: 350.0,
        };
        let features = ok.validate().unwrap();
        assert_eq!(features.district, "Providencia");

        let bad_district = PropertyInput {
            comuna: "Atlantis".to_string(),
            ..ok.clone()
        };
        assert!(matches!(bad_district.validate(), Err(OracleError::InvalidInput(_))));

        let bad_surface = PropertyInput {
            surface_m2: 0.0,
            ..ok.clone()
        };
        assert!(bad_surface.validate().is_err());

        let bad_distance = PropertyInput {
            distance_to_metro: f64::NAN,
            ..ok
        };
        assert!(bad_distance.validate().is_err());
    }

    #[test]
    fn confidence_band_rounds_mae_to_cents() {
        assert_eq!(ConfidenceBand::from_mae(2.2149).half_width, 2.21);
        assert_eq!(ConfidenceBand::from_mae(0.0).half_width, ConfidenceBand::MIN_HALF_WIDTH);
        assert_eq!(ConfidenceBand::from_mae(f64::NAN).half_width, ConfidenceBand::MIN_HALF_WIDTH);
    }

    #[test]
    fn response_uses_wire_field_names() {
        let response = PredictionResponse::from(PredictionResult {
            estimate: 20.5,
            lower_bound: 18.29,
            upper_bound: 22.71,
            unit: CurrencyUnit::Uf,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["estimated_price_uf"], 20.5);
        assert_eq!(json["confidence_interval_lower"], 18.29);
        assert_eq!(json["confidence_interval_upper"], 22.71);
        assert_eq!(json["currency"], "UF");
    }
}
