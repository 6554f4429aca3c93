//! Synthetic rental-market generator.
//!
//! Each simulated apartment gets:
//!
//! - a district drawn from a fixed market-share distribution
//! - a surface from a log-normal (right-skewed, like real listings), clipped to [20, 300] m²
//! - a distance to the nearest metro stop from an exponential with mean 800 m
//!
//! and a monthly rent in UF:
//!
//! ```text
//! price = base(district) + surface * m2_value(district) + 3000 / (distance + 500) + N(0, 1.5)
//! ```
//!
//! floored at 5.0 UF and rounded to cents. The metro term has diminishing
//! returns: about 6 UF next to a station, about 2 UF at one kilometre.

use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand_distr::{Exp, LogNormal, Normal};
use tracing::info;

use crate::domain::{District, PropertyFeatures, PropertyRecord};
use crate::error::OracleError;
use crate::math::round_to;

/// Log-normal parameters of the surface distribution (of ln m²).
const SURFACE_LN_MEAN: f64 = 3.8;
const SURFACE_LN_SIGMA: f64 = 0.4;
const SURFACE_MIN: f64 = 20.0;
const SURFACE_MAX: f64 = 300.0;

/// Mean distance to metro (metres).
const DISTANCE_SCALE: f64 = 800.0;

/// Idiosyncratic noise on the rent (UF).
const PRICE_NOISE_SIGMA: f64 = 1.5;
const PRICE_FLOOR: f64 = 5.0;

/// Calibration of one district.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketProfile {
    pub district: District,
    /// Fixed location premium (UF).
    pub base: f64,
    /// Rent per square metre (UF/m²).
    pub m2_value: f64,
    /// Share of listings in this district.
    pub share: f64,
}

pub const MARKET_PROFILES: [MarketProfile; 11] = [
    MarketProfile { district: District::Vitacura, base: 3.5, m2_value: 0.32, share: 0.05 },
    MarketProfile { district: District::LasCondes, base: 2.5, m2_value: 0.30, share: 0.10 },
    MarketProfile { district: District::LoBarnechea, base: 3.0, m2_value: 0.29, share: 0.05 },
    MarketProfile { district: District::Providencia, base: 2.0, m2_value: 0.28, share: 0.10 },
    MarketProfile { district: District::Nunoa, base: 2.0, m2_value: 0.24, share: 0.10 },
    MarketProfile { district: District::SanMiguel, base: 1.5, m2_value: 0.17, share: 0.20 },
    MarketProfile { district: District::Macul, base: 1.5, m2_value: 0.17, share: 0.10 },
    MarketProfile { district: District::Santiago, base: 1.2, m2_value: 0.18, share: 0.05 },
    MarketProfile { district: District::LaFlorida, base: 1.2, m2_value: 0.15, share: 0.10 },
    MarketProfile { district: District::Maipu, base: 1.0, m2_value: 0.14, share: 0.10 },
    MarketProfile { district: District::EstacionCentral, base: 0.8, m2_value: 0.14, share: 0.05 },
];

pub fn profile(district: District) -> &'static MarketProfile {
    MARKET_PROFILES
        .iter()
        .find(|p| p.district == district)
        .unwrap_or(&MARKET_PROFILES[0])
}

/// Metro proximity premium (UF).
pub fn metro_premium(distance_to_metro: f64) -> f64 {
    3000.0 / (distance_to_metro + 500.0)
}

/// Noise-free rent for the given features.
pub fn expected_price(district: District, surface_m2: f64, distance_to_metro: f64) -> f64 {
    let p = profile(district);
    p.base + surface_m2 * p.m2_value + metro_premium(distance_to_metro)
}

/// Generate `samples` labelled rows, reproducibly for a given `seed`.
pub fn generate_market_data(samples: usize, seed: u64) -> Result<Vec<PropertyRecord>, OracleError> {
    if samples == 0 {
        return Err(OracleError::InvalidInput("sample count must be > 0".into()));
    }

    let dist_err = |e: &dyn std::fmt::Display| OracleError::Model(format!("sampling distribution error: {e}"));
    let districts = WeightedIndex::new(MARKET_PROFILES.iter().map(|p| p.share)).map_err(|e| dist_err(&e))?;
    let surface = LogNormal::new(SURFACE_LN_MEAN, SURFACE_LN_SIGMA).map_err(|e| dist_err(&e))?;
    let distance = Exp::new(1.0 / DISTANCE_SCALE).map_err(|e| dist_err(&e))?;
    let noise = Normal::new(0.0, PRICE_NOISE_SIGMA).map_err(|e| dist_err(&e))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::with_capacity(samples);

    for _ in 0..samples {
        let profile = &MARKET_PROFILES[districts.sample(&mut rng)];
        // Listings quote whole square metres / metres.
        let surface_m2 = surface.sample(&mut rng).trunc().clamp(SURFACE_MIN, SURFACE_MAX);
        let distance_to_metro = distance.sample(&mut rng).trunc();

        let price = expected_price(profile.district, surface_m2, distance_to_metro) + noise.sample(&mut rng);
        let price_uf = round_to(price, 2).max(PRICE_FLOOR);

        records.push(PropertyRecord {
            features: PropertyFeatures::for_district(profile.district, surface_m2, distance_to_metro),
            price_uf,
        });
    }

    info!(samples, seed, "Generated simulated market data");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shares_sum_to_one_and_cover_every_district() {
        let total: f64 = MARKET_PROFILES.iter().map(|p| p.share).sum();
        assert!((total - 1.0).abs() < 1e-12);
        for d in District::ALL {
            assert_eq!(profile(d).district, d);
        }
    }

    #[test]
    fn metro_premium_decays() {
        assert!((metro_premium(0.0) - 6.0).abs() < 1e-12);
        assert!((metro_premium(1000.0) - 2.0).abs() < 1e-12);
        assert!(metro_premium(200.0) > metro_premium(2000.0));
    }

    #[test]
    fn generated_rows_respect_bounds() {
        let records = generate_market_data(2000, 42).unwrap();
        assert_eq!(records.len(), 2000);
        for r in &records {
            assert!(District::from_label(&r.features.district).is_some());
            assert!((SURFACE_MIN..=SURFACE_MAX).contains(&r.features.surface_m2));
            assert_eq!(r.features.surface_m2.fract(), 0.0);
            assert!(r.features.distance_to_metro >= 0.0);
            assert!(r.price_uf >= PRICE_FLOOR);
            assert_eq!(round_to(r.price_uf, 2), r.price_uf);
        }
    }

    #[test]
    fn same_seed_same_data() {
        let a = generate_market_data(300, 7).unwrap();
        let b = generate_market_data(300, 7).unwrap();
        let c = generate_market_data(300, 8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn zero_samples_is_rejected() {
        assert!(generate_market_data(0, 42).is_err());
    }
}
