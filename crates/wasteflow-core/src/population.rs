//! Randomized building and truck parameters.
//!
//! Building rates are drawn uniformly in hundredths (two decimal places),
//! building and truck capacities uniformly in whole units, truck speeds
//! uniformly in sub-steps. Every draw comes from the world's single RNG, so
//! a seed fixes the whole population.

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use wasteflow_agents::CollectorParams;
use wasteflow_world::SourceParams;

use crate::config::{BuildingConfig, TruckConfig};

/// Draw parameters for one building.
pub fn sample_source_params<R: Rng + ?Sized>(cfg: &BuildingConfig, rng: &mut R) -> SourceParams {
    let capacity = Decimal::from(rng.random_range(cfg.capacity_min..=cfg.capacity_max));
    SourceParams {
        capacity,
        generation_rate: sample_rate(cfg.rate_min, cfg.rate_max, rng),
        pickup_threshold_pct: cfg.pickup_threshold_pct,
    }
}

/// Draw parameters for one truck.
pub fn sample_collector_params<R: Rng + ?Sized>(cfg: &TruckConfig, rng: &mut R) -> CollectorParams {
    CollectorParams {
        capacity: Decimal::from(rng.random_range(cfg.capacity_min..=cfg.capacity_max)),
        speed: rng.random_range(cfg.speed_min..=cfg.speed_max),
    }
}

/// A rate in `[min, max]` with two decimal places. Falls back to `min` when
/// the range holds no two-decimal value.
fn sample_rate<R: Rng + ?Sized>(min: Decimal, max: Decimal, rng: &mut R) -> Decimal {
    let lo = min.saturating_mul(Decimal::ONE_HUNDRED).ceil().to_i64();
    let hi = max.saturating_mul(Decimal::ONE_HUNDRED).floor().to_i64();
    match (lo, hi) {
        (Some(lo), Some(hi)) if lo <= hi => Decimal::new(rng.random_range(lo..=hi), 2),
        _ => min,
    }
}
