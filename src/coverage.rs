//! Ponseti coverage rate.
//!
//! The rate is `base_rate × dispersion`: the share of clinics offering
//! treatment, scaled down when those clinics sit close together. It is a
//! heuristic score, not a statistical estimate.

use crate::config::CoverageConfig;
use crate::data::Dataset;
use crate::neighbors::neighbor_distance_sum;
use crate::types::{Clinic, CountryScope, CoverageMetrics, PatientLocation};
use geo::Point;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

pub fn calculate_metrics(
    clinics: &[Clinic],
    patients: &[PatientLocation],
    scope: &CountryScope,
    config: &CoverageConfig,
) -> CoverageMetrics {
    let scoped: Vec<&Clinic> = clinics.iter().filter(|c| scope.includes(&c.country)).collect();
    let total_patients = patients.iter()
        .filter(|p| scope.includes(&p.country))
        .map(|p| u64::from(p.patient_count))
        .sum();

    let total_clinics = scoped.len();
    let treatment_clinics = scoped.iter().filter(|c| c.offers_treatment()).count();

    if total_clinics == 0 {
        return CoverageMetrics { total_patients, ..CoverageMetrics::default() };
    }

    let base = base_rate(treatment_clinics, total_clinics);
    let factor = if scope.is_all() {
        country_presence_factor(&scoped)
    } else {
        let points: Vec<Point<f64>> = scoped.iter()
            .filter(|c| c.offers_treatment())
            .map(|c| c.location)
            .collect();
        dispersion_factor(&points, config)
    };

    CoverageMetrics {
        total_clinics,
        treatment_clinics,
        coverage_rate: round1(base * factor),
        total_patients,
    }
}

pub fn base_rate(treatment_clinics: usize, total_clinics: usize) -> f64 {
    if total_clinics == 0 {
        return 0.0;
    }
    treatment_clinics as f64 / total_clinics as f64 * 100.0
}

/// Share of countries that have at least one treatment clinic.
fn country_presence_factor(clinics: &[&Clinic]) -> f64 {
    let countries: HashSet<&str> = clinics.iter().map(|c| c.country.as_str()).collect();
    if countries.is_empty() {
        return 0.0;
    }
    let with_treatment: HashSet<&str> = clinics.iter()
        .filter(|c| c.offers_treatment())
        .map(|c| c.country.as_str())
        .collect();
    with_treatment.len() as f64 / countries.len() as f64
}

/// Geographic spread of treatment clinics in `[0, 1]`.
pub fn dispersion_factor(points: &[Point<f64>], config: &CoverageConfig) -> f64 {
    let n = points.len();
    match n {
        0 => return 0.0,
        1 => return 1.0,
        _ => {}
    }

    let sampled = sample_points(points, config.sample_size, config.sample_seed);
    let total = neighbor_distance_sum(&sampled, config.neighbor_window, config.neighbor_strategy);
    let denominator = config.distance_scale_km * n.min(config.sample_size) as f64;
    if denominator <= 0.0 {
        return 0.0;
    }
    (total / denominator).min(1.0)
}

/// Seeded uniform sample without replacement, in draw order. Returns the
/// input unchanged when it already fits.
pub fn sample_points(points: &[Point<f64>], sample_size: usize, seed: u64) -> Vec<Point<f64>> {
    if points.len() <= sample_size {
        return points.to_vec();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    index::sample(&mut rng, points.len(), sample_size)
        .into_iter()
        .map(|i| points[i])
        .collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Serialize)]
pub struct CountryMetrics {
    pub country: String,
    #[serde(flatten)]
    pub metrics: CoverageMetrics,
}

/// Metrics for every country in the data set, sorted by country name.
pub fn country_breakdown(dataset: &Dataset, config: &CoverageConfig) -> Vec<CountryMetrics> {
    let countries: BTreeSet<&str> = dataset.clinics.iter().map(|c| c.country.as_str()).collect();
    let countries: Vec<&str> = countries.into_iter().collect();

    countries.par_iter()
        .map(|&country| {
            let scope = CountryScope::Country(country.to_string());
            CountryMetrics {
                country: country.to_string(),
                metrics: calculate_metrics(&dataset.clinics, &dataset.patients, &scope, config),
            }
        })
        .collect()
}
