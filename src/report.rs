//! Plain-text summaries printed by the `metrics` and `analyze` commands.

use crate::coverage::CountryMetrics;
use crate::data::Dataset;
use crate::distribution::clinic_distribution;
use crate::treatment::{self, filter_scope, Grouping, LabelValue};
use crate::types::{CountryScope, CoverageMetrics};
use std::fmt::Write;

fn scope_label(scope: &CountryScope) -> &str {
    match scope {
        CountryScope::All => "All Countries",
        CountryScope::Country(c) => c.as_str(),
    }
}

pub fn metrics_report(scope: &CountryScope, metrics: &CoverageMetrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Coverage metrics for {}", scope_label(scope));
    let _ = writeln!(out, "  Total clinics:             {}", metrics.total_clinics);
    let _ = writeln!(out, "  Ponseti treatment clinics: {}", metrics.treatment_clinics);
    let _ = writeln!(out, "  Ponseti coverage rate:     {:.1}%", metrics.coverage_rate);
    let _ = writeln!(out, "  Total patients:            {}", metrics.total_patients);
    out
}

pub fn breakdown_report(rows: &[CountryMetrics]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<32} {:>8} {:>10} {:>9} {:>9}", "Country", "Clinics", "Ponseti", "Rate %", "Patients");
    for row in rows {
        let m = &row.metrics;
        let _ = writeln!(
            out,
            "{:<32} {:>8} {:>10} {:>9.1} {:>9}",
            row.country, m.total_clinics, m.treatment_clinics, m.coverage_rate, m.total_patients
        );
    }
    out
}

fn write_values(out: &mut String, heading: &str, values: &[LabelValue]) {
    let _ = writeln!(out, "\n{}:", heading);
    if values.is_empty() {
        let _ = writeln!(out, "  (no data)");
    }
    for v in values {
        let _ = writeln!(out, "  {:<28} {:>10.0}", v.label, v.value);
    }
}

pub fn analysis_report(dataset: &Dataset, scope: &CountryScope) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Clinic Distribution ({}) ===", scope_label(scope));

    let dist = clinic_distribution(&dataset.clinics, scope);
    let total: usize = dist.clinics_by_country.iter().map(|c| c.count).sum();
    let _ = writeln!(out, "Total number of clinics: {}", total);
    let _ = writeln!(out, "Number of countries covered: {}", dist.countries_covered);
    let _ = writeln!(out, "Number of clinics with Ponseti treatment: {}", dist.availability[0].count);
    let _ = writeln!(out, "\nClinician distribution:");
    for c in &dist.clinicians {
        let _ = writeln!(out, "  {}: {} clinics", c.label, c.count);
    }

    let records = filter_scope(&dataset.treatment, scope);
    let _ = writeln!(out, "\n=== Treatment Cases ===");
    let _ = writeln!(out, "Records: {}", records.len());

    let yearly: Vec<LabelValue> = treatment::cases_by_year(&records).into_iter()
        .map(|y| LabelValue { label: y.year.to_string(), value: y.value })
        .collect();
    write_values(&mut out, "Total cases per year", &yearly);
    write_values(&mut out, "Total cases by region", &treatment::cases_by_group(&records, Grouping::Region));
    write_values(&mut out, "Total cases by WHO region", &treatment::cases_by_group(&records, Grouping::WhoRegion));
    write_values(&mut out, "Total cases by income group", &treatment::cases_by_group(&records, Grouping::IncomeGroup));

    let _ = writeln!(out, "\nAge distribution of cases:");
    for band in treatment::age_distribution(&records) {
        let _ = writeln!(out, "  {:<12} {:>8.0} ({:.1}%)", band.band, band.count, band.percent);
    }

    let _ = writeln!(out, "\nCoverage rate by year (treated / expected):");
    for y in treatment::coverage_by_year(&records) {
        let _ = writeln!(out, "  {}: {:.1}%", y.year, y.value);
    }

    match treatment::fab_completion(&records) {
        Some(s) => {
            let _ = writeln!(
                out,
                "\nFAB completion (1yr -> 2yr) over {} rows: mean {:.1}%, min {:.1}%, max {:.1}%",
                s.countries, s.mean, s.min, s.max
            );
        }
        None => {
            let _ = writeln!(out, "\nFAB completion: no rows report both years");
        }
    }

    out
}
