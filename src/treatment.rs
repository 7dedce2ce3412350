//! Yearly treatment statistics: completion, age bands, progress stages and
//! case coverage against expected incidence.

use crate::types::{CountryScope, TreatmentRecord, AGE_BANDS};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelValue {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeBand {
    pub band: &'static str,
    pub count: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionSummary {
    pub countries: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Everything the treatment tab of the dashboard shows for one scope.
#[derive(Debug, Clone, Serialize)]
pub struct TreatmentAnalysis {
    pub completion_rate_by_year: Vec<YearValue>,
    pub age_distribution: Vec<AgeBand>,
    pub stages: Vec<LabelValue>,
    pub coverage_by_year: Vec<YearValue>,
    pub cases_by_year: Vec<YearValue>,
}

pub fn analyze(records: &[TreatmentRecord], scope: &CountryScope) -> TreatmentAnalysis {
    let scoped = filter_scope(records, scope);
    TreatmentAnalysis {
        completion_rate_by_year: completion_rate_by_year(&scoped),
        age_distribution: age_distribution(&scoped),
        stages: treatment_stages(&scoped),
        coverage_by_year: coverage_by_year(&scoped),
        cases_by_year: cases_by_year(&scoped),
    }
}

pub fn filter_scope<'a>(records: &'a [TreatmentRecord], scope: &CountryScope) -> Vec<&'a TreatmentRecord> {
    records.iter().filter(|r| scope.includes(&r.country)).collect()
}

fn ratio_percent(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator != 0.0).then(|| numerator / denominator * 100.0)
}

fn mean_by_year(values: impl Iterator<Item = (i32, f64)>) -> Vec<YearValue> {
    let mut acc: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for (year, value) in values {
        let entry = acc.entry(year).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    acc.into_iter()
        .map(|(year, (sum, n))| YearValue { year, value: sum / n as f64 })
        .collect()
}

/// Mean per-row share of new children who completed two years of bracing.
/// Rows with no new children count as 0%.
pub fn completion_rate_by_year(records: &[&TreatmentRecord]) -> Vec<YearValue> {
    mean_by_year(records.iter().map(|r| {
        (r.year, ratio_percent(r.completed_2yr_fab, r.total_new).unwrap_or(0.0))
    }))
}

/// Mean per-row treated / expected, skipping rows without an expected count.
pub fn coverage_by_year(records: &[&TreatmentRecord]) -> Vec<YearValue> {
    mean_by_year(records.iter().filter_map(|r| {
        ratio_percent(r.total_new, r.expected_cases).map(|v| (r.year, v))
    }))
}

pub fn cases_by_year(records: &[&TreatmentRecord]) -> Vec<YearValue> {
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for r in records {
        *totals.entry(r.year).or_default() += r.total_new;
    }
    totals.into_iter().map(|(year, value)| YearValue { year, value }).collect()
}

pub fn age_distribution(records: &[&TreatmentRecord]) -> Vec<AgeBand> {
    let mut counts = [0.0; 8];
    for r in records {
        for (total, value) in counts.iter_mut().zip(r.age_bands) {
            *total += value;
        }
    }
    let total: f64 = counts.iter().sum();

    AGE_BANDS.iter().zip(counts)
        .map(|(&band, count)| AgeBand {
            band,
            count,
            percent: ratio_percent(count, total).map(|p| (p * 10.0).round() / 10.0).unwrap_or(0.0),
        })
        .collect()
}

pub fn treatment_stages(records: &[&TreatmentRecord]) -> Vec<LabelValue> {
    let sum = |f: fn(&TreatmentRecord) -> f64| records.iter().map(|r| f(r)).sum::<f64>();
    vec![
        LabelValue { label: "Started Treatment".to_string(), value: sum(|r| r.total_new) },
        LabelValue { label: "Completed 2 Years".to_string(), value: sum(|r| r.completed_2yr_fab) },
        LabelValue { label: "Completed 4 Years".to_string(), value: sum(|r| r.completed_4yr_fab) },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Region,
    WhoRegion,
    IncomeGroup,
}

impl Grouping {
    fn key(self, record: &TreatmentRecord) -> Option<&str> {
        match self {
            Grouping::Region => record.region.as_deref(),
            Grouping::WhoRegion => record.who_region.as_deref(),
            Grouping::IncomeGroup => record.income_group.as_deref(),
        }
    }
}

/// New cases summed per group, largest first. Rows without the group column
/// are left out.
pub fn cases_by_group(records: &[&TreatmentRecord], grouping: Grouping) -> Vec<LabelValue> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for r in records {
        if let Some(key) = grouping.key(r) {
            *totals.entry(key).or_default() += r.total_new;
        }
    }
    let mut groups: Vec<LabelValue> = totals.into_iter()
        .map(|(label, value)| LabelValue { label: label.to_string(), value })
        .collect();
    groups.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
    groups
}

/// Completion from the first to the second bracing year, over rows that
/// report both.
pub fn fab_completion(records: &[&TreatmentRecord]) -> Option<CompletionSummary> {
    let rates: Vec<f64> = records.iter()
        .filter(|r| r.started_1yr_fab > 0.0 && r.completed_2yr_fab > 0.0)
        .map(|r| r.completed_2yr_fab / r.started_1yr_fab * 100.0)
        .collect();
    if rates.is_empty() {
        return None;
    }
    Some(CompletionSummary {
        countries: rates.len(),
        mean: rates.iter().sum::<f64>() / rates.len() as f64,
        min: rates.iter().copied().fold(f64::INFINITY, f64::min),
        max: rates.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(country: &str, year: i32, total_new: f64, expected: f64, completed_2yr: f64) -> TreatmentRecord {
        TreatmentRecord {
            country: country.to_string(),
            year,
            total_new,
            expected_cases: expected,
            completed_2yr_fab: completed_2yr,
            ..TreatmentRecord::default()
        }
    }

    #[test]
    fn completion_rate_averages_rows_per_year() {
        let records = vec![
            record("Uganda", 2019, 100.0, 0.0, 50.0),
            record("Kenya", 2019, 0.0, 0.0, 0.0),
            record("Uganda", 2021, 200.0, 0.0, 150.0),
        ];
        let scoped = filter_scope(&records, &CountryScope::All);
        let rates = completion_rate_by_year(&scoped);
        assert_eq!(rates, vec![
            YearValue { year: 2019, value: 25.0 },
            YearValue { year: 2021, value: 75.0 },
        ]);
    }

    #[test]
    fn coverage_skips_rows_without_expected_cases() {
        let records = vec![
            record("Uganda", 2019, 50.0, 100.0, 0.0),
            record("Kenya", 2019, 10.0, 0.0, 0.0),
        ];
        let scoped = filter_scope(&records, &CountryScope::All);
        assert_eq!(coverage_by_year(&scoped), vec![YearValue { year: 2019, value: 50.0 }]);
    }

    #[test]
    fn scope_filters_by_country_name() {
        let records = vec![
            record("Uganda", 2019, 50.0, 100.0, 0.0),
            record("Kenya", 2019, 10.0, 20.0, 0.0),
        ];
        let analysis = analyze(&records, &CountryScope::Country("Kenya".into()));
        assert_eq!(analysis.cases_by_year, vec![YearValue { year: 2019, value: 10.0 }]);
        assert_eq!(analysis.stages[0].value, 10.0);
    }

    #[test]
    fn age_distribution_in_band_order() {
        let mut a = record("Uganda", 2019, 0.0, 0.0, 0.0);
        a.age_bands = [30.0, 10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let mut b = record("Uganda", 2021, 0.0, 0.0, 0.0);
        b.age_bands = [30.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 30.0];

        let bands = age_distribution(&[&a, &b]);
        assert_eq!(bands.len(), 8);
        assert_eq!(bands[0].band, "0-1 years");
        assert_eq!(bands[0].count, 60.0);
        assert_eq!(bands[0].percent, 60.0);
        assert_eq!(bands[1].percent, 10.0);
        assert_eq!(bands[7].band, "15+ years");
        assert_eq!(bands[7].percent, 30.0);
    }

    #[test]
    fn empty_age_distribution_has_zero_percentages() {
        let bands = age_distribution(&[]);
        assert!(bands.iter().all(|b| b.count == 0.0 && b.percent == 0.0));
    }

    #[test]
    fn stages_sum_each_column() {
        let mut a = record("Uganda", 2019, 100.0, 0.0, 60.0);
        a.completed_4yr_fab = 20.0;
        let b = record("Kenya", 2019, 50.0, 0.0, 40.0);
        let stages = treatment_stages(&[&a, &b]);
        let values: Vec<f64> = stages.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![150.0, 100.0, 20.0]);
        assert_eq!(stages[2].label, "Completed 4 Years");
    }

    #[test]
    fn cases_grouped_and_sorted_descending() {
        let mut a = record("Uganda", 2019, 100.0, 0.0, 0.0);
        a.income_group = Some("Low income".into());
        let mut b = record("India", 2019, 300.0, 0.0, 0.0);
        b.income_group = Some("Lower middle income".into());
        let mut c = record("Kenya", 2019, 50.0, 0.0, 0.0);
        c.income_group = Some("Low income".into());
        let d = record("Nowhere", 2019, 999.0, 0.0, 0.0);

        let groups = cases_by_group(&[&a, &b, &c, &d], Grouping::IncomeGroup);
        assert_eq!(groups, vec![
            LabelValue { label: "Lower middle income".into(), value: 300.0 },
            LabelValue { label: "Low income".into(), value: 150.0 },
        ]);
    }

    #[test]
    fn fab_completion_uses_rows_with_both_counts() {
        let mut a = record("Uganda", 2019, 0.0, 0.0, 40.0);
        a.started_1yr_fab = 80.0;
        let mut b = record("Kenya", 2019, 0.0, 0.0, 30.0);
        b.started_1yr_fab = 30.0;
        let mut c = record("India", 2019, 0.0, 0.0, 0.0);
        c.started_1yr_fab = 10.0;

        let summary = fab_completion(&[&a, &b, &c]).unwrap();
        assert_eq!(summary.countries, 2);
        assert_eq!(summary.mean, 75.0);
        assert_eq!(summary.min, 50.0);
        assert_eq!(summary.max, 100.0);

        assert!(fab_completion(&[&c]).is_none());
    }
}
