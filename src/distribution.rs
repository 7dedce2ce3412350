use crate::types::{Clinic, CountryScope};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClinicDistribution {
    pub countries_covered: usize,
    pub clinics_by_country: Vec<LabelCount>,
    pub availability: Vec<LabelCount>,
    pub clinicians: Vec<LabelCount>,
}

pub fn available_countries(clinics: &[Clinic]) -> Vec<String> {
    let countries: BTreeSet<&str> = clinics.iter().map(|c| c.country.as_str()).collect();
    countries.into_iter().map(str::to_string).collect()
}

pub fn clinic_distribution(clinics: &[Clinic], scope: &CountryScope) -> ClinicDistribution {
    let scoped: Vec<&Clinic> = clinics.iter().filter(|c| scope.includes(&c.country)).collect();

    let clinics_by_country = count_by(&scoped, |c| c.country.clone());
    let available = scoped.iter().filter(|c| c.offers_treatment()).count();

    ClinicDistribution {
        countries_covered: clinics_by_country.len(),
        clinics_by_country,
        availability: vec![
            LabelCount { label: "Available".to_string(), count: available },
            LabelCount { label: "Not Available".to_string(), count: scoped.len() - available },
        ],
        clinicians: count_by(&scoped, |c| c.clinicians.clone()),
    }
}

/// Largest count first, ties broken by label.
fn count_by(clinics: &[&Clinic], key: impl Fn(&Clinic) -> String) -> Vec<LabelCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for clinic in clinics {
        *counts.entry(key(*clinic)).or_default() += 1;
    }
    let mut counts: Vec<LabelCount> = counts.into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TreatmentAvailability;
    use geo::Point;

    fn clinic(country: &str, clinicians: &str, treatment: TreatmentAvailability) -> Clinic {
        Clinic {
            country: country.to_string(),
            location: Point::new(0.0, 0.0),
            city: String::new(),
            address: String::new(),
            clinicians: clinicians.to_string(),
            treatment,
        }
    }

    fn sample() -> Vec<Clinic> {
        use TreatmentAvailability::*;
        vec![
            clinic("Uganda", "1-2", Available),
            clinic("Kenya", "1-2", NotAvailable),
            clinic("Uganda", "3-5", Unknown),
            clinic("Malawi", "1-2", Available),
            clinic("Uganda", "1-2", Available),
        ]
    }

    #[test]
    fn countries_sorted_and_unique() {
        assert_eq!(available_countries(&sample()), vec!["Kenya", "Malawi", "Uganda"]);
    }

    #[test]
    fn distribution_across_all_countries() {
        let dist = clinic_distribution(&sample(), &CountryScope::All);
        assert_eq!(dist.countries_covered, 3);
        assert_eq!(dist.clinics_by_country[0], LabelCount { label: "Uganda".into(), count: 3 });
        assert_eq!(dist.clinics_by_country[1].label, "Kenya");
        assert_eq!(dist.availability[0].count, 3);
        assert_eq!(dist.availability[1].count, 2);
        assert_eq!(dist.clinicians[0], LabelCount { label: "1-2".into(), count: 4 });
    }

    #[test]
    fn unknown_availability_counts_as_not_available() {
        let dist = clinic_distribution(&sample(), &CountryScope::Country("Uganda".into()));
        assert_eq!(dist.countries_covered, 1);
        assert_eq!(dist.availability[0].count, 2);
        assert_eq!(dist.availability[1].count, 1);
    }
}
