use geo::Point;
use serde::Serialize;

/// Whether a clinic offers Ponseti treatment. Blank cells load as `Unknown`,
/// which counts as not offering treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentAvailability {
    Available,
    NotAvailable,
    Unknown,
}

impl TreatmentAvailability {
    pub fn is_available(self) -> bool {
        self == TreatmentAvailability::Available
    }
}

#[derive(Debug, Clone)]
pub struct Clinic {
    pub country: String,
    // x = longitude, y = latitude
    pub location: Point<f64>,
    pub city: String,
    pub address: String,
    pub clinicians: String,
    pub treatment: TreatmentAvailability,
}

impl Clinic {
    pub fn offers_treatment(&self) -> bool {
        self.treatment.is_available()
    }
}

/// A unique patient coordinate with the number of patients recorded there.
#[derive(Debug, Clone)]
pub struct PatientLocation {
    pub country: String,
    pub location: Point<f64>,
    pub patient_count: u32,
}

pub const AGE_BANDS: [&str; 8] = [
    "0-1 years",
    "1-2 years",
    "2-3 years",
    "3-4 years",
    "4-5 years",
    "5-10 years",
    "10-15 years",
    "15+ years",
];

#[derive(Debug, Clone, Default)]
pub struct TreatmentRecord {
    pub country: String,
    pub year: i32,
    pub region: Option<String>,
    pub who_region: Option<String>,
    pub income_group: Option<String>,
    pub total_new: f64,
    pub expected_cases: f64,
    pub started_1yr_fab: f64,
    pub completed_2yr_fab: f64,
    pub completed_4yr_fab: f64,
    pub age_bands: [f64; 8],
}

/// Which clinics a computation looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryScope {
    All,
    Country(String),
}

impl CountryScope {
    /// `None`, blank or "All Countries" select everything.
    pub fn from_selection(selection: Option<&str>) -> Self {
        match selection.map(str::trim) {
            None | Some("") => CountryScope::All,
            Some(s) if s.eq_ignore_ascii_case("all countries") || s.eq_ignore_ascii_case("all") => {
                CountryScope::All
            }
            Some(s) => CountryScope::Country(s.to_string()),
        }
    }

    pub fn includes(&self, country: &str) -> bool {
        match self {
            CountryScope::All => true,
            CountryScope::Country(c) => c == country,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, CountryScope::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CoverageMetrics {
    pub total_clinics: usize,
    pub treatment_clinics: usize,
    /// Composite coverage score in percent, one decimal.
    pub coverage_rate: f64,
    pub total_patients: u64,
}
