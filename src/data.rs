use crate::config::AppConfig;
use crate::types::{Clinic, PatientLocation, TreatmentAvailability, TreatmentRecord, AGE_BANDS};
use anyhow::{Context, Result, anyhow};
use csv::{ReaderBuilder, StringRecord};
use geo::Point;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Everything the dashboard renders from. Read-only after load.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub clinics: Vec<Clinic>,
    pub patients: Vec<PatientLocation>,
    pub treatment: Vec<TreatmentRecord>,
}

pub fn load_data(config: &AppConfig) -> Result<Dataset> {
    tracing::info!("Loading data...");

    let clinics = load_clinics(&config.input.clinics_csv)?;
    tracing::info!("Loaded {} clinics", clinics.len());

    let patients = match &config.input.patients_csv {
        Some(path) => load_patients(path)?,
        None => Vec::new(),
    };
    tracing::info!("Loaded {} unique patient locations", patients.len());

    let treatment = match &config.input.treatment_csv {
        Some(path) => load_treatment(path)?,
        None => Vec::new(),
    };
    tracing::info!("Loaded {} treatment records", treatment.len());

    Ok(Dataset { clinics, patients, treatment })
}

fn open_csv(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))
}

pub fn load_clinics(path: &Path) -> Result<Vec<Clinic>> {
    read_clinics(open_csv(path)?).with_context(|| format!("Failed to read clinics from {:?}", path))
}

pub fn load_patients(path: &Path) -> Result<Vec<PatientLocation>> {
    read_patients(open_csv(path)?).with_context(|| format!("Failed to read patients from {:?}", path))
}

pub fn load_treatment(path: &Path) -> Result<Vec<TreatmentRecord>> {
    read_treatment(open_csv(path)?).with_context(|| format!("Failed to read treatment data from {:?}", path))
}

/// Header name to column index.
struct Columns(HashMap<String, usize>);

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        Columns(headers.iter().enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect())
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.0.get(name).copied()
            .ok_or_else(|| anyhow!("Column '{}' not found in CSV", name))
    }

    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.0.get(name)
            .and_then(|&idx| record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

pub fn read_clinics<R: Read>(reader: R) -> Result<Vec<Clinic>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let cols = Columns::new(rdr.headers()?);

    cols.require("clinic_country")?;
    let has_numeric = cols.require("clinic_lat").is_ok() && cols.require("clinic_lon").is_ok();
    if !has_numeric && cols.require("Lat/Long").is_err() {
        return Err(anyhow!("Clinic CSV needs clinic_lat/clinic_lon or a Lat/Long column"));
    }

    let mut clinics = Vec::new();
    let mut dropped = 0usize;

    for result in rdr.records() {
        let record = result?;

        let numeric = match (
            cols.get(&record, "clinic_lat").and_then(parse_coordinate),
            cols.get(&record, "clinic_lon").and_then(parse_coordinate),
        ) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        };
        let coords = numeric.or_else(|| cols.get(&record, "Lat/Long").and_then(parse_lat_long));

        let Some((lat, lon)) = coords else {
            dropped += 1;
            continue;
        };

        clinics.push(Clinic {
            country: cols.get(&record, "clinic_country").unwrap_or("").to_string(),
            location: Point::new(lon, lat),
            city: cols.get(&record, "clinic_city").unwrap_or("City not available").to_string(),
            address: cols.get(&record, "formatted_address").unwrap_or("Address not available").to_string(),
            clinicians: cols.get(&record, "clinicians_available").unwrap_or("Unknown").to_string(),
            treatment: parse_availability(cols.get(&record, "ponseti_treatment_available")),
        });
    }

    if dropped > 0 {
        tracing::warn!("Dropped {} clinic rows without usable coordinates", dropped);
    }

    Ok(clinics)
}

pub fn read_patients<R: Read>(reader: R) -> Result<Vec<PatientLocation>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let cols = Columns::new(rdr.headers()?);
    cols.require("patient_location_lat")?;
    cols.require("patient_location_long")?;
    cols.require("patient_country")?;

    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for result in rdr.records() {
        let record = result?;
        let lat = cols.get(&record, "patient_location_lat").and_then(parse_coordinate);
        let lon = cols.get(&record, "patient_location_long").and_then(parse_coordinate);
        let country = cols.get(&record, "patient_country");

        match (lat, lon, country) {
            (Some(lat), Some(lon), Some(country)) => rows.push((country.to_string(), Point::new(lon, lat))),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::warn!("Dropped {} patient rows without coordinates or country", dropped);
    }

    Ok(group_patient_locations(rows))
}

/// Collapses identical (country, coordinate) rows into one weighted location,
/// keeping first-seen order.
pub fn group_patient_locations(rows: Vec<(String, Point<f64>)>) -> Vec<PatientLocation> {
    let mut index: HashMap<(String, u64, u64), usize> = HashMap::new();
    let mut locations: Vec<PatientLocation> = Vec::new();

    for (country, point) in rows {
        let key = (country.clone(), point.y().to_bits(), point.x().to_bits());
        match index.get(&key) {
            Some(&i) => locations[i].patient_count += 1,
            None => {
                index.insert(key, locations.len());
                locations.push(PatientLocation { country, location: point, patient_count: 1 });
            }
        }
    }

    locations
}

pub fn read_treatment<R: Read>(reader: R) -> Result<Vec<TreatmentRecord>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let cols = Columns::new(rdr.headers()?);
    cols.require("Country Name")?;
    cols.require("YEAR_RECORDED")?;

    let count = |record: &StringRecord, name: &str| cols.get(record, name).map(parse_count).unwrap_or(0.0);
    let text = |record: &StringRecord, name: &str| cols.get(record, name).map(str::to_string);

    let mut records = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let Some(year) = cols.get(&record, "YEAR_RECORDED").and_then(parse_year) else {
            continue;
        };

        let mut age_bands = [0.0; 8];
        for (slot, band) in age_bands.iter_mut().zip(AGE_BANDS) {
            *slot = count(&record, band);
        }

        records.push(TreatmentRecord {
            country: cols.get(&record, "Country Name").unwrap_or("").to_string(),
            year,
            region: text(&record, "Region"),
            who_region: text(&record, "WHO Region"),
            income_group: text(&record, "Income Group"),
            total_new: count(&record, "Total new children treated"),
            expected_cases: count(&record, "Expected number of clubfoot cases"),
            started_1yr_fab: count(&record, "number children started 1yr FAB"),
            completed_2yr_fab: count(&record, "number of children completed 2 years FAB"),
            completed_4yr_fab: count(&record, "NUMBER_OF_CHILDREN_COMPLETED_4_YEARS_FAB"),
            age_bands,
        });
    }

    Ok(records)
}

pub fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts `POINT (lon lat)` or `lat, lon`. Returns (lat, lon).
pub fn parse_lat_long(raw: &str) -> Option<(f64, f64)> {
    let raw = raw.trim();
    if let Some(inner) = raw.strip_prefix("POINT") {
        let inner = inner.trim().trim_start_matches('(').trim_end_matches(')');
        let mut parts = inner.split_whitespace();
        let lon = parse_coordinate(parts.next()?)?;
        let lat = parse_coordinate(parts.next()?)?;
        return Some((lat, lon));
    }
    let (lat, lon) = raw.split_once(',')?;
    Some((parse_coordinate(lat)?, parse_coordinate(lon)?))
}

pub fn parse_availability(raw: Option<&str>) -> TreatmentAvailability {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        None => TreatmentAvailability::Unknown,
        Some("true" | "yes" | "1" | "1.0" | "y") => TreatmentAvailability::Available,
        Some("false" | "no" | "0" | "0.0" | "n") => TreatmentAvailability::NotAvailable,
        Some(_) => TreatmentAvailability::Unknown,
    }
}

fn parse_count(raw: &str) -> f64 {
    raw.replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn parse_year(raw: &str) -> Option<i32> {
    raw.parse::<i32>().ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|v| v.fract() == 0.0).map(|v| v as i32))
}
