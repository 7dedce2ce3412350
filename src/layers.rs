//! Map layers for the clinic coverage map, encoded as GeoJSON so the browser
//! side only has to style them.

use crate::types::{Clinic, CountryScope, PatientLocation};
use geo::{Centroid, MultiPoint, Point};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use serde_json::json;

const AVAILABLE_COLOR: &str = "green";
const UNAVAILABLE_COLOR: &str = "red";
const PATIENT_COLOR: &str = "blue";

#[derive(Debug, Clone, Serialize)]
pub struct MapLayer {
    pub name: &'static str,
    pub features: FeatureCollection,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageMap {
    /// [lat, lon]
    pub center: [f64; 2],
    pub zoom: u8,
    pub radius_km: u32,
    pub layers: Vec<MapLayer>,
}

/// `None` when no clinic falls inside the scope.
pub fn build_coverage_map(
    clinics: &[Clinic],
    patients: &[PatientLocation],
    scope: &CountryScope,
    radius_km: u32,
) -> Option<CoverageMap> {
    let scoped: Vec<&Clinic> = clinics.iter().filter(|c| scope.includes(&c.country)).collect();
    let center = MultiPoint::new(scoped.iter().map(|c| c.location).collect()).centroid()?;

    let mut all_clinics = Vec::with_capacity(scoped.len());
    let mut treatment_clinics = Vec::new();
    let mut coverage_areas = Vec::with_capacity(scoped.len());

    for clinic in &scoped {
        let marker = clinic_marker(clinic);
        if clinic.offers_treatment() {
            treatment_clinics.push(marker.clone());
        }
        all_clinics.push(marker);
        coverage_areas.push(coverage_circle(clinic, radius_km));
    }

    // Patient density only makes sense at country zoom.
    let density = match scope {
        CountryScope::All => Vec::new(),
        CountryScope::Country(_) => patients.iter()
            .filter(|p| scope.includes(&p.country))
            .map(patient_point)
            .collect(),
    };

    Some(CoverageMap {
        center: [center.y(), center.x()],
        zoom: if scope.is_all() { 4 } else { 6 },
        radius_km,
        layers: vec![
            layer("All Clinics", all_clinics),
            layer("Ponseti Clinics Only", treatment_clinics),
            layer("Coverage Areas", coverage_areas),
            layer("Patient Density", density),
        ],
    })
}

fn layer(name: &'static str, features: Vec<Feature>) -> MapLayer {
    MapLayer {
        name,
        features: FeatureCollection { bbox: None, features, foreign_members: None },
    }
}

fn point_feature(point: Point<f64>, properties: serde_json::Value) -> Feature {
    let properties: Option<JsonObject> = match properties {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    };
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::from(&point))),
        id: None,
        properties,
        foreign_members: None,
    }
}

fn clinic_color(clinic: &Clinic) -> &'static str {
    if clinic.offers_treatment() { AVAILABLE_COLOR } else { UNAVAILABLE_COLOR }
}

fn clinic_marker(clinic: &Clinic) -> Feature {
    point_feature(clinic.location, json!({
        "kind": "clinic",
        "color": clinic_color(clinic),
        "country": clinic.country,
        "city": clinic.city,
        "address": clinic.address,
        "clinicians": clinic.clinicians,
        "treatment": clinic.treatment,
        "popup": clinic_popup(clinic),
    }))
}

fn coverage_circle(clinic: &Clinic, radius_km: u32) -> Feature {
    point_feature(clinic.location, json!({
        "kind": "coverage",
        "color": clinic_color(clinic),
        "radius_m": f64::from(radius_km) * 1000.0,
    }))
}

fn patient_point(patient: &PatientLocation) -> Feature {
    point_feature(patient.location, json!({
        "kind": "patients",
        "color": PATIENT_COLOR,
        "weight": patient.patient_count,
        "popup": format!("Patients at this location: {}", patient.patient_count),
    }))
}

fn clinic_popup(clinic: &Clinic) -> String {
    format!(
        "<h4>{city}, {country}</h4><hr><b>Location:</b><br>{address}<br><br>\
         <b>Ponseti Treatment:</b> {treatment}<br><b>Clinicians Available:</b> {clinicians}",
        city = escape_html(&clinic.city),
        country = escape_html(&clinic.country),
        address = escape_html(&clinic.address),
        treatment = if clinic.offers_treatment() { "Available" } else { "Not Available" },
        clinicians = escape_html(&clinic.clinicians),
    )
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
