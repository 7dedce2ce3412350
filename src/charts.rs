use crate::config::AppConfig;
use crate::data::Dataset;
use crate::distribution::clinic_distribution;
use crate::treatment::{self, filter_scope, Grouping};
use crate::types::{CountryScope, TreatmentRecord};
use anyhow::{Context, Result};
use image::{ImageBuffer, Rgba, RgbaImage};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::Path;

const MARGIN: u32 = 20;
const BAR_GAP: u32 = 4;
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const AXIS: Rgba<u8> = Rgba([44, 62, 80, 255]);

/// One bar chart: what it shows and the values behind each bar.
#[derive(Debug, Clone, Serialize)]
pub struct BarChart {
    pub file: String,
    pub title: String,
    pub color: String,
    pub bars: Vec<(String, f64)>,
}

pub fn build_charts(dataset: &Dataset, scope: &CountryScope) -> Vec<BarChart> {
    let distribution = clinic_distribution(&dataset.clinics, scope);
    let records = filter_scope(&dataset.treatment, scope);

    vec![
        BarChart {
            file: "clinics_by_country.png".to_string(),
            title: "Number of Clinics by Country".to_string(),
            color: "#2980b9".to_string(),
            bars: distribution.clinics_by_country.iter()
                .map(|c| (c.label.clone(), c.count as f64))
                .collect(),
        },
        BarChart {
            file: "age_distribution.png".to_string(),
            title: "Age Distribution of Patients".to_string(),
            color: "#e67e22".to_string(),
            bars: treatment::age_distribution(&records).into_iter()
                .map(|b| (b.band.to_string(), b.count))
                .collect(),
        },
        BarChart {
            file: "cases_by_year.png".to_string(),
            title: "Total Number of Treatment Cases by Year".to_string(),
            color: "#8e44ad".to_string(),
            bars: treatment::cases_by_year(&records).into_iter()
                .map(|y| (y.year.to_string(), y.value))
                .collect(),
        },
        BarChart {
            file: "treatment_stages.png".to_string(),
            title: "Treatment Progress Stages".to_string(),
            color: "#16a085".to_string(),
            bars: treatment::treatment_stages(&records).into_iter()
                .map(|s| (s.label, s.value))
                .collect(),
        },
        BarChart {
            file: "regional_distribution.png".to_string(),
            title: "Treatment Cases by Region".to_string(),
            color: "#2c3e50".to_string(),
            bars: grouped_bars(&records, Grouping::Region),
        },
        BarChart {
            file: "income_group_distribution.png".to_string(),
            title: "Distribution of Cases by Income Group".to_string(),
            color: "#d35400".to_string(),
            bars: grouped_bars(&records, Grouping::IncomeGroup),
        },
    ]
}

fn grouped_bars(records: &[&TreatmentRecord], grouping: Grouping) -> Vec<(String, f64)> {
    treatment::cases_by_group(records, grouping).into_iter()
        .map(|g| (g.label, g.value))
        .collect()
}

/// Writes every chart as a PNG plus an `index.json` describing them.
pub fn generate_charts(config: &AppConfig, dataset: &Dataset) -> Result<Vec<BarChart>> {
    let out_dir = &config.output.chart_dir;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create chart directory: {:?}", out_dir))?;

    let charts = build_charts(dataset, &CountryScope::All);
    let (width, height) = (config.output.chart_width, config.output.chart_height);

    charts.par_iter().try_for_each(|chart| {
        let img = render_bar_chart(&chart.bars, hex_to_rgba(&chart.color), width, height);
        let path = out_dir.join(&chart.file);
        img.save(&path).with_context(|| format!("Failed to save chart {:?}", path))
    })?;

    write_index(out_dir, &charts)?;
    tracing::info!("Wrote {} charts to {:?}", charts.len(), out_dir);
    Ok(charts)
}

fn write_index(out_dir: &Path, charts: &[BarChart]) -> Result<()> {
    let path = out_dir.join("index.json");
    let json = serde_json::to_string_pretty(charts)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))
}

pub fn render_bar_chart(bars: &[(String, f64)], color: Rgba<u8>, width: u32, height: u32) -> RgbaImage {
    let mut img = ImageBuffer::from_pixel(width, height, BACKGROUND);
    if width <= 2 * MARGIN || height <= 2 * MARGIN {
        return img;
    }

    let plot_w = width - 2 * MARGIN;
    let plot_h = height - 2 * MARGIN;
    let baseline = height - MARGIN;

    for x in MARGIN..width - MARGIN {
        img.put_pixel(x, baseline, AXIS);
    }
    for y in MARGIN..=baseline {
        img.put_pixel(MARGIN, y, AXIS);
    }

    let max = bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    if bars.is_empty() || max <= 0.0 {
        return img;
    }

    let slot = plot_w / bars.len() as u32;
    let bar_w = slot.saturating_sub(BAR_GAP).max(1);

    for (i, (_, value)) in bars.iter().enumerate() {
        let bar_h = ((value.max(0.0) / max) * f64::from(plot_h - 1)).round() as u32;
        let x0 = MARGIN + 1 + i as u32 * slot + BAR_GAP / 2;
        for x in x0..(x0 + bar_w).min(width - MARGIN) {
            for y in (baseline - bar_h)..baseline {
                img.put_pixel(x, y, color);
            }
        }
    }

    img
}

fn hex_to_rgba(hex: &str) -> Rgba<u8> {
    let hex = hex.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range).and_then(|s| u8::from_str_radix(s, 16).ok()).unwrap_or(0)
    };
    Rgba([channel(0..2), channel(2..4), channel(4..6), 255])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(hex_to_rgba("#2980b9"), Rgba([0x29, 0x80, 0xb9, 255]));
        assert_eq!(hex_to_rgba("zz"), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn tallest_bar_fills_plot_height() {
        let color = Rgba([255, 0, 0, 255]);
        let bars = vec![("a".to_string(), 10.0), ("b".to_string(), 5.0)];
        let img = render_bar_chart(&bars, color, 200, 140);

        let baseline = 140 - MARGIN;
        let first_x = MARGIN + 1 + BAR_GAP / 2;
        assert_eq!(*img.get_pixel(first_x, baseline - 1), color);
        assert_eq!(*img.get_pixel(first_x, MARGIN + 1), color);

        let second_x = first_x + (200 - 2 * MARGIN) / 2;
        assert_eq!(*img.get_pixel(second_x, baseline - 1), color);
        assert_eq!(*img.get_pixel(second_x, MARGIN + 2), BACKGROUND);
    }

    #[test]
    fn empty_chart_is_just_axes() {
        let img = render_bar_chart(&[], Rgba([255, 0, 0, 255]), 100, 100);
        assert_eq!(*img.get_pixel(MARGIN, 50), AXIS);
        assert_eq!(*img.get_pixel(50, 50), BACKGROUND);
    }

    #[test]
    fn generate_writes_pngs_and_index() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config: AppConfig = toml::from_str("[input]\nclinics_csv = \"unused.csv\"\n").unwrap();
        config.output.chart_dir = dir.path().join("charts");

        let charts = generate_charts(&config, &Dataset::default()).unwrap();
        assert_eq!(charts.len(), 6);
        for chart in &charts {
            assert!(config.output.chart_dir.join(&chart.file).exists());
        }
        let index = fs::read_to_string(config.output.chart_dir.join("index.json")).unwrap();
        assert!(index.contains("Treatment Progress Stages"));
        assert!(config.output.chart_dir.join("regional_distribution.png").exists());
        assert!(config.output.chart_dir.join("income_group_distribution.png").exists());
    }

    #[test]
    fn region_and_income_charts_sum_new_cases() {
        let record = |country: &str, region: &str, income: &str, total_new: f64| TreatmentRecord {
            country: country.to_string(),
            year: 2020,
            region: Some(region.to_string()),
            income_group: Some(income.to_string()),
            total_new,
            ..TreatmentRecord::default()
        };
        let dataset = Dataset {
            treatment: vec![
                record("Uganda", "East Africa", "Low income", 120.0),
                record("Kenya", "East Africa", "Lower middle income", 80.0),
                record("Peru", "South America", "Upper middle income", 50.0),
            ],
            ..Dataset::default()
        };

        let charts = build_charts(&dataset, &CountryScope::All);
        let region = charts.iter().find(|c| c.file == "regional_distribution.png").unwrap();
        assert_eq!(region.bars, vec![
            ("East Africa".to_string(), 200.0),
            ("South America".to_string(), 50.0),
        ]);

        let income = charts.iter().find(|c| c.file == "income_group_distribution.png").unwrap();
        assert_eq!(income.bars[0], ("Low income".to_string(), 120.0));
        assert_eq!(income.bars.len(), 3);

        let scoped = build_charts(&dataset, &CountryScope::Country("Peru".to_string()));
        let region = scoped.iter().find(|c| c.file == "regional_distribution.png").unwrap();
        assert_eq!(region.bars, vec![("South America".to_string(), 50.0)]);
    }
}
