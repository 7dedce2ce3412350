use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result, anyhow};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub coverage: CoverageConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub clinics_csv: PathBuf,
    pub patients_csv: Option<PathBuf>,
    pub treatment_csv: Option<PathBuf>,
}

/// Tuning for the dispersion part of the coverage rate.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CoverageConfig {
    /// Treatment clinics above this count are sampled down to it.
    pub sample_size: usize,
    pub sample_seed: u64,
    /// How many following (or nearest) clinics each clinic is measured against.
    pub neighbor_window: usize,
    /// Kilometres of summed distance per clinic that count as full dispersion.
    pub distance_scale_km: f64,
    pub neighbor_strategy: NeighborStrategy,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            sample_size: 50,
            sample_seed: 42,
            neighbor_window: 10,
            distance_scale_km: 100.0,
            neighbor_strategy: NeighborStrategy::IndexWindow,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NeighborStrategy {
    /// The next `neighbor_window` clinics in list order.
    #[default]
    IndexWindow,
    /// The `neighbor_window` spatially closest clinics.
    Nearest,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub coverage_radius_km: u32,
    pub min_radius_km: u32,
    pub max_radius_km: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            coverage_radius_km: 50,
            min_radius_km: 10,
            max_radius_km: 200,
        }
    }
}

impl MapConfig {
    pub fn clamp_radius(&self, requested: Option<u32>) -> u32 {
        // Inverted limits resolve to max_radius_km.
        requested
            .unwrap_or(self.coverage_radius_km)
            .max(self.min_radius_km)
            .min(self.max_radius_km)
    }

    fn validate(&self) -> Result<()> {
        if self.min_radius_km > self.max_radius_km {
            return Err(anyhow!(
                "map.min_radius_km ({}) is greater than map.max_radius_km ({})",
                self.min_radius_km,
                self.max_radius_km
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub chart_dir: PathBuf,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            chart_dir: PathBuf::from("output/charts"),
            chart_width: 800,
            chart_height: 400,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8501 }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        config.map.validate()
            .with_context(|| format!("Invalid configuration in {:?}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [input]
            clinics_csv = "data/clinics.csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.input.clinics_csv, PathBuf::from("data/clinics.csv"));
        assert!(config.input.patients_csv.is_none());
        assert_eq!(config.coverage.sample_size, 50);
        assert_eq!(config.coverage.sample_seed, 42);
        assert_eq!(config.coverage.neighbor_window, 10);
        assert_eq!(config.coverage.neighbor_strategy, NeighborStrategy::IndexWindow);
        assert_eq!(config.map.coverage_radius_km, 50);
        assert_eq!(config.server.port, 8501);
    }

    #[test]
    fn coverage_section_overrides() {
        let config: AppConfig = toml::from_str(
            r#"
            [input]
            clinics_csv = "c.csv"

            [coverage]
            sample_size = 20
            neighbor_strategy = "nearest"
            "#,
        )
        .unwrap();

        assert_eq!(config.coverage.sample_size, 20);
        assert_eq!(config.coverage.neighbor_window, 10);
        assert_eq!(config.coverage.neighbor_strategy, NeighborStrategy::Nearest);
    }

    #[test]
    fn radius_is_clamped() {
        let map = MapConfig::default();
        assert_eq!(map.clamp_radius(None), 50);
        assert_eq!(map.clamp_radius(Some(5)), 10);
        assert_eq!(map.clamp_radius(Some(500)), 200);
        assert_eq!(map.clamp_radius(Some(120)), 120);
    }

    #[test]
    fn inverted_radius_limits_do_not_panic() {
        let config: AppConfig = toml::from_str(
            "[input]\nclinics_csv = \"c.csv\"\n[map]\nmin_radius_km = 300\n",
        )
        .unwrap();
        assert_eq!(config.map.clamp_radius(Some(50)), 200);
        assert_eq!(config.map.clamp_radius(None), 200);
    }

    #[test]
    fn load_from_file_rejects_inverted_radius_limits() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[input]\nclinics_csv = \"c.csv\"\n[map]\nmin_radius_km = 300").unwrap();

        let err = AppConfig::load_from_file(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("min_radius_km (300)"));
    }

    #[test]
    fn load_from_file_reports_missing_input_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9000").unwrap();

        let err = AppConfig::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }
}
