//! Configuration management

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// The six cleaned exports the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Traffic,
    Airline,
    Railroad,
    Shipping,
    SupplyChain,
    LastMile,
}

impl Dataset {
    pub const ALL: [Dataset; 6] = [
        Dataset::Traffic,
        Dataset::Airline,
        Dataset::Railroad,
        Dataset::Shipping,
        Dataset::SupplyChain,
        Dataset::LastMile,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Traffic => "traffic",
            Dataset::Airline => "airline",
            Dataset::Railroad => "railroad",
            Dataset::Shipping => "shipping",
            Dataset::SupplyChain => "supply chain",
            Dataset::LastMile => "last mile",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data: DataConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub traffic: String,
    pub airline: String,
    pub railroad: String,
    pub shipping: String,
    pub supply_chain: String,
    pub last_mile: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            traffic: "usa_accidents_traffic_cleaned.csv".to_string(),
            airline: "airline_delay_cause_cleaned.csv".to_string(),
            railroad: "railroad_accident_cleaned.csv".to_string(),
            shipping: "shipping_accidents_cleaned.csv".to_string(),
            supply_chain: "supply_chain_cleaned.csv".to_string(),
            last_mile: "amazon_delivery_cleaned.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Rows shown in the dataset preview (0 hides it)
    pub preview_rows: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { preview_rows: 1000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Layer the TOML file (optional unless given explicitly) under
    /// `DASHBOARD__SECTION__KEY` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let builder = config::Config::builder().add_source(file).add_source(
            config::Environment::with_prefix("DASHBOARD")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?;
        let config: DashboardConfig = settings.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        for dataset in Dataset::ALL {
            if self.file_name(dataset).trim().is_empty() {
                anyhow::bail!("File name for the {} dataset cannot be empty", dataset.name());
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid logging level '{}'. Must be one of: {:?}",
                self.logging.level,
                LOG_LEVELS
            );
        }

        Ok(())
    }

    pub fn file_name(&self, dataset: Dataset) -> &str {
        match dataset {
            Dataset::Traffic => &self.data.traffic,
            Dataset::Airline => &self.data.airline,
            Dataset::Railroad => &self.data.railroad,
            Dataset::Shipping => &self.data.shipping,
            Dataset::SupplyChain => &self.data.supply_chain,
            Dataset::LastMile => &self.data.last_mile,
        }
    }

    pub fn dataset_path(&self, dataset: Dataset) -> PathBuf {
        self.data.dir.join(self.file_name(dataset))
    }

    /// All dataset paths, for cache warm-up.
    pub fn paths(&self) -> Vec<PathBuf> {
        Dataset::ALL.iter().map(|d| self.dataset_path(*d)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_point_at_the_cleaned_exports() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.dataset_path(Dataset::LastMile),
            PathBuf::from("data").join("amazon_delivery_cleaned.csv")
        );
        assert_eq!(config.paths().len(), 6);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[data]\ndir = \"/srv/risk\"\n\n[ui]\npreview_rows = 25\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = DashboardConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.data.dir, PathBuf::from("/srv/risk"));
        assert_eq!(config.data.airline, "airline_delay_cause_cleaned.csv");
        assert_eq!(config.ui.preview_rows, 25);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn rejects_empty_file_names_and_unknown_levels() {
        let mut config = DashboardConfig::default();
        config.data.shipping = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }
}
