//! Run settings loaded from TOML.
//!
//! ```
//! use covmob_rs::config::Settings;
//!
//! let settings = Settings::from_toml_str(r#"
//!     [simulation]
//!     infection_rate = 0.3
//!     recovery_rate = 0.1
//!     timeframe = 30
//! "#).unwrap();
//!
//! assert_eq!(settings.simulation.timeframe, 30);
//! ```

use crate::cases::default_start;
use crate::error::CovmobError;
use crate::model::{SirParams, StatePopulations};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Directories of the input archives and the series output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    pub rki: PathBuf,
    pub movement: PathBuf,
    pub population: PathBuf,
    pub admin_population: PathBuf,
    pub output: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            rki: PathBuf::from("data/rki"),
            movement: PathBuf::from("data/movement_tile"),
            population: PathBuf::from("data/population_tile"),
            admin_population: PathBuf::from("data/population_admin"),
            output: PathBuf::from("sir_network.csv"),
        }
    }
}

/// `static` runs a closed SIR per administrative region, `dynamic` exchanges
/// population along the tile movement graphs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    Static,
    #[default]
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub mode: SimulationMode,
    pub infection_rate: f64,
    pub recovery_rate: f64,
    pub timeframe: usize,
    /// First day of the case window, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Only data files whose name contains this key are loaded.
    pub file_key: Option<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mode: SimulationMode::Dynamic,
            infection_rate: 0.3,
            recovery_rate: 0.1,
            timeframe: 100,
            start_date: None,
            file_key: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: DataPaths,
    pub simulation: SimulationConfig,
    /// Overrides the built-in federal state populations.
    pub state_populations: Option<BTreeMap<String, u64>>,
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self, CovmobError> {
        let settings: Settings =
            toml::from_str(s).map_err(|e| CovmobError::ConfigError(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CovmobError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CovmobError::ConfigError(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, CovmobError> {
        toml::to_string(self).map_err(|e| CovmobError::ConfigError(e.to_string()))
    }

    fn validate(&self) -> Result<(), CovmobError> {
        let sim = &self.simulation;
        for (name, rate) in [
            ("infection_rate", sim.infection_rate),
            ("recovery_rate", sim.recovery_rate),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(CovmobError::ConfigError(format!(
                    "{} must be a non-negative number, got {}",
                    name, rate
                )));
            }
        }
        self.start_date()?;
        Ok(())
    }

    pub fn infection_rate(mut self, rate: f64) -> Self {
        self.simulation.infection_rate = rate;
        self
    }

    pub fn recovery_rate(mut self, rate: f64) -> Self {
        self.simulation.recovery_rate = rate;
        self
    }

    pub fn timeframe(mut self, timeframe: usize) -> Self {
        self.simulation.timeframe = timeframe;
        self
    }

    /// Points every input directory below `root`, the output file is kept.
    pub fn data_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let output = std::mem::take(&mut self.paths.output);
        self.paths = DataPaths {
            rki: root.join("rki"),
            movement: root.join("movement_tile"),
            population: root.join("population_tile"),
            admin_population: root.join("population_admin"),
            output,
        };
        self
    }

    pub fn params(&self) -> SirParams {
        SirParams::new(self.simulation.infection_rate, self.simulation.recovery_rate)
    }

    /// Start of the case window, 2020-06-01 when unset.
    pub fn start_date(&self) -> Result<NaiveDate, CovmobError> {
        match &self.simulation.start_date {
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| CovmobError::InvalidDate(s.clone())),
            None => Ok(default_start()),
        }
    }

    pub fn state_populations(&self) -> StatePopulations {
        match &self.state_populations {
            Some(table) => StatePopulations::new(table.clone()),
            None => StatePopulations::germany(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_from_empty_document() -> Result<(), CovmobError> {
        let settings = Settings::from_toml_str("")?;

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.state_populations().len(), 16);
        assert_eq!(settings.start_date()?, default_start());
        Ok(())
    }

    #[test]
    fn test_full_document() -> Result<(), CovmobError> {
        let settings = Settings::from_toml_str(
            r#"
            [paths]
            rki = "/data/rki"

            [simulation]
            mode = "static"
            file_key = "Germany"
            infection_rate = 0.25
            recovery_rate = 0.05
            timeframe = 14
            start_date = "2020-03-01"

            [state_populations]
            Bremen = 681202
            "#,
        )?;

        assert_eq!(settings.paths.rki, PathBuf::from("/data/rki"));
        assert_eq!(settings.paths.movement, PathBuf::from("data/movement_tile"));
        assert_eq!(settings.params(), SirParams::new(0.25, 0.05));
        assert_eq!(settings.simulation.mode, SimulationMode::Static);
        assert_eq!(settings.simulation.file_key.as_deref(), Some("Germany"));
        assert_eq!(settings.start_date()?, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert_eq!(settings.state_populations().get("Bremen")?, 681_202);
        assert!(settings.state_populations().get("Bayern").is_err());
        Ok(())
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            Settings::from_toml_str("[simulation]\ninfection_rate = -1.0"),
            Err(CovmobError::ConfigError(_))
        ));
        assert!(matches!(
            Settings::from_toml_str("[simulation]\nstart_date = \"June\""),
            Err(CovmobError::InvalidDate(_))
        ));
        assert!(matches!(
            Settings::from_toml_str("[simulation]\nmode = \"stochastic\""),
            Err(CovmobError::ConfigError(_))
        ));
        assert!(matches!(
            Settings::from_toml_str("simulation = 3"),
            Err(CovmobError::ConfigError(_))
        ));
    }

    #[test]
    fn test_builder_and_file_roundtrip() -> Result<(), CovmobError> {
        let settings = Settings::default()
            .infection_rate(0.4)
            .recovery_rate(0.2)
            .timeframe(7)
            .data_root("/srv/covid");

        assert_eq!(settings.paths.population, PathBuf::from("/srv/covid/population_tile"));

        let dir = tempdir().map_err(|e| CovmobError::IoError(e.to_string()))?;
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, settings.to_toml_string()?)
            .map_err(|e| CovmobError::IoError(e.to_string()))?;

        assert_eq!(Settings::from_path(&path)?, settings);
        assert!(Settings::from_path(dir.path().join("missing.toml")).is_err());
        Ok(())
    }
}
