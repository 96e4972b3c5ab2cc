use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::ContinentCatalog;
use crate::views::HIGH_HDI_THRESHOLD;

// ---------------------------------------------------------------------------
// View / output selection
// ---------------------------------------------------------------------------

/// Which dashboard page to prepare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    /// Every page, in dashboard order.
    #[default]
    Overview,
    Exploration,
    Statistics,
    Distribution,
    TimeSeries,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Overview,
        View::Exploration,
        View::Statistics,
        View::Distribution,
        View::TimeSeries,
    ];

    pub fn name(self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::Exploration => "exploration",
            View::Statistics => "statistics",
            View::Distribution => "distribution",
            View::TimeSeries => "time-series",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase().replace('_', "-");
        View::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = View::ALL.iter().map(|v| v.name()).collect();
                format!("unknown view '{s}', expected one of: {}", names.join(", "))
            })
    }
}

/// How result tables are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ASCII grids.
    #[default]
    Table,
    /// One JSON document of record arrays.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown format '{other}', expected table or json")),
        }
    }
}

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

/// Settings read from a JSON file. Every field is optional.
///
/// ```json
/// {
///   "high_hdi_threshold": 0.8,
///   "view": "statistics",
///   "format": "json",
///   "continent_order": ["Europe", "Asia", "Africa"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub high_hdi_threshold: f64,
    pub view: View,
    pub format: OutputFormat,
    /// Replaces the standard continent order when set.
    pub continent_order: Option<Vec<String>>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            high_hdi_threshold: HIGH_HDI_THRESHOLD,
            view: View::default(),
            format: OutputFormat::default(),
            continent_order: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: DashboardConfig = serde_json::from_str(text).context("parsing config")?;
        if !(0.0..=1.0).contains(&config.high_hdi_threshold) {
            anyhow::bail!(
                "high_hdi_threshold must be within [0, 1], got {}",
                config.high_hdi_threshold
            );
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// The continent catalog these settings describe.
    pub fn catalog(&self) -> Result<ContinentCatalog> {
        match &self.continent_order {
            Some(order) => Ok(ContinentCatalog::from_names(order.iter().cloned())?),
            None => Ok(ContinentCatalog::standard()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = DashboardConfig::from_json("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.catalog().unwrap(), ContinentCatalog::standard());
    }

    #[test]
    fn test_full_config() {
        let config = DashboardConfig::from_json(
            r#"{"high_hdi_threshold": 0.7, "view": "time-series", "format": "json",
                "continent_order": ["Europe", "Asia"]}"#,
        )
        .unwrap();
        assert_eq!(config.view, View::TimeSeries);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.catalog().unwrap().position("Asia"), Some(1));
    }

    #[test]
    fn test_rejects_unknown_fields_and_bad_threshold() {
        assert!(DashboardConfig::from_json(r#"{"colour": "red"}"#).is_err());
        assert!(DashboardConfig::from_json(r#"{"high_hdi_threshold": 3.0}"#).is_err());
    }

    #[test]
    fn test_view_parse() {
        assert_eq!("time_series".parse::<View>().unwrap(), View::TimeSeries);
        assert_eq!("Statistics".parse::<View>().unwrap(), View::Statistics);
        assert!("sunburst".parse::<View>().is_err());
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    }
}
