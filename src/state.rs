use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value as JsonValue};

use crate::catalog::ContinentCatalog;
use crate::config::{DashboardConfig, View};
use crate::data::export::to_json_records;
use crate::data::filter::{distinct_values, select_continents};
use crate::data::model::{Table, Value};
use crate::reshape::YEAR_COLUMN;
use crate::views::{distribution_view, exploration_view, statistics_view, time_series_view};

// ---------------------------------------------------------------------------
// Rendered output
// ---------------------------------------------------------------------------

/// One dashboard page worth of shaped tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    /// Headline figures and insights shown above the charts.
    pub notes: Vec<String>,
    /// `(name, table)` pairs, one per chart.
    pub tables: Vec<(String, Table)>,
}

impl Section {
    fn new(title: String) -> Self {
        Self {
            title,
            notes: Vec::new(),
            tables: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<JsonValue> {
        let mut tables = Map::new();
        for (name, table) in &self.tables {
            tables.insert(name.clone(), to_json_records(table)?);
        }
        Ok(json!({
            "title": self.title,
            "notes": self.notes,
            "tables": tables,
        }))
    }
}

/// `12345.6` → `"12,346"`.
pub fn format_thousands(v: f64) -> String {
    let digits = format!("{:.0}", v.abs());
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if v < 0.0 && digits != "0" {
        out.insert(0, '-');
    }
    out
}

/// Whole-number years of `dataset`, in order of first appearance.
fn dataset_years(dataset: &Table) -> Result<Vec<i64>> {
    let mut years: Vec<i64> = Vec::new();
    for year in distinct_values(dataset, YEAR_COLUMN)?.iter().filter_map(|v| v.as_i64()) {
        if !years.contains(&year) {
            years.push(year);
        }
    }
    Ok(years)
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{v}"))
}

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// The dashboard state, independent of rendering.
pub struct DashboardState {
    /// Loaded dataset, possibly restricted to some continents.
    pub dataset: Table,

    /// Continent order and colors shared by every view.
    pub catalog: ContinentCatalog,

    /// Years present in the dataset, in order of first appearance.
    pub years: Vec<i64>,

    pub selected_year: i64,

    pub view: View,

    pub high_hdi_threshold: f64,
}

impl DashboardState {
    /// Ingest a loaded dataset. The first year in the data is selected.
    pub fn new(dataset: Table, config: &DashboardConfig) -> Result<Self> {
        let years = dataset_years(&dataset)?;
        let Some(&selected_year) = years.first() else {
            bail!("Dataset has no usable years");
        };

        Ok(Self {
            dataset,
            catalog: config.catalog()?,
            years,
            selected_year,
            view: config.view,
            high_hdi_threshold: config.high_hdi_threshold,
        })
    }

    /// Select the year used by the per-year views.
    pub fn set_year(&mut self, year: i64) -> Result<()> {
        if !self.years.contains(&year) {
            bail!("Year {year} not in dataset (available: {:?})", self.years);
        }
        self.selected_year = year;
        Ok(())
    }

    /// Keep only rows of the given continents.
    ///
    /// The available years shrink to those still present; if the selected
    /// year is gone, the first remaining year is selected.
    pub fn restrict_continents(&mut self, continents: &[String]) -> Result<()> {
        if continents.is_empty() {
            return Ok(());
        }
        let dataset = select_continents(&self.dataset, continents.iter().cloned())?;
        let years = dataset_years(&dataset)?;
        let Some(&first) = years.first() else {
            bail!("No rows left for continents {continents:?}");
        };
        if !years.contains(&self.selected_year) {
            self.selected_year = first;
        }
        self.dataset = dataset;
        self.years = years;
        log::info!(
            "Restricted to {continents:?}: {} rows remain",
            self.dataset.len()
        );
        Ok(())
    }

    /// Prepare the tables of the current view.
    pub fn render(&self) -> Result<Vec<Section>> {
        log::debug!("Rendering {} for {}", self.view, self.selected_year);
        match self.view {
            View::Exploration => Ok(vec![self.exploration()?]),
            View::Statistics => Ok(vec![self.statistics()?]),
            View::Distribution => Ok(vec![self.distribution()?]),
            View::TimeSeries => Ok(vec![self.time_series()?]),
            View::Overview => Ok(vec![
                self.exploration()?,
                self.statistics()?,
                self.distribution()?,
                self.time_series()?,
            ]),
        }
    }

    fn exploration(&self) -> Result<Section> {
        let year = self.selected_year;
        let view = exploration_view(&self.dataset, &self.catalog, year, self.high_hdi_threshold)
            .context("preparing data exploration")?;

        let mut section = Section::new(format!("Data Exploration for the year {year}"));
        section.notes.push(format!("Avg GDP: ${}", fmt_opt(view.summary.avg_gdp)));
        section.notes.push(format!(
            "Avg Life Expectancy: {}",
            fmt_opt(view.summary.avg_life_exp)
        ));
        section.notes.push(format!("Avg HDI: {}", fmt_opt(view.summary.avg_hdi)));
        if let Some(insight) = &view.insight {
            section.notes.push(format!(
                "{} has the most countries with very high human development (HDI ≥ {}) with {} countries",
                insight.continent, insight.threshold, insight.count
            ));
        }
        if let Some(avg) = view.avg_gdp_high_hdi {
            section.notes.push(format!(
                "HDI ≥ {} indicates very high human development (Avg GDP: ${avg:.0})",
                self.high_hdi_threshold
            ));
        }
        section.tables.push((
            "gdp_vs_life_exp".into(),
            view.scatter
                .project(&["continent", "country", "gdp", "life_exp", "hdi_index"])?,
        ));
        Ok(section)
    }

    fn statistics(&self) -> Result<Section> {
        let year = self.selected_year;
        let view = statistics_view(&self.dataset, &self.catalog, year)
            .context("preparing statistical analysis")?;

        let mut section = Section::new(format!("Statistical Analysis for the year {year}"));
        section.tables.push((
            "life_exp_by_continent".into(),
            view.life_exp_box.project(&["continent", "country", "life_exp"])?,
        ));
        section
            .tables
            .push(("avg_co2_by_continent".into(), view.co2_by_continent));
        section.tables.push((
            "gdp_by_continent".into(),
            view.gdp_box.project(&["continent", "country", "gdp"])?,
        ));
        section
            .tables
            .push(("avg_hdi_by_continent".into(), view.hdi_by_continent));
        Ok(section)
    }

    fn distribution(&self) -> Result<Section> {
        let year = self.selected_year;
        let view = distribution_view(&self.dataset, &self.catalog, year)
            .context("preparing GDP distribution")?;

        let mut section = Section::new(format!(
            "Global GDP Distribution by Region and Country for the year {year}"
        ));
        for row in 0..view.top_gdp.len() {
            let (Some(continent), Some(country), Some(gdp)) = (
                view.top_gdp.value(row, "continent"),
                view.top_gdp.value(row, "country"),
                view.top_gdp.value(row, "gdp").and_then(|v| v.as_f64()),
            ) else {
                continue;
            };
            section.notes.push(format!(
                "Highest GDP in {continent}: {country} (${})",
                format_thousands(gdp)
            ));
        }
        section.tables.push((
            "highest_gdp_by_continent".into(),
            view.top_gdp.project(&["continent", "country", "gdp"])?,
        ));
        section.tables.push((
            "gdp_sunburst".into(),
            view.sunburst
                .project(&["continent", "country", "gdp", "continent_percentage"])?,
        ));
        Ok(section)
    }

    fn time_series(&self) -> Result<Section> {
        let view = time_series_view(&self.dataset, &self.catalog)
            .context("preparing development time series")?;

        let title = match view.year_range {
            Some((first, last)) => {
                format!("Development Time Series from {first} to {last} by continent")
            }
            None => "Development Time Series by continent".to_string(),
        };
        let mut section = Section::new(title);
        section
            .notes
            .push("Time series are not filtered by year; every year is shown.".into());
        for (metric, table) in view.series {
            section.tables.push((format!("{metric}_time_series"), table));
        }
        section
            .tables
            .push(("continent_colors".into(), self.legend_table()?));
        Ok(section)
    }

    /// Catalog colors, so every chart draws a continent the same way.
    fn legend_table(&self) -> Result<Table> {
        let rows = self
            .catalog
            .legend_entries()
            .into_iter()
            .map(|(name, hex)| vec![Value::from(name), Value::from(hex)])
            .collect();
        Ok(Table::from_rows(["continent", "color"], rows)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Observation;

    fn obs(country: &str, continent: &str, year: i64, gdp: f64) -> Observation {
        Observation {
            country: country.into(),
            continent: continent.into(),
            year,
            life_exp: 60.0,
            hdi_index: Some(0.9),
            co2_consump: None,
            gdp,
            services: None,
        }
    }

    fn state() -> DashboardState {
        let dataset = Table::from_observations(&[
            obs("Japan", "Asia", 2005, 35000.0),
            obs("France", "Europe", 2005, 34000.0),
            obs("Japan", "Asia", 2006, 36000.0),
        ]);
        DashboardState::new(dataset, &DashboardConfig::default()).unwrap()
    }

    #[test]
    fn test_first_year_is_selected() {
        let state = state();
        assert_eq!(state.selected_year, 2005);
        assert_eq!(state.years, vec![2005, 2006]);
    }

    #[test]
    fn test_set_year_rejects_unknown() {
        let mut state = state();
        assert!(state.set_year(1990).is_err());
        state.set_year(2006).unwrap();
        assert_eq!(state.selected_year, 2006);
    }

    #[test]
    fn test_overview_renders_every_page() {
        let sections = state().render().unwrap();
        assert_eq!(sections.len(), 4);
        assert_eq!(sections[0].title, "Data Exploration for the year 2005");
        assert_eq!(
            sections[3].title,
            "Development Time Series from 2005 to 2006 by continent"
        );
        assert!(sections[2]
            .notes
            .contains(&"Highest GDP in Asia: Japan ($35,000)".to_string()));
    }

    #[test]
    fn test_time_series_carries_legend() {
        let mut state = state();
        state.view = View::TimeSeries;
        let sections = state.render().unwrap();
        let (name, legend) = sections[0].tables.last().unwrap();
        assert_eq!(name, "continent_colors");
        assert_eq!(legend.len(), 6);
        assert_eq!(legend.value(0, "color"), Some(&Value::from("#1f77b4")));
    }

    #[test]
    fn test_restrict_continents() {
        let mut state = state();
        state.restrict_continents(&["Europe".to_string()]).unwrap();
        assert_eq!(state.dataset.len(), 1);
        // Europe only has 2005 rows.
        assert_eq!(state.years, vec![2005]);
        assert!(state.set_year(2006).is_err());
    }

    #[test]
    fn test_restrict_continents_moves_selected_year() {
        let dataset = Table::from_observations(&[
            obs("Japan", "Asia", 2005, 35000.0),
            obs("France", "Europe", 2006, 34000.0),
        ]);
        let mut state = DashboardState::new(dataset, &DashboardConfig::default()).unwrap();
        assert_eq!(state.selected_year, 2005);
        state.restrict_continents(&["Europe".to_string()]).unwrap();
        assert_eq!(state.selected_year, 2006);

        assert!(state.restrict_continents(&["Oceania".to_string()]).is_err());
        assert_eq!(state.dataset.len(), 1);
    }

    #[test]
    fn test_exploration_reports_high_hdi_gdp() {
        let mut state = state();
        state.view = View::Exploration;
        let sections = state.render().unwrap();
        assert!(sections[0].notes.contains(
            &"HDI ≥ 0.8 indicates very high human development (Avg GDP: $34500)".to_string()
        ));
    }

    #[test]
    fn test_section_json() {
        let mut state = state();
        state.view = View::Statistics;
        let sections = state.render().unwrap();
        let json = sections[0].to_json().unwrap();
        assert_eq!(json["tables"]["avg_hdi_by_continent"][0]["continent"], "Asia");
        // CO2 is missing everywhere, so no continent has a mean.
        assert_eq!(json["tables"]["avg_co2_by_continent"], json!([]));
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(1234567.4), "1,234,567");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(-1000.0), "-1,000");
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let empty = Table::from_observations(&[]);
        assert!(DashboardState::new(empty, &DashboardConfig::default()).is_err());
    }
}
