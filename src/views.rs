//! Data preparation for each dashboard view.
//!
//! A view takes the raw dataset (or the rows of one year) and returns the
//! tables and figures its charts need. Nothing here draws anything.

use serde::Serialize;

use crate::catalog::ContinentCatalog;
use crate::data::filter::{drop_missing, select_year};
use crate::data::model::{Table, Value};
use crate::error::Result;
use crate::reshape::aggregate::lookup;
use crate::reshape::{
    aggregate_by_continent, apply_default_continent_order, continent_time_series,
    max_row_by_continent, AggregateOptions, Reduction, CONTINENT_COLUMN, YEAR_COLUMN,
};

/// HDI at or above which a country counts as very highly developed.
pub const HIGH_HDI_THRESHOLD: f64 = 0.8;

/// Metrics plotted over time, in display order.
pub const TIME_SERIES_METRICS: [&str; 3] = ["gdp", "hdi_index", "co2_consump"];

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn mean_of(table: &Table, metric: &str) -> Result<Option<f64>> {
    let values: Vec<f64> = table.metric_column(metric)?.into_iter().flatten().collect();
    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
}

// ---------------------------------------------------------------------------
// Data exploration
// ---------------------------------------------------------------------------

/// Headline averages for one year, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: i64,
    pub avg_gdp: Option<f64>,
    pub avg_life_exp: Option<f64>,
    pub avg_hdi: Option<f64>,
}

pub fn year_summary(year_rows: &Table, year: i64) -> Result<YearSummary> {
    Ok(YearSummary {
        year,
        avg_gdp: mean_of(year_rows, "gdp")?.map(round2),
        avg_life_exp: mean_of(year_rows, "life_exp")?.map(round2),
        avg_hdi: mean_of(year_rows, "hdi_index")?.map(round2),
    })
}

/// Continent with the most countries at or above an HDI threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighHdiInsight {
    pub continent: String,
    pub count: i64,
    pub threshold: f64,
}

/// `None` when no row reaches `threshold`. Ties go to the continent first
/// in catalog order.
pub fn high_hdi_insight(
    year_rows: &Table,
    catalog: &ContinentCatalog,
    threshold: f64,
) -> Result<Option<HighHdiInsight>> {
    let hdi_idx = year_rows.column_index("hdi_index")?;
    let high = drop_missing(year_rows, "hdi_index")?
        .filter_rows(|row| row[hdi_idx].as_f64().is_some_and(|v| v >= threshold));

    let counts = aggregate_by_continent(
        &high,
        catalog,
        "hdi_index",
        Reduction::Count,
        AggregateOptions {
            drop_missing: true,
            ordered: true,
        },
    )?;

    let mut best: Option<HighHdiInsight> = None;
    for row in counts.rows() {
        let (Some(continent), Some(count)) = (row[0].as_str(), row[1].as_i64()) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| count > b.count) {
            best = Some(HighHdiInsight {
                continent: continent.to_string(),
                count,
                threshold,
            });
        }
    }
    Ok(best)
}

/// Mean GDP of the rows whose HDI is at least `threshold`; rows without an
/// HDI never qualify. `None` when no row qualifies.
pub fn high_hdi_avg_gdp(year_rows: &Table, threshold: f64) -> Result<Option<f64>> {
    let hdi_idx = year_rows.column_index("hdi_index")?;
    let high = year_rows.filter_rows(|row| row[hdi_idx].as_f64().is_some_and(|v| v >= threshold));
    mean_of(&high, "gdp")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorationView {
    pub summary: YearSummary,
    /// Year rows in continent order, for the GDP vs. life-expectancy scatter.
    pub scatter: Table,
    pub insight: Option<HighHdiInsight>,
    /// Mean GDP of the very highly developed countries, for the threshold
    /// line on the scatter.
    pub avg_gdp_high_hdi: Option<f64>,
}

pub fn exploration_view(
    dataset: &Table,
    catalog: &ContinentCatalog,
    year: i64,
    hdi_threshold: f64,
) -> Result<ExplorationView> {
    let year_rows = select_year(dataset, year)?;
    let scatter = apply_default_continent_order(&year_rows, catalog)?;
    Ok(ExplorationView {
        summary: year_summary(&year_rows, year)?,
        insight: high_hdi_insight(&scatter, catalog, hdi_threshold)?,
        avg_gdp_high_hdi: high_hdi_avg_gdp(&year_rows, hdi_threshold)?,
        scatter,
    })
}

// ---------------------------------------------------------------------------
// Statistical analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsView {
    /// Ordered year rows for the life-expectancy box plot.
    pub life_exp_box: Table,
    /// Ordered year rows for the GDP box plot.
    pub gdp_box: Table,
    /// Mean CO₂ consumption per continent.
    pub co2_by_continent: Table,
    /// Mean HDI per continent.
    pub hdi_by_continent: Table,
}

/// Mean of `metric` per continent over non-missing rows, catalog ordered.
pub fn continent_means(
    year_rows: &Table,
    catalog: &ContinentCatalog,
    metric: &str,
) -> Result<Table> {
    let present = drop_missing(year_rows, metric)?;
    aggregate_by_continent(
        &present,
        catalog,
        metric,
        Reduction::Mean,
        AggregateOptions {
            drop_missing: true,
            ordered: true,
        },
    )
}

pub fn statistics_view(
    dataset: &Table,
    catalog: &ContinentCatalog,
    year: i64,
) -> Result<StatisticsView> {
    let year_rows = select_year(dataset, year)?;
    let ordered = apply_default_continent_order(&year_rows, catalog)?;
    Ok(StatisticsView {
        life_exp_box: ordered.clone(),
        gdp_box: ordered,
        co2_by_continent: continent_means(&year_rows, catalog, "co2_consump")?,
        hdi_by_continent: continent_means(&year_rows, catalog, "hdi_index")?,
    })
}

// ---------------------------------------------------------------------------
// GDP distribution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionView {
    /// Highest-GDP country row per continent.
    pub top_gdp: Table,
    /// Year rows plus `continent_percentage`, for the sunburst.
    pub sunburst: Table,
}

/// Append `continent_percentage`: each row's share of its continent's total
/// `metric`, in percent. Missing values, or a zero total, give `Null`.
pub fn with_continent_share(
    year_rows: &Table,
    catalog: &ContinentCatalog,
    metric: &str,
) -> Result<Table> {
    let totals = aggregate_by_continent(
        year_rows,
        catalog,
        metric,
        Reduction::Sum,
        AggregateOptions {
            drop_missing: true,
            ordered: false,
        },
    )?;
    let continent_idx = year_rows.column_index(CONTINENT_COLUMN)?;
    let metric_idx = year_rows.column_index(metric)?;

    let shares = year_rows
        .rows()
        .iter()
        .map(|row| {
            let total = match row[continent_idx].as_str() {
                Some(continent) => {
                    lookup(&totals, continent, metric)?.and_then(|v| v.as_f64())
                }
                None => None,
            };
            let share = match (row[metric_idx].as_f64(), total) {
                (Some(v), Some(total)) if total != 0.0 => Some(v / total * 100.0),
                _ => None,
            };
            Ok(Value::from(share))
        })
        .collect::<Result<Vec<_>>>()?;

    year_rows.clone().with_column("continent_percentage", shares)
}

pub fn distribution_view(
    dataset: &Table,
    catalog: &ContinentCatalog,
    year: i64,
) -> Result<DistributionView> {
    let year_rows = select_year(dataset, year)?;
    Ok(DistributionView {
        top_gdp: max_row_by_continent(&year_rows, catalog, "gdp")?,
        sunburst: with_continent_share(&year_rows, catalog, "gdp")?,
    })
}

// ---------------------------------------------------------------------------
// Development time series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesView {
    /// First and last year of the dataset.
    pub year_range: Option<(i64, i64)>,
    /// `(metric, long-format series)` per plotted metric.
    pub series: Vec<(String, Table)>,
}

/// Time series cover every year; the selected year does not apply.
pub fn time_series_view(dataset: &Table, catalog: &ContinentCatalog) -> Result<TimeSeriesView> {
    let years: Vec<i64> = dataset
        .column(YEAR_COLUMN)?
        .into_iter()
        .filter_map(Value::as_i64)
        .collect();
    let year_range = years.iter().min().zip(years.iter().max()).map(|(a, b)| (*a, *b));

    let series = TIME_SERIES_METRICS
        .iter()
        .map(|metric| {
            let series = continent_time_series(dataset, catalog, metric)?;
            Ok((metric.to_string(), series))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TimeSeriesView { year_range, series })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Observation;

    fn obs(country: &str, continent: &str, year: i64, gdp: f64, hdi: Option<f64>) -> Observation {
        Observation {
            country: country.into(),
            continent: continent.into(),
            year,
            life_exp: 70.0,
            hdi_index: hdi,
            co2_consump: Some(gdp / 1000.0),
            gdp,
            services: None,
        }
    }

    fn dataset() -> Table {
        Table::from_observations(&[
            obs("Japan", "Asia", 2000, 300.0, Some(0.85)),
            obs("India", "Asia", 2000, 100.0, Some(0.5)),
            obs("France", "Europe", 2000, 200.0, Some(0.9)),
            obs("Spain", "Europe", 2000, 200.0, Some(0.8)),
            obs("Chad", "Africa", 2000, 50.0, None),
            obs("Japan", "Asia", 2001, 310.0, Some(0.86)),
            obs("France", "Europe", 2001, 210.0, Some(0.9)),
        ])
    }

    #[test]
    fn test_year_summary_rounds_and_skips_missing() {
        let rows = select_year(&dataset(), 2000).unwrap();
        let summary = year_summary(&rows, 2000).unwrap();
        assert_eq!(summary.avg_gdp, Some(170.0));
        assert_eq!(summary.avg_life_exp, Some(70.0));
        // (0.85 + 0.5 + 0.9 + 0.8) / 4 = 0.7625
        assert_eq!(summary.avg_hdi, Some(0.76));
    }

    #[test]
    fn test_high_hdi_insight_picks_largest_count() {
        let catalog = ContinentCatalog::standard();
        let view = exploration_view(&dataset(), &catalog, 2000, HIGH_HDI_THRESHOLD).unwrap();
        let insight = view.insight.unwrap();
        assert_eq!(insight.continent, "Europe");
        assert_eq!(insight.count, 2);
        assert_eq!(view.scatter.value(0, "continent"), Some(&Value::from("Asia")));
    }

    #[test]
    fn test_high_hdi_insight_none_when_nobody_qualifies() {
        let rows = select_year(&dataset(), 2000).unwrap();
        let insight = high_hdi_insight(&rows, &ContinentCatalog::standard(), 0.99).unwrap();
        assert!(insight.is_none());
    }

    #[test]
    fn test_high_hdi_avg_gdp_skips_missing_hdi() {
        let view =
            exploration_view(&dataset(), &ContinentCatalog::standard(), 2000, HIGH_HDI_THRESHOLD)
                .unwrap();
        // Japan 300, France 200, Spain 200; Chad has no HDI, India is below.
        let avg = view.avg_gdp_high_hdi.unwrap();
        assert!((avg - 700.0 / 3.0).abs() < 1e-9);

        let rows = select_year(&dataset(), 2000).unwrap();
        assert_eq!(high_hdi_avg_gdp(&rows, 0.99).unwrap(), None);
    }

    #[test]
    fn test_high_hdi_tie_goes_to_catalog_order() {
        let rows = select_year(&dataset(), 2001).unwrap();
        let insight = high_hdi_insight(&rows, &ContinentCatalog::standard(), 0.8)
            .unwrap()
            .unwrap();
        assert_eq!(insight.continent, "Asia");
    }

    #[test]
    fn test_statistics_means_are_ordered() {
        let view = statistics_view(&dataset(), &ContinentCatalog::standard(), 2000).unwrap();
        let continents: Vec<String> = view
            .hdi_by_continent
            .column("continent")
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        // Chad has no HDI, so Africa is absent.
        assert_eq!(continents, vec!["Asia", "Europe"]);
        assert_eq!(view.gdp_box.len(), 5);
        assert_eq!(view.co2_by_continent.len(), 3);
    }

    #[test]
    fn test_continent_share_sums_to_hundred() {
        let rows = select_year(&dataset(), 2000).unwrap();
        let shared = with_continent_share(&rows, &ContinentCatalog::standard(), "gdp").unwrap();
        let idx = shared.column_index("continent_percentage").unwrap();
        let asia: f64 = shared
            .rows()
            .iter()
            .filter(|r| r[1] == Value::from("Asia"))
            .filter_map(|r| r[idx].as_f64())
            .sum();
        assert!((asia - 100.0).abs() < 1e-9);
        assert_eq!(shared.value(0, "continent_percentage"), Some(&Value::Float(75.0)));
    }

    #[test]
    fn test_distribution_top_gdp() {
        let view = distribution_view(&dataset(), &ContinentCatalog::standard(), 2000).unwrap();
        let countries: Vec<String> = view
            .top_gdp
            .column("country")
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        // France and Spain tie; France comes first.
        assert_eq!(countries, vec!["Japan", "Chad", "France"]);
    }

    #[test]
    fn test_time_series_view_covers_all_years() {
        let view = time_series_view(&dataset(), &ContinentCatalog::standard()).unwrap();
        assert_eq!(view.year_range, Some((2000, 2001)));
        assert_eq!(view.series.len(), 3);
        let (name, gdp) = &view.series[0];
        assert_eq!(name, "gdp");
        // 2 years × 3 continents
        assert_eq!(gdp.len(), 6);
    }
}
