//! Continent-level reshaping of development indicators.
//!
//! Loads a country × year indicator table (GDP per capita, life expectancy,
//! HDI, CO₂ consumption) and turns it into the small tables each dashboard
//! chart consumes: continent-ordered rows, per-continent aggregates and
//! continent time series.

pub mod catalog;
pub mod config;
pub mod data;
pub mod error;
pub mod reshape;
pub mod state;
pub mod views;

pub use catalog::ContinentCatalog;
pub use data::model::{Table, Value};
pub use error::ReshapeError;
