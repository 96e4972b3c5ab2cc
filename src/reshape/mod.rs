//! Continent-aware reshaping of indicator tables.
//!
//! Every function here is pure: it borrows its input table and the
//! [`ContinentCatalog`](crate::catalog::ContinentCatalog) and returns a
//! freshly allocated table. Nothing logs or prints; failures come back as
//! [`ReshapeError`](crate::error::ReshapeError). Empty inputs produce empty
//! outputs with the usual columns.

pub mod aggregate;
pub mod order;
pub mod time_series;

pub use aggregate::{aggregate_by_continent, max_row_by_continent, AggregateOptions, Reduction};
pub use order::{apply_continent_order, apply_default_continent_order, CONTINENT_COLUMN};
pub use time_series::{continent_time_series, WideTable, YEAR_COLUMN};
