use crate::catalog::ContinentCatalog;
use crate::data::model::Table;
use crate::error::Result;

/// Default name of the continent column.
pub const CONTINENT_COLUMN: &str = "continent";

/// Sort `table` by the catalog position of its `column` values.
///
/// The sort is stable: rows of the same continent keep their input order,
/// and rows with an unknown or missing continent go last, also in input
/// order. No row is added, dropped or modified.
pub fn apply_continent_order(
    table: &Table,
    catalog: &ContinentCatalog,
    column: &str,
) -> Result<Table> {
    let idx = table.column_index(column)?;
    let mut rows = table.rows().to_vec();
    rows.sort_by_key(|row| catalog.sort_key(&row[idx]));
    Ok(table.with_rows(rows))
}

/// [`apply_continent_order`] on the `continent` column.
pub fn apply_default_continent_order(table: &Table, catalog: &ContinentCatalog) -> Result<Table> {
    apply_continent_order(table, catalog, CONTINENT_COLUMN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;
    use crate::error::ReshapeError;

    fn table() -> Table {
        Table::from_rows(
            ["region", "n"],
            vec![
                vec!["Oceania".into(), Value::Integer(0)],
                vec!["Atlantis".into(), Value::Integer(1)],
                vec!["Asia".into(), Value::Integer(2)],
                vec![Value::Null, Value::Integer(3)],
                vec!["Oceania".into(), Value::Integer(4)],
                vec!["Africa".into(), Value::Integer(5)],
            ],
        )
        .unwrap()
    }

    fn ns(t: &Table) -> Vec<i64> {
        t.column("n")
            .unwrap()
            .into_iter()
            .filter_map(Value::as_i64)
            .collect()
    }

    #[test]
    fn test_custom_column_is_sorted_stably() {
        let catalog = ContinentCatalog::standard();
        let sorted = apply_continent_order(&table(), &catalog, "region").unwrap();
        assert_eq!(ns(&sorted), vec![2, 5, 0, 4, 1, 3]);
        assert_eq!(sorted.columns(), table().columns());
    }

    #[test]
    fn test_missing_column() {
        let catalog = ContinentCatalog::standard();
        let err = apply_default_continent_order(&table(), &catalog).unwrap_err();
        assert_eq!(
            err,
            ReshapeError::Schema {
                column: "continent".into()
            }
        );
    }

    #[test]
    fn test_custom_catalog_order() {
        let catalog = ContinentCatalog::from_names(["Oceania", "Africa", "Asia"]).unwrap();
        let sorted = apply_continent_order(&table(), &catalog, "region").unwrap();
        assert_eq!(ns(&sorted), vec![0, 4, 5, 2, 1, 3]);
    }

    #[test]
    fn test_empty_table() {
        let catalog = ContinentCatalog::standard();
        let empty = Table::new(["continent"]).unwrap();
        assert!(apply_default_continent_order(&empty, &catalog)
            .unwrap()
            .is_empty());
    }
}
