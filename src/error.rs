use thiserror::Error;

/// Errors raised by the table model and the reshaping utilities.
///
/// These are data or programming errors, never transient: callers surface
/// them as-is instead of retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReshapeError {
    /// A required column is absent from the input table.
    #[error("missing required column '{column}'")]
    Schema { column: String },

    /// A cell holds a value of the wrong kind for the requested operation.
    #[error("column '{column}' holds {found}, expected {expected}")]
    Type {
        column: String,
        expected: &'static str,
        found: String,
    },

    #[error("row {row} has {found} values but the table has {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A wide table's cell grid does not match its index.
    #[error("wide table has {found} cell rows for {expected} index values")]
    IndexLength { expected: usize, found: usize },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    /// Two long-format rows map to the same wide-table cell.
    #[error("duplicate entry for index {index} and column '{column}'")]
    DuplicateEntry { index: String, column: String },

    #[error("invalid continent catalog: {0}")]
    Catalog(String),
}

impl ReshapeError {
    pub(crate) fn schema(column: &str) -> Self {
        ReshapeError::Schema {
            column: column.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReshapeError>;
