use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use serde_json::{Map, Value as JsonValue};

use super::model::{Table, Value};

/// Narrowest Arrow type that holds every non-missing cell of a column.
fn infer_type<'a>(values: impl Iterator<Item = &'a Value>) -> DataType {
    let mut ty: Option<DataType> = None;
    for v in values {
        let cell = match v {
            Value::Null => continue,
            Value::Bool(_) => DataType::Boolean,
            Value::Integer(_) => DataType::Int64,
            Value::Float(_) => DataType::Float64,
            Value::String(_) => DataType::Utf8,
        };
        ty = Some(match (ty, cell) {
            (None, c) => c,
            (Some(a), c) if a == c => a,
            (Some(DataType::Int64), DataType::Float64)
            | (Some(DataType::Float64), DataType::Int64) => DataType::Float64,
            _ => DataType::Utf8,
        });
    }
    ty.unwrap_or(DataType::Float64)
}

fn build_array(values: &[&Value], ty: &DataType) -> ArrayRef {
    match ty {
        DataType::Boolean => Arc::new(BooleanArray::from(
            values
                .iter()
                .map(|v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        DataType::Int64 => Arc::new(Int64Array::from(
            values.iter().map(|v| v.as_i64()).collect::<Vec<_>>(),
        )),
        DataType::Float64 => Arc::new(Float64Array::from(
            values.iter().map(|v| v.as_f64()).collect::<Vec<_>>(),
        )),
        _ => Arc::new(StringArray::from(
            values
                .iter()
                .map(|v| (!v.is_missing()).then(|| v.to_string()))
                .collect::<Vec<_>>(),
        )),
    }
}

/// Convert a table to an Arrow record batch, one nullable field per column.
pub fn to_record_batch(table: &Table) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(table.columns().len());
    let mut arrays = Vec::with_capacity(table.columns().len());

    for name in table.columns() {
        let values = table.column(name)?;
        let ty = infer_type(values.iter().copied());
        arrays.push(build_array(&values, &ty));
        fields.push(Field::new(name, ty, true));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
        .context("building record batch")
}

/// Render a table as an ASCII grid.
pub fn pretty_format(table: &Table) -> Result<String> {
    if table.columns().is_empty() {
        return Ok("(no columns)".to_string());
    }
    let batch = to_record_batch(table)?;
    let text = pretty_format_batches(&[batch]).context("formatting table")?;
    Ok(text.to_string())
}

/// Records-oriented JSON: one object per row, keys in column order.
pub fn to_json_records(table: &Table) -> Result<JsonValue> {
    let records = table
        .rows()
        .iter()
        .map(|row| {
            let obj = table
                .columns()
                .iter()
                .zip(row)
                .map(|(col, v)| Ok((col.clone(), serde_json::to_value(v)?)))
                .collect::<Result<Map<String, JsonValue>>>()?;
            Ok(JsonValue::Object(obj))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(JsonValue::Array(records))
}
