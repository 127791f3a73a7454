//! Tabular output, backed by an Arrow [`RecordBatch`].
//!
//! The schema is inferred by `arrow-json` from the payload's records and the
//! rows are decoded by its JSON decoder; [`Table`] only decides which values
//! count as records.

use crate::{Error, Result};
use arrow::array::{ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Schema};
use arrow::error::ArrowError;
use arrow::json::reader::{infer_json_schema_from_iterator, ReaderBuilder};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::util::pretty::pretty_format_batches;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Name of the single column an array of scalars is laid out in.
const SCALAR_COLUMN: &str = "0";

/// Tabular view of a validated payload.
///
/// Columns follow the order keys are first seen in the payload. A record
/// that lacks a key gets a null cell.
///
/// # Examples
///
/// ```
/// use iexcloud::Table;
/// use serde_json::json;
///
/// let table = Table::from_json(&json!([{"x": 1}, {"x": 2, "y": "b"}])).unwrap();
///
/// assert_eq!(table.columns(), ["x", "y"]);
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.string_column("y").unwrap(), [None, Some("b".to_string())]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    batch: RecordBatch,
}

impl Table {
    /// Builds a table from a parsed payload.
    ///
    /// - an array of objects gives one row per object;
    /// - a single object gives one row;
    /// - an array of scalars gives a single column named `0`;
    /// - an empty array gives an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotTabular`] for a top-level scalar or null, for
    /// arrays mixing objects with other values, and when the records cannot
    /// be decoded into columns.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Object(_) => Self::from_records(std::slice::from_ref(value)),
            Value::Array(items) if items.iter().all(Value::is_object) => {
                Self::from_records(items)
            }
            Value::Array(items) if !items.iter().any(Value::is_object) => {
                let records: Vec<Value> = items
                    .iter()
                    .map(|item| {
                        let mut record = Map::with_capacity(1);
                        record.insert(SCALAR_COLUMN.to_string(), item.clone());
                        Value::Object(record)
                    })
                    .collect();
                Self::from_records(&records)
            }
            Value::Array(_) => Err(Error::NotTabular(
                "an array mixing objects and scalars".to_string(),
            )),
            other => Err(Error::NotTabular(format!("a scalar value ({other})"))),
        }
    }

    /// Builds a table from JSON objects, one row per object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotTabular`] when a record is not an object or the
    /// records cannot be decoded into columns.
    pub fn from_records(records: &[Value]) -> Result<Self> {
        if let Some(other) = records.iter().find(|record| !record.is_object()) {
            return Err(Error::NotTabular(format!("a non-object record ({other})")));
        }
        if records.is_empty() {
            return Ok(Self {
                batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
            });
        }

        let schema = Arc::new(
            infer_json_schema_from_iterator(records.iter().map(Ok)).map_err(not_tabular)?,
        );

        if schema.fields().is_empty() {
            let options = RecordBatchOptions::new().with_row_count(Some(records.len()));
            let batch = RecordBatch::try_new_with_options(schema, Vec::new(), &options)
                .map_err(not_tabular)?;
            return Ok(Self { batch });
        }

        let mut decoder = ReaderBuilder::new(Arc::clone(&schema))
            .with_batch_size(records.len())
            .with_coerce_primitive(true)
            .build_decoder()
            .map_err(not_tabular)?;
        decoder.serialize(records).map_err(not_tabular)?;

        let batch = decoder
            .flush()
            .map_err(not_tabular)?
            .unwrap_or_else(|| RecordBatch::new_empty(schema));
        Ok(Self { batch })
    }

    /// The underlying Arrow batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Consumes the table, returning the underlying Arrow batch.
    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    /// Column names, in order.
    pub fn columns(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.batch.num_rows()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// The Arrow array of column `name`.
    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    /// Column `name` as numbers.
    ///
    /// Cells that are null or do not convert to a number are `None`.
    /// Returns `None` when the column is missing or its type has no numeric
    /// reading (nested values).
    pub fn f64_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let array = cast(self.column(name)?, &DataType::Float64).ok()?;
        Some(array.as_primitive::<Float64Type>().iter().collect())
    }

    /// Column `name` as text, with nulls as `None`.
    pub fn string_column(&self, name: &str) -> Option<Vec<Option<String>>> {
        let array = cast(self.column(name)?, &DataType::Utf8).ok()?;
        Some(
            array
                .as_string::<i32>()
                .iter()
                .map(|cell| cell.map(str::to_string))
                .collect(),
        )
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered =
            pretty_format_batches(std::slice::from_ref(&self.batch)).map_err(|_| fmt::Error)?;
        write!(f, "{rendered}")
    }
}

fn not_tabular(error: ArrowError) -> Error {
    Error::NotTabular(format!("records Arrow could not decode ({error})"))
}
