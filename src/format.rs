//! Output formatting of validated payloads.
//!
//! The representation handed back to the caller is chosen per call from the
//! configured [`OutputMode`] and an optional caller transform:
//!
//! | mode      | transform | result                  |
//! |-----------|-----------|-------------------------|
//! | `raw`     | any       | [`Output::Raw`]         |
//! | `tabular` | given     | [`Output::Custom`]      |
//! | `tabular` | none      | [`Output::Table`]       |

use crate::{OutputMode, Result, Table};
use serde_json::Value;

/// The call-time formatting decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format<F> {
    /// Hand the parsed value back untouched.
    Raw,
    /// Lay the parsed value out as a [`Table`].
    Tabular,
    /// Apply a caller-supplied transform.
    Custom(F),
}

impl<F> Format<F> {
    /// Resolves the configured mode and an optional transform into a format.
    ///
    /// The transform only takes effect in tabular mode: raw mode always
    /// wins.
    pub fn resolve(mode: OutputMode, custom: Option<F>) -> Self {
        match (mode, custom) {
            (OutputMode::Raw, _) => Format::Raw,
            (OutputMode::Tabular, Some(f)) => Format::Custom(f),
            (OutputMode::Tabular, None) => Format::Tabular,
        }
    }
}

/// A formatted query result.
#[derive(Debug, Clone, PartialEq)]
pub enum Output<T = Value> {
    /// The parsed JSON value, untouched.
    Raw(Value),
    /// The parsed value laid out as a table.
    Table(Table),
    /// The result of a caller-supplied transform.
    Custom(T),
}

impl<T> Output<T> {
    /// Returns the table, if this is [`Output::Table`].
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Output::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Consumes the output, returning the raw value if there is one.
    pub fn into_raw(self) -> Option<Value> {
        match self {
            Output::Raw(value) => Some(value),
            _ => None,
        }
    }

    /// Consumes the output, returning the table if there is one.
    pub fn into_table(self) -> Option<Table> {
        match self {
            Output::Table(table) => Some(table),
            _ => None,
        }
    }
}

/// Applies a resolved [`Format`] to a validated value.
///
/// # Errors
///
/// Returns [`Error::NotTabular`](crate::Error::NotTabular) when a table is
/// requested for a payload that has no tabular shape.
pub fn apply<T, F>(value: Value, format: Format<F>) -> Result<Output<T>>
where
    F: FnOnce(Value) -> T,
{
    match format {
        Format::Raw => Ok(Output::Raw(value)),
        Format::Custom(transform) => Ok(Output::Custom(transform(value))),
        Format::Tabular => Table::from_json(&value).map(Output::Table),
    }
}

/// Formats a validated value according to `mode` and an optional transform.
///
/// # Examples
///
/// ```
/// use iexcloud::{format, Output, OutputMode};
/// use serde_json::{json, Value};
///
/// let value = json!([{"x": 1}, {"x": 2}]);
///
/// let raw = format(value.clone(), OutputMode::Raw, Some(|_: Value| 0)).unwrap();
/// assert_eq!(raw, Output::Raw(value.clone()));
///
/// let len = |v: Value| v.as_array().map_or(0, Vec::len);
/// let count = format(value.clone(), OutputMode::Tabular, Some(len)).unwrap();
/// assert_eq!(count, Output::Custom(2));
///
/// let table = format::<(), fn(Value) -> ()>(value, OutputMode::Tabular, None).unwrap();
/// assert_eq!(table.as_table().unwrap().len(), 2);
/// ```
pub fn format<T, F>(value: Value, mode: OutputMode, custom: Option<F>) -> Result<Output<T>>
where
    F: FnOnce(Value) -> T,
{
    apply(value, Format::resolve(mode, custom))
}
