//! Classification of 200 responses.
//!
//! The provider does not always signal errors with a non-200 status. An
//! invalid symbol comes back as a plain-text `Unknown symbol` body, and some
//! failures arrive as a bare JSON string holding an `Error Message`. The rules
//! below are applied in order; the first one that matches rejects the
//! response.

use crate::error::FailureReason;
use crate::{Error, Result};
use http::StatusCode;
use serde_json::Value;

const UNKNOWN_SYMBOL: &str = "Unknown symbol";
const ERROR_MESSAGE_MARKER: &str = "Error Message";

/// Validates the body of a 200 response and returns the parsed JSON value.
///
/// The value is returned unchanged in structure: objects, arrays and scalars
/// all pass through as parsed.
///
/// # Errors
///
/// Returns [`Error::QueryFailed`] carrying `status` and the raw body when the
/// body is exactly `Unknown symbol`, is not valid JSON, or is a JSON string
/// containing `Error Message`.
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use iexcloud::{validate, FailureReason};
///
/// let value = validate("[1, 2, 3]", StatusCode::OK).unwrap();
/// assert_eq!(value, serde_json::json!([1, 2, 3]));
///
/// let err = validate("Unknown symbol", StatusCode::OK).unwrap_err();
/// assert_eq!(err.reason(), Some(FailureReason::UnknownSymbol));
/// ```
pub fn validate(raw_body: &str, status: StatusCode) -> Result<Value> {
    if raw_body == UNKNOWN_SYMBOL {
        return Err(reject(raw_body, status, FailureReason::UnknownSymbol));
    }

    let value: Value = match serde_json::from_str(raw_body) {
        Ok(value) => value,
        Err(_) => return Err(reject(raw_body, status, FailureReason::InvalidJson)),
    };

    if let Value::String(message) = &value {
        if message.contains(ERROR_MESSAGE_MARKER) {
            return Err(reject(raw_body, status, FailureReason::ErrorMessage));
        }
    }

    Ok(value)
}

fn reject(raw_body: &str, status: StatusCode, reason: FailureReason) -> Error {
    Error::query_failed(status, raw_body, reason)
}
