//! Decoding of table payloads.
//!
//! The backend serialises missing numbers straight out of a dataframe, so
//! bodies may contain a bare `NaN` token, which is not JSON.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::{data::TablePayload, error::ClientError};

static NAN_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bNaN\b").unwrap());

/// Rewrites every whole-word `NaN` to `null`.
pub fn replace_nan(body: &str) -> Cow<'_, str> {
    NAN_TOKEN.replace_all(body, "null")
}

pub fn decode_table(endpoint: &'static str, body: &str) -> Result<TablePayload, ClientError> {
    let value: Value = serde_json::from_str(&replace_nan(body))?;
    if is_falsy(&value) {
        return Err(ClientError::EmptyPayload(endpoint));
    }
    Ok(serde_json::from_value(value)?)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
