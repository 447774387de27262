//! Row decoding and value encoding helpers shared by the stores.

use std::str::FromStr;

use jiff::Timestamp;
use rusqlite::{types::Type, Row};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::{error::Result, models::Owner};

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Encodes a timestamp as fixed-width RFC 3339 text in UTC with nanosecond
/// precision, so lexical order in SQL equals chronological order.
pub(crate) fn format_timestamp(timestamp: Timestamp) -> String {
    format!(
        "{}.{:09}Z",
        timestamp.strftime("%Y-%m-%dT%H:%M:%S"),
        timestamp.subsec_nanosecond()
    )
}

/// Serializes a payload for a JSON column.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn conversion_error(idx: usize, error: impl Into<BoxedError>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, error.into())
}

pub(crate) fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<Timestamp> {
    row.get::<_, String>(idx)?
        .parse::<Timestamp>()
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn optional_timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<Option<Timestamp>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| raw.parse::<Timestamp>().map_err(|e| conversion_error(idx, e)))
        .transpose()
}

pub(crate) fn uuid_at(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    row.get::<_, String>(idx)?
        .parse::<Uuid>()
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn json_at<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    serde_json::from_str(&row.get::<_, String>(idx)?).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn optional_json_at<T: DeserializeOwned>(
    row: &Row,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

/// Decodes an enum stored by its `as_str` name.
pub(crate) fn parsed_at<T: FromStr<Err = String>>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    row.get::<_, String>(idx)?
        .parse::<T>()
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn owner_at(row: &Row, idx: usize) -> rusqlite::Result<Option<Owner>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| Owner::new(raw).map_err(|e| conversion_error(idx, e.to_string())))
        .transpose()
}
