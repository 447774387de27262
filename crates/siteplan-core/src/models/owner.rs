//! Caller identity attached to analyses and tasks.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Opaque identity of an authenticated caller.
///
/// Anonymous runs carry no owner at all (`Option<Owner>::None`); an anonymous
/// record is never matched against an authenticated one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Owner(String);

impl Owner {
    /// Wraps an identity string, rejecting blank values.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(EngineError::invalid_input("owner").with_reason("Owner must not be blank"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Owner {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Owner::new(s)
    }
}

/// Returns true when a record owned by `record` may be accessed by `caller`.
pub(crate) fn owner_matches(record: Option<&str>, caller: Option<&Owner>) -> bool {
    record == caller.map(Owner::as_str)
}
