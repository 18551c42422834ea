// PyMonitor - Python Execution Recording Navigator
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Recorded program states of a traced Python call

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque snapshot identifier as delivered by the monitoring backend
///
/// The backend hands out either integer or string ids. Both forms are kept
/// verbatim, so `1` and `"1"` are distinct identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotId {
    /// Integer identifier (database row id)
    Int(i64),
    /// String identifier
    Str(String),
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Str(id) => write!(f, "{id}"),
        }
    }
}

impl From<i64> for SnapshotId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<i32> for SnapshotId {
    fn from(id: i32) -> Self {
        Self::Int(id.into())
    }
}

impl From<usize> for SnapshotId {
    fn from(id: usize) -> Self {
        i64::try_from(id).map(Self::Int).unwrap_or_else(|_| Self::Str(id.to_string()))
    }
}

impl From<&str> for SnapshotId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

impl From<String> for SnapshotId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

impl FromStr for SnapshotId {
    type Err = std::convert::Infallible;

    /// Parses user input: anything that looks like an integer becomes [`SnapshotId::Int`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(s.parse::<i64>().map(Self::Int).unwrap_or_else(|_| Self::Str(s.to_string())))
    }
}

/// Display-ready representation of a local variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableValue {
    /// Serialized value (`repr()` of the Python object)
    pub value: String,
    /// Python type name
    #[serde(rename = "type", default)]
    pub type_name: String,
}

impl VariableValue {
    /// Create a new variable value
    pub fn new(value: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self { value: value.into(), type_name: type_name.into() }
    }
}

/// Local variables of a snapshot, keyed by variable name
pub type Locals = BTreeMap<String, VariableValue>;

/// One recorded program state at one source line during one traced call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Stable identifier
    pub id: SnapshotId,
    /// 1-based source line
    pub line: u32,
    /// Capture time, as delivered by the backend (RFC 3339 when normalized)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Local variables at this point
    #[serde(default)]
    pub locals: Locals,
}

impl Snapshot {
    /// Create a snapshot without locals or timestamp
    pub fn new(id: impl Into<SnapshotId>, line: u32) -> Self {
        Self { id: id.into(), line, timestamp: None, locals: Locals::new() }
    }

    /// Builder-style helper to attach a local variable
    pub fn with_local(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        self.locals.insert(name.into(), VariableValue::new(value, type_name));
        self
    }

    /// Builder-style helper to attach a timestamp
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Look up a local variable by name
    pub fn local(&self, name: &str) -> Option<&VariableValue> {
        self.locals.get(name)
    }

    /// Parse the timestamp, if any.
    ///
    /// Accepts RFC 3339 as well as naive ISO-8601 timestamps (`2024-05-01T10:00:00.123`
    /// or with a space separator), the latter interpreted as UTC.
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.timestamp.as_deref()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    /// Short human-readable capture time (`HH:MM:SS.mmm`), falling back to the raw text
    pub fn display_time(&self) -> Option<String> {
        match self.captured_at() {
            Some(dt) => Some(dt.format("%H:%M:%S%.3f").to_string()),
            None => self.timestamp.clone(),
        }
    }
}
