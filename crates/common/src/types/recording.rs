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

//! Recording documents and validation at the loading boundary
//!
//! A recording is what the monitoring backend hands over for one traced call: the
//! chronological list of snapshots plus a little context. Every record is checked
//! against the data contract here, so the navigation core only ever sees
//! well-formed [`Snapshot`]s. Records that violate the contract are dropped (with a
//! warning) instead of failing the whole load.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{Locals, Snapshot, SnapshotId};

/// Violation of the snapshot data contract by a single record
#[derive(Debug, Error)]
pub enum SnapshotContractError {
    /// The record could not be read as a snapshot object at all
    #[error("record #{position} is not a snapshot object: {source}")]
    Malformed {
        /// Position of the record in the delivered sequence
        position: usize,
        /// Underlying decoding error
        #[source]
        source: serde_json::Error,
    },
    /// The record has no `id`
    #[error("record #{position} has no `id`")]
    MissingId {
        /// Position of the record in the delivered sequence
        position: usize,
    },
    /// The record has no `line`
    #[error("record #{position} (id {id}) has no `line`")]
    MissingLine {
        /// Position of the record in the delivered sequence
        position: usize,
        /// Id of the offending record
        id: SnapshotId,
    },
    /// The line is not a valid 1-based line number
    #[error("record #{position} (id {id}) has invalid line {line}")]
    InvalidLine {
        /// Position of the record in the delivered sequence
        position: usize,
        /// Id of the offending record
        id: SnapshotId,
        /// The rejected line value
        line: i64,
    },
    /// The id was already used by an earlier record
    #[error("record #{position} repeats id {id}")]
    DuplicateId {
        /// Position of the record in the delivered sequence
        position: usize,
        /// The repeated id
        id: SnapshotId,
    },
}

impl SnapshotContractError {
    /// Position of the offending record
    pub fn position(&self) -> usize {
        match self {
            Self::Malformed { position, .. }
            | Self::MissingId { position }
            | Self::MissingLine { position, .. }
            | Self::InvalidLine { position, .. }
            | Self::DuplicateId { position, .. } => *position,
        }
    }
}

/// Failure to read a recording document as a whole
#[derive(Debug, Error)]
pub enum RecordingError {
    /// The document is not JSON
    #[error("recording is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The document is JSON but neither an array nor an object with snapshots
    #[error("recording must be a snapshot array or an object with a `snapshots` field")]
    UnexpectedShape,
}

/// A validated recording of one traced function call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    /// Name of the traced function, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// Source file of the traced function, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Snapshots in execution order
    pub snapshots: Vec<Snapshot>,
}

/// Result of parsing a recording: the usable data plus what had to be dropped
#[derive(Debug)]
pub struct ParsedRecording {
    /// Validated recording
    pub recording: Recording,
    /// Records rejected by validation, in delivery order
    pub violations: Vec<SnapshotContractError>,
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default, alias = "snapshot_id")]
    id: Option<SnapshotId>,
    #[serde(default)]
    line: Option<i64>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    locals: Locals,
}

/// Parse a recording document.
///
/// Two shapes are accepted: a bare array of snapshot records, or an object with a
/// `snapshots` array (legacy name `frames`) and optional `function`/`file` fields.
pub fn parse_recording(json: &str) -> Result<ParsedRecording, RecordingError> {
    let document: Value = serde_json::from_str(json)?;

    let (function, file, records) = match document {
        Value::Array(records) => (None, None, records),
        Value::Object(mut map) => {
            let records = match map.remove("snapshots").or_else(|| map.remove("frames")) {
                Some(Value::Array(records)) => records,
                _ => return Err(RecordingError::UnexpectedShape),
            };
            let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
            (text("function"), text("file"), records)
        }
        _ => return Err(RecordingError::UnexpectedShape),
    };

    let (snapshots, violations) = validate_records(records);
    debug!(accepted = snapshots.len(), rejected = violations.len(), "Parsed recording");

    Ok(ParsedRecording { recording: Recording { function, file, snapshots }, violations })
}

/// Validate raw snapshot records, keeping the well-formed ones in delivery order.
pub fn validate_records(records: Vec<Value>) -> (Vec<Snapshot>, Vec<SnapshotContractError>) {
    let mut snapshots = Vec::with_capacity(records.len());
    let mut violations = Vec::new();
    let mut seen = HashSet::new();

    for (position, record) in records.into_iter().enumerate() {
        match validate_record(position, record, &seen) {
            Ok(snapshot) => {
                seen.insert(snapshot.id.clone());
                snapshots.push(snapshot);
            }
            Err(err) => {
                warn!(position, error = %err, "Dropping snapshot that violates the data contract");
                violations.push(err);
            }
        }
    }

    (snapshots, violations)
}

fn validate_record(
    position: usize,
    record: Value,
    seen: &HashSet<SnapshotId>,
) -> Result<Snapshot, SnapshotContractError> {
    let raw: RawSnapshot = serde_json::from_value(record)
        .map_err(|source| SnapshotContractError::Malformed { position, source })?;

    let id = raw.id.ok_or(SnapshotContractError::MissingId { position })?;
    let line = raw.line.ok_or_else(|| SnapshotContractError::MissingLine {
        position,
        id: id.clone(),
    })?;
    let line = u32::try_from(line)
        .ok()
        .filter(|line| *line > 0)
        .ok_or_else(|| SnapshotContractError::InvalidLine { position, id: id.clone(), line })?;

    if seen.contains(&id) {
        return Err(SnapshotContractError::DuplicateId { position, id });
    }

    let timestamp = raw.timestamp.and_then(normalize_timestamp);
    Ok(Snapshot { id, line, timestamp, locals: raw.locals })
}

/// Timestamps arrive either as text or as epoch seconds; numbers become RFC 3339.
fn normalize_timestamp(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => {
            let secs = number.as_f64()?;
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9).round() as u32;
            DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
                .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let parsed = parse_recording(
            r#"[
                {"id": "a", "line": 10, "locals": {"x": {"value": "1", "type": "int"}}},
                {"id": "b", "line": 11}
            ]"#,
        )
        .unwrap();

        assert!(parsed.violations.is_empty());
        assert_eq!(parsed.recording.function, None);
        assert_eq!(parsed.recording.snapshots.len(), 2);
        assert_eq!(parsed.recording.snapshots[0].local("x").unwrap().value, "1");
        assert!(parsed.recording.snapshots[1].locals.is_empty());
    }

    #[test]
    fn test_parse_wrapped_with_legacy_names() {
        let parsed = parse_recording(
            r#"{
                "function": "fib",
                "file": "fib.py",
                "frames": [{"snapshot_id": 3, "line": 2}]
            }"#,
        )
        .unwrap();

        assert_eq!(parsed.recording.function.as_deref(), Some("fib"));
        assert_eq!(parsed.recording.file.as_deref(), Some("fib.py"));
        assert_eq!(parsed.recording.snapshots[0].id, SnapshotId::Int(3));
    }

    #[test]
    fn test_unexpected_shapes() {
        assert!(matches!(parse_recording("42"), Err(RecordingError::UnexpectedShape)));
        assert!(matches!(
            parse_recording(r#"{"snapshots": 1}"#),
            Err(RecordingError::UnexpectedShape)
        ));
        assert!(matches!(parse_recording("{"), Err(RecordingError::Json(_))));
    }

    #[test]
    fn test_contract_violations_are_dropped_in_order() {
        let parsed = parse_recording(
            r#"[
                {"id": 1, "line": 5},
                {"line": 6},
                {"id": 2},
                {"id": 3, "line": 0},
                {"id": 1, "line": 7},
                "not an object",
                {"id": 4, "line": 8}
            ]"#,
        )
        .unwrap();

        let ids: Vec<_> = parsed.recording.snapshots.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec![SnapshotId::Int(1), SnapshotId::Int(4)]);

        let positions: Vec<_> = parsed.violations.iter().map(|v| v.position()).collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5]);
        assert!(matches!(parsed.violations[0], SnapshotContractError::MissingId { .. }));
        assert!(matches!(parsed.violations[1], SnapshotContractError::MissingLine { .. }));
        assert!(matches!(parsed.violations[2], SnapshotContractError::InvalidLine { line: 0, .. }));
        assert!(matches!(parsed.violations[3], SnapshotContractError::DuplicateId { .. }));
        assert!(matches!(parsed.violations[4], SnapshotContractError::Malformed { .. }));
    }

    #[test]
    fn test_numeric_timestamp_is_normalized() {
        let parsed =
            parse_recording(r#"[{"id": 1, "line": 1, "timestamp": 1714557600.5}]"#).unwrap();
        assert_eq!(
            parsed.recording.snapshots[0].timestamp.as_deref(),
            Some("2024-05-01T10:00:00.500Z")
        );
    }

    #[test]
    fn test_recording_serializes_canonical_names() {
        let recording = Recording {
            function: Some("f".to_string()),
            file: None,
            snapshots: vec![Snapshot::new("a", 3)],
        };
        let json = serde_json::to_value(&recording).unwrap();
        assert_eq!(json["snapshots"][0]["id"], "a");
        assert!(json.get("file").is_none());
    }
}
