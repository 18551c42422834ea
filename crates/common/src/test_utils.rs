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

//! Fixture builders for tests of PyMonitor components.

use crate::types::Snapshot;

/// Build snapshots at the given lines with ids `s0`, `s1`, ...
pub fn snapshots_at_lines(lines: &[u32]) -> Vec<Snapshot> {
    lines.iter().enumerate().map(|(i, line)| Snapshot::new(format!("s{i}"), *line)).collect()
}

/// Build snapshots from `(id, line)` pairs
pub fn snapshots_with_ids<I>(entries: &[(I, u32)]) -> Vec<Snapshot>
where
    I: Clone + Into<crate::types::SnapshotId>,
{
    entries.iter().map(|(id, line)| Snapshot::new(id.clone(), *line)).collect()
}

/// Canonical JSON for a list of snapshots, as a recording file would contain it
pub fn recording_json(snapshots: &[Snapshot]) -> String {
    serde_json::to_string_pretty(snapshots).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{parse_recording, SnapshotId};

    #[test]
    fn test_fixture_ids_and_lines() {
        let snapshots = snapshots_at_lines(&[3, 7]);
        assert_eq!(snapshots[1].id, SnapshotId::from("s1"));
        assert_eq!(snapshots[1].line, 7);

        let snapshots = snapshots_with_ids(&[(1i64, 5), (2, 6)]);
        assert_eq!(snapshots[0].id, SnapshotId::Int(1));
    }

    #[test]
    fn test_recording_json_parses_back() {
        let snapshots = snapshots_at_lines(&[1, 2, 1]);
        let parsed = parse_recording(&recording_json(&snapshots)).unwrap();
        assert_eq!(parsed.recording.snapshots, snapshots);
    }
}
