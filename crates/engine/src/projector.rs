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

//! Per-line projection of the global timeline

use pymonitor_common::types::{Snapshot, SnapshotId};

/// Subsequence of the global timeline sharing one source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTimeline<'a> {
    /// Line shared by all entries, `None` if the reference was not found
    pub line: Option<u32>,
    /// Entries in global (chronological) order
    pub entries: Vec<&'a Snapshot>,
    /// Position of the reference snapshot within `entries`
    pub local_index: Option<usize>,
}

impl LocalTimeline<'_> {
    /// Timeline with no position, used when nothing can be projected
    pub fn empty() -> Self {
        Self { line: None, entries: Vec::new(), local_index: None }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of the entries, in order
    pub fn ids(&self) -> Vec<SnapshotId> {
        self.entries.iter().map(|snapshot| snapshot.id.clone()).collect()
    }
}

/// Computes local timelines
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTimelineProjector;

impl LocalTimelineProjector {
    /// Project `global` onto the line of the snapshot identified by `reference`.
    ///
    /// A reference id that is not in `global` (stale after a reload) yields an
    /// empty timeline without a local index.
    pub fn project<'a>(global: &'a [Snapshot], reference: &SnapshotId) -> LocalTimeline<'a> {
        let Some(line) = global.iter().find(|snapshot| &snapshot.id == reference).map(|s| s.line)
        else {
            return LocalTimeline::empty();
        };

        let entries: Vec<&Snapshot> =
            global.iter().filter(|snapshot| snapshot.line == line).collect();
        let local_index = entries.iter().position(|snapshot| &snapshot.id == reference);

        LocalTimeline { line: Some(line), entries, local_index }
    }
}
