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

//! Variable change table over a local timeline
//!
//! Each row is one visit of the line, each column one variable seen on any visit.
//! A cell shows the value only when it changed since the last visit that had the
//! variable; the first visit with a variable always counts as a change.

use std::collections::HashMap;

use itertools::Itertools;
use pymonitor_common::types::{Snapshot, SnapshotId};
use serde::Serialize;

/// One cell of the change table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ChangeCell {
    /// Value differs from the last seen value (or is seen for the first time)
    Changed(String),
    /// Same value as last seen
    Unchanged,
    /// The snapshot has no such variable
    Absent,
}

/// Row of the change table for one local timeline entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableChangeRow {
    /// Snapshot this row was built from
    pub snapshot_id: SnapshotId,
    /// Source line of the snapshot
    pub line: u32,
    /// One cell per column
    pub cells: Vec<ChangeCell>,
}

/// Diff-style table of variable values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeTable {
    /// Variable names, ordinal ascending
    pub columns: Vec<String>,
    /// Rows in local timeline order
    pub rows: Vec<VariableChangeRow>,
}

impl ChangeTable {
    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row` for variable `column`
    pub fn cell(&self, row: usize, column: &str) -> Option<&ChangeCell> {
        let col = self.columns.iter().position(|name| name == column)?;
        self.rows.get(row)?.cells.get(col)
    }
}

/// Builds [`ChangeTable`]s; stateless, every call starts from scratch
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeTableBuilder;

impl ChangeTableBuilder {
    /// Fold a local timeline into a change table
    pub fn build<'a>(local: impl IntoIterator<Item = &'a Snapshot>) -> ChangeTable {
        let local: Vec<&Snapshot> = local.into_iter().collect();

        let columns: Vec<String> = local
            .iter()
            .flat_map(|snapshot| snapshot.locals.keys())
            .sorted()
            .dedup()
            .cloned()
            .collect();

        let rows = {
            let mut last_seen: HashMap<&str, &str> = HashMap::new();
            local
                .iter()
                .map(|snapshot| {
                    let cells = columns
                        .iter()
                        .map(|name| {
                            let Some(var) = snapshot.locals.get(name) else {
                                return ChangeCell::Absent;
                            };
                            if last_seen.get(name.as_str()) == Some(&var.value.as_str()) {
                                ChangeCell::Unchanged
                            } else {
                                last_seen.insert(name.as_str(), var.value.as_str());
                                ChangeCell::Changed(var.value.clone())
                            }
                        })
                        .collect();

                    VariableChangeRow { snapshot_id: snapshot.id.clone(), line: snapshot.line, cells }
                })
                .collect()
        };

        ChangeTable { columns, rows }
    }
}
