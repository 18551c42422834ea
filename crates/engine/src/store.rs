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

//! Snapshot store for one traced call
//!
//! The store owns the global timeline (the chronological snapshot sequence) and the
//! global cursor. It never reorders what it is given and is always replaced
//! wholesale. Observable changes are surfaced by the navigation controller, not here.

use std::collections::{hash_map::Entry, HashMap};

use pymonitor_common::types::{Snapshot, SnapshotId};
use tracing::{debug, trace, warn};

/// Global timeline plus cursor
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    snapshots: Vec<Snapshot>,
    /// Id -> global index
    positions: HashMap<SnapshotId, usize>,
    cursor: usize,
}

impl SnapshotStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sequence wholesale and reset the cursor to the first snapshot.
    ///
    /// Loading an empty sequence is a no-op and leaves the previous data in place.
    /// Returns whether the data was loaded.
    pub fn load(&mut self, snapshots: Vec<Snapshot>) -> bool {
        if snapshots.is_empty() {
            debug!("Ignoring load of an empty snapshot sequence");
            return false;
        }

        self.set_snapshots(snapshots);
        self.cursor = 0;
        true
    }

    /// Replace the sequence with live data.
    ///
    /// When the sequence grew, the cursor follows the latest snapshot. Otherwise it
    /// stays put unless it is now out of bounds, in which case it is clamped to the
    /// last snapshot. Replacing into an empty store positions at the first snapshot.
    pub fn replace(&mut self, snapshots: Vec<Snapshot>) {
        let old_len = self.snapshots.len();
        self.set_snapshots(snapshots);
        let new_len = self.snapshots.len();

        self.cursor = if new_len == 0 || old_len == 0 {
            0
        } else if new_len > old_len {
            new_len - 1
        } else {
            self.cursor.min(new_len - 1)
        };

        debug!(old_len, new_len, cursor = self.cursor, "Replaced snapshot sequence");
    }

    /// Drop all snapshots
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.positions.clear();
        self.cursor = 0;
    }

    /// Install a new sequence. Ids must be unique; later repeats are dropped.
    fn set_snapshots(&mut self, snapshots: Vec<Snapshot>) {
        self.positions.clear();
        self.snapshots.clear();
        self.snapshots.reserve(snapshots.len());

        for (position, snapshot) in snapshots.into_iter().enumerate() {
            match self.positions.entry(snapshot.id.clone()) {
                Entry::Occupied(_) => {
                    warn!(position, id = %snapshot.id, "Dropping snapshot with a repeated id");
                }
                Entry::Vacant(slot) => {
                    slot.insert(self.snapshots.len());
                    self.snapshots.push(snapshot);
                }
            }
        }
    }

    /// Snapshot under the cursor
    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.cursor)
    }

    /// Cursor position, `None` when empty
    pub fn cursor(&self) -> Option<usize> {
        (!self.snapshots.is_empty()).then_some(self.cursor)
    }

    /// Move the cursor. Out-of-range targets are ignored.
    pub fn set_cursor(&mut self, step: usize) -> bool {
        if step >= self.snapshots.len() {
            trace!(step, len = self.snapshots.len(), "Cursor target out of bounds");
            return false;
        }
        self.cursor = step;
        true
    }

    /// Number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether no snapshot is loaded
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshot at a global index
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// The whole global timeline
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Global index of the snapshot with this id
    pub fn index_of(&self, id: &SnapshotId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Lowest global index whose snapshot is at `line`
    pub fn first_index_of_line(&self, line: u32) -> Option<usize> {
        self.snapshots.iter().position(|snapshot| snapshot.line == line)
    }
}
