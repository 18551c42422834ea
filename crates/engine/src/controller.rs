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

//! Dual-timeline navigation controller
//!
//! `NavigationController` is the single source of navigation truth. It owns the
//! [`SnapshotStore`] (global timeline and cursor) and the derived local timeline,
//! applies navigation commands, and emits [`NavigationEvent`]s.
//!
//! # State machine
//!
//! - `Empty`: no snapshots loaded; every navigation command is a no-op
//! - `Positioned { current_step, local_step }`: a snapshot is selected
//!
//! `Empty -> Positioned(0, _)` happens on `load`/`on_external_update` with data,
//! `Positioned -> Empty` when an update delivers no data or on `clear`.
//!
//! # Failure semantics
//!
//! Navigation is driven by user input and by slider races, so out-of-range and
//! empty-state requests are expected. They are ignored: the command returns `false`
//! and no event is emitted. Nothing here panics or returns an error.

use std::fmt;

use pymonitor_common::types::{Snapshot, SnapshotId};
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::{
    change_table::{ChangeTable, ChangeTableBuilder},
    events::{NavigationEvent, NavigationObserver, NavigationState},
    projector::{LocalTimeline, LocalTimelineProjector},
    store::SnapshotStore,
};

/// Bounds and position of the local timeline, for the local slider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalTimelineState {
    /// Number of visits of the current line
    pub local_length: usize,
    /// Position among those visits, `None` while local controls are disabled
    pub local_step: Option<usize>,
}

/// Navigation over one recorded call
///
/// # Usage Pattern
///
/// ```ignore
/// let recorder = EventRecorder::new();
/// let mut nav = NavigationController::new();
/// nav.subscribe(recorder.clone());
///
/// nav.load(snapshots);
/// nav.go_to_line(12);
/// let table = nav.change_table();
/// ```
pub struct NavigationController {
    store: SnapshotStore,

    /// Ids of the local timeline entries, in order
    local_ids: Vec<SnapshotId>,
    local_step: Option<usize>,

    observers: Vec<Box<dyn NavigationObserver>>,
}

impl fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationController")
            .field("store", &self.store)
            .field("local_ids", &self.local_ids)
            .field("local_step", &self.local_step)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new()
    }
}

// Data management
impl NavigationController {
    /// Create a controller in the `Empty` state
    pub fn new() -> Self {
        Self {
            store: SnapshotStore::new(),
            local_ids: Vec::new(),
            local_step: None,
            observers: Vec::new(),
        }
    }

    /// Register an observer for navigation events
    pub fn subscribe(&mut self, observer: impl NavigationObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Load the recording of a freshly explored call and select its first snapshot.
    ///
    /// An empty sequence is ignored and the current data stays in place.
    pub fn load(&mut self, snapshots: Vec<Snapshot>) -> bool {
        if !self.store.load(snapshots) {
            return false;
        }

        info!(count = self.store.len(), "Loaded snapshots");
        self.refresh_local();
        self.announce();
        true
    }

    /// Apply live data pushed while a debugger is producing frames.
    ///
    /// Last write wins. The cursor follows growth and is clamped on shrink; the
    /// highlight is re-emitted for the (possibly new) current line.
    pub fn on_external_update(&mut self, snapshots: Vec<Snapshot>) {
        self.store.replace(snapshots);
        debug!(count = self.store.len(), step = ?self.store.cursor(), "Applied external update");

        self.refresh_local();
        self.announce();
    }

    /// Discard the current recording (e.g., back to the call list)
    pub fn clear(&mut self) {
        self.store.clear();
        self.refresh_local();
        self.announce();
    }

    fn refresh_local(&mut self) {
        let projection = match self.store.current() {
            Some(current) => LocalTimelineProjector::project(self.store.snapshots(), &current.id),
            None => LocalTimeline::empty(),
        };

        self.local_ids = projection.ids();
        self.local_step = projection.local_index;
    }

    fn announce(&mut self) {
        if let Some(line) = self.store.current().map(|snapshot| snapshot.line) {
            self.emit(NavigationEvent::HighlightRequested { line });
        }
        let state = self.state();
        self.emit(NavigationEvent::StateChanged { state });
    }

    fn emit(&mut self, event: NavigationEvent) {
        trace!(?event, "Emitting navigation event");
        for observer in self.observers.iter_mut() {
            observer.on_event(&event);
        }
    }
}

// Navigation
impl NavigationController {
    /// Select the snapshot at a global index
    pub fn go_to_step(&mut self, step: usize) -> bool {
        if !self.store.set_cursor(step) {
            return false;
        }

        debug!(step, "Moved to step");
        self.refresh_local();
        self.announce();
        true
    }

    /// Select the next snapshot; no-op on the last one
    pub fn step_next(&mut self) -> bool {
        match self.store.cursor() {
            Some(step) => self.go_to_step(step + 1),
            None => false,
        }
    }

    /// Select the previous snapshot; no-op on the first one
    pub fn step_prev(&mut self) -> bool {
        match self.store.cursor().and_then(|step| step.checked_sub(1)) {
            Some(step) => self.go_to_step(step),
            None => false,
        }
    }

    /// Select the `local_index`-th visit of the current line
    pub fn go_to_local_step(&mut self, local_index: usize) -> bool {
        if self.local_step.is_none() {
            debug!(local_index, "Local timeline controls are disabled");
            return false;
        }

        let Some(step) = self.local_ids.get(local_index).and_then(|id| self.store.index_of(id))
        else {
            trace!(local_index, len = self.local_ids.len(), "Local step out of bounds");
            return false;
        };

        self.go_to_step(step)
    }

    /// Select the next visit of the current line
    pub fn local_step_next(&mut self) -> bool {
        match self.local_step {
            Some(local) => self.go_to_local_step(local + 1),
            None => false,
        }
    }

    /// Select the previous visit of the current line
    pub fn local_step_prev(&mut self) -> bool {
        match self.local_step.and_then(|local| local.checked_sub(1)) {
            Some(local) => self.go_to_local_step(local),
            None => false,
        }
    }

    /// Jump to the first time execution reached `line`
    pub fn go_to_line(&mut self, line: u32) -> bool {
        match self.store.first_index_of_line(line) {
            Some(step) => self.go_to_step(step),
            None => {
                trace!(line, "Line was never executed");
                false
            }
        }
    }

    /// Ask the debugger-sync collaborator to load the current snapshot
    pub fn request_state_sync(&mut self) -> bool {
        let Some(id) = self.store.current().map(|snapshot| snapshot.id.clone()) else {
            return false;
        };
        self.emit(NavigationEvent::SnapshotSelectedForStateSync { id });
        true
    }

    /// Ask the debugger-sync collaborator to load a specific snapshot of this recording
    pub fn request_state_sync_for(&mut self, id: &SnapshotId) -> bool {
        if self.store.index_of(id).is_none() {
            debug!(%id, "Ignoring state sync request for unknown snapshot");
            return false;
        }
        self.emit(NavigationEvent::SnapshotSelectedForStateSync { id: id.clone() });
        true
    }
}

// Queries
impl NavigationController {
    /// Current state machine state
    pub fn state(&self) -> NavigationState {
        match self.store.cursor() {
            Some(current_step) => {
                NavigationState::Positioned { current_step, local_step: self.local_step }
            }
            None => NavigationState::Empty,
        }
    }

    /// Global cursor, `None` when empty
    pub fn current_step(&self) -> Option<usize> {
        self.store.cursor()
    }

    /// Local cursor, `None` when empty or disabled
    pub fn local_step(&self) -> Option<usize> {
        self.local_step
    }

    /// Length of the global timeline
    pub fn global_length(&self) -> usize {
        self.store.len()
    }

    /// The whole global timeline
    pub fn snapshots(&self) -> &[Snapshot] {
        self.store.snapshots()
    }

    /// Snapshot at the global cursor
    pub fn current_frame(&self) -> Option<&Snapshot> {
        self.store.current()
    }

    /// Visits of the current line
    pub fn local_timeline(&self) -> LocalTimeline<'_> {
        let entries: Vec<&Snapshot> = self
            .local_ids
            .iter()
            .filter_map(|id| self.store.index_of(id).and_then(|index| self.store.get(index)))
            .collect();

        LocalTimeline {
            line: self.store.current().map(|snapshot| snapshot.line),
            entries,
            local_index: self.local_step,
        }
    }

    /// Bounds and position of the local timeline
    pub fn local_timeline_state(&self) -> LocalTimelineState {
        LocalTimelineState { local_length: self.local_ids.len(), local_step: self.local_step }
    }

    /// Change table of the current local timeline
    pub fn change_table(&self) -> ChangeTable {
        ChangeTableBuilder::build(self.local_timeline().entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventRecorder;
    use pymonitor_common::test_utils::{snapshots_at_lines, snapshots_with_ids};

    fn controller_with(lines: &[u32]) -> (NavigationController, EventRecorder) {
        let recorder = EventRecorder::new();
        let mut nav = NavigationController::new();
        nav.subscribe(recorder.clone());
        nav.load(snapshots_at_lines(lines));
        recorder.take();
        (nav, recorder)
    }

    #[test]
    fn test_load_emits_highlight_then_state() {
        let recorder = EventRecorder::new();
        let mut nav = NavigationController::new();
        nav.subscribe(recorder.clone());

        assert!(nav.load(snapshots_at_lines(&[4, 5])));
        assert_eq!(
            recorder.take(),
            vec![
                NavigationEvent::HighlightRequested { line: 4 },
                NavigationEvent::StateChanged {
                    state: NavigationState::Positioned { current_step: 0, local_step: Some(0) }
                },
            ]
        );
    }

    #[test]
    fn test_rejected_commands_emit_nothing() {
        let (mut nav, recorder) = controller_with(&[1, 2]);

        assert!(!nav.go_to_step(2));
        assert!(!nav.step_prev());
        assert!(!nav.go_to_line(99));
        assert!(!nav.go_to_local_step(1));
        assert!(recorder.events().is_empty());
        assert_eq!(nav.current_step(), Some(0));
    }

    #[test]
    fn test_local_steps_walk_visits_of_line() {
        let (mut nav, recorder) = controller_with(&[3, 7, 3, 9, 3]);

        assert!(nav.local_step_next());
        assert_eq!(nav.current_step(), Some(2));
        assert!(nav.local_step_next());
        assert_eq!(nav.current_step(), Some(4));
        assert!(!nav.local_step_next());
        assert!(nav.local_step_prev());
        assert_eq!(
            nav.local_timeline_state(),
            LocalTimelineState { local_length: 3, local_step: Some(1) }
        );
        assert_eq!(recorder.highlighted_lines(), vec![3, 3, 3]);
    }

    #[test]
    fn test_local_mapping_uses_ids_with_integer_ids() {
        let recorder = EventRecorder::new();
        let mut nav = NavigationController::new();
        nav.subscribe(recorder);
        nav.load(snapshots_with_ids(&[(10, 1), (20, 2), (30, 1)]));

        assert!(nav.go_to_local_step(1));
        assert_eq!(nav.current_frame().map(|s| s.id.clone()), Some(SnapshotId::Int(30)));
    }

    #[test]
    fn test_state_sync_requests() {
        let (mut nav, recorder) = controller_with(&[1, 2]);

        assert!(nav.request_state_sync());
        assert!(nav.request_state_sync_for(&SnapshotId::from("s1")));
        assert!(!nav.request_state_sync_for(&SnapshotId::from("nope")));
        assert_eq!(
            recorder.take(),
            vec![
                NavigationEvent::SnapshotSelectedForStateSync { id: "s0".into() },
                NavigationEvent::SnapshotSelectedForStateSync { id: "s1".into() },
            ]
        );
        // syncing never moves the cursor
        assert_eq!(nav.current_step(), Some(0));

        nav.clear();
        assert!(!nav.request_state_sync());
    }

    #[test]
    fn test_clear_returns_to_empty() {
        let (mut nav, recorder) = controller_with(&[1, 2]);
        nav.clear();

        assert_eq!(nav.state(), NavigationState::Empty);
        assert_eq!(nav.local_timeline_state(), LocalTimelineState::default());
        assert!(nav.change_table().is_empty());
        assert_eq!(
            recorder.take(),
            vec![NavigationEvent::StateChanged { state: NavigationState::Empty }]
        );
    }
}
