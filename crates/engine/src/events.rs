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

//! Outbound navigation events
//!
//! The controller never talks to an editor or a debugger directly. It emits
//! [`NavigationEvent`]s to registered observers and the host wires them to whatever
//! transport it uses (decorations, webview messages, DAP requests, JSON lines).

use std::sync::Arc;

use parking_lot::Mutex;
use pymonitor_common::types::SnapshotId;
use serde::Serialize;

/// Navigation state machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NavigationState {
    /// No snapshots loaded
    Empty,
    /// A snapshot is selected
    Positioned {
        /// Index in the global timeline
        #[serde(rename = "currentStep")]
        current_step: usize,
        /// Index in the local timeline, `None` while local controls are disabled
        #[serde(rename = "localStep")]
        local_step: Option<usize>,
    },
}

/// Event emitted by the navigation controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum NavigationEvent {
    /// The editor should highlight this 1-based line
    HighlightRequested {
        /// Source line
        line: u32,
    },
    /// The navigation state changed
    StateChanged {
        /// New state
        state: NavigationState,
    },
    /// The user asked to load this recorded state into a live debugger
    SnapshotSelectedForStateSync {
        /// Selected snapshot
        id: SnapshotId,
    },
}

/// Receiver of navigation events
pub trait NavigationObserver {
    /// Called synchronously for every emitted event, in emission order
    fn on_event(&mut self, event: &NavigationEvent);
}

impl<F> NavigationObserver for F
where
    F: FnMut(&NavigationEvent),
{
    fn on_event(&mut self, event: &NavigationEvent) {
        self(event)
    }
}

/// Observer that buffers events for later inspection
///
/// Clones share the same buffer, so one clone can be handed to the controller
/// while the host keeps another to drain.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<NavigationEvent>>>,
}

impl EventRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all buffered events
    pub fn events(&self) -> Vec<NavigationEvent> {
        self.events.lock().clone()
    }

    /// Drain the buffer
    pub fn take(&self) -> Vec<NavigationEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Lines of all buffered highlight requests
    pub fn highlighted_lines(&self) -> Vec<u32> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                NavigationEvent::HighlightRequested { line } => Some(*line),
                _ => None,
            })
            .collect()
    }
}

impl NavigationObserver for EventRecorder {
    fn on_event(&mut self, event: &NavigationEvent) {
        self.events.lock().push(event.clone());
    }
}
