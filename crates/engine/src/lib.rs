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

//! PyMonitor Engine - snapshot navigation over recorded Python calls
//!
//! A recorded call is a chronological sequence of snapshots. The engine keeps two
//! synchronized cursors over it:
//!
//! - the **global** cursor over the whole sequence, and
//! - the **local** cursor over the visits of the line the global cursor is on.
//!
//! [`NavigationController`] is the entry point. It applies navigation commands,
//! derives the local timeline and change table on demand, and reports highlight and
//! state-sync requests to [`NavigationObserver`]s. All operations are synchronous.

/// Variable change table over a local timeline
pub mod change_table;
/// The navigation state machine
pub mod controller;
/// Outbound events and observers
pub mod events;
/// Local timeline projection
pub mod projector;
/// Global timeline storage
pub mod store;

pub use change_table::{ChangeCell, ChangeTable, ChangeTableBuilder, VariableChangeRow};
pub use controller::{LocalTimelineState, NavigationController};
pub use events::{EventRecorder, NavigationEvent, NavigationObserver, NavigationState};
pub use projector::{LocalTimeline, LocalTimelineProjector};
pub use store::SnapshotStore;
