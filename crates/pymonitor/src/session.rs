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

//! Interactive navigation session
//!
//! Translates typed commands into navigation intents, and navigation results and
//! events into text. The session is synchronous; the explore loop feeds it stdin
//! lines and live updates, and performs reloads on its behalf.

use eyre::{bail, Result};
use pymonitor_common::types::{ParsedRecording, SnapshotId};
use pymonitor_engine::{EventRecorder, NavigationController, NavigationEvent};
use tracing::{debug, warn};

use crate::{config::DisplayConfig, render};

/// A parsed user command. Steps and visits are 1-based, as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Empty input
    Nothing,
    /// Next global step
    Next,
    /// Previous global step
    Prev,
    /// Global step (0-based after parsing)
    Goto(usize),
    /// First visit of a source line
    Line(u32),
    /// Visit of the current line (0-based after parsing)
    Local(usize),
    /// Next visit of the current line
    LocalNext,
    /// Previous visit of the current line
    LocalPrev,
    /// Print the current frame
    Frame,
    /// Print the change table
    Table,
    /// Print the global timeline
    Timeline,
    /// Ask the debugger to load a snapshot (current one by default)
    Sync(Option<SnapshotId>),
    /// Re-read the recording
    Reload,
    /// Drop the recording
    Clear,
    /// Print help
    Help,
    /// Leave the session
    Quit,
}

impl Command {
    /// Parse one input line
    pub fn parse(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let Some((&name, args)) = parts.split_first() else {
            return Ok(Self::Nothing);
        };

        let command = match (name, args) {
            ("next" | "n", []) => Self::Next,
            ("prev" | "p", []) => Self::Prev,
            ("goto" | "g", [step]) => Self::Goto(parse_position(step, "step")?),
            ("goto" | "g", _) => bail!("Usage: goto <step>"),
            ("line" | "l", [line]) => match line.parse::<u32>() {
                Ok(line) if line > 0 => Self::Line(line),
                _ => bail!("Invalid line number: {line}"),
            },
            ("line" | "l", _) => bail!("Usage: line <line>"),
            ("local", [visit]) => Self::Local(parse_position(visit, "visit")?),
            ("local", _) => bail!("Usage: local <visit>"),
            ("lnext" | "ln", []) => Self::LocalNext,
            ("lprev" | "lp", []) => Self::LocalPrev,
            ("frame" | "f", []) => Self::Frame,
            ("table" | "t", []) => Self::Table,
            ("timeline", []) => Self::Timeline,
            ("sync", []) => Self::Sync(None),
            ("sync", [id]) => Self::Sync(id.parse().ok()),
            ("reload", []) => Self::Reload,
            ("clear", []) => Self::Clear,
            ("help" | "h", _) => Self::Help,
            ("quit" | "q" | "exit", _) => Self::Quit,
            (name, _) => bail!("Unknown command: {name} (type 'help' for available commands)"),
        };
        Ok(command)
    }
}

fn parse_position(text: &str, what: &str) -> Result<usize> {
    match text.parse::<usize>() {
        Ok(position) if position > 0 => Ok(position - 1),
        _ => bail!("Invalid {what}: {text} ({what}s start at 1)"),
    }
}

/// What the driving loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading commands
    Continue,
    /// Re-read the recording and pass it to [`Session::apply_update`]
    Reload,
    /// Stop
    Quit,
}

/// Navigation session over one recording
#[derive(Debug)]
pub struct Session {
    nav: NavigationController,
    events: EventRecorder,
    display: DisplayConfig,
    emit_events: bool,
}

impl Session {
    /// Create an empty session. With `emit_events`, every navigation event is
    /// also printed as a JSON line.
    pub fn new(display: DisplayConfig, emit_events: bool) -> Self {
        let events = EventRecorder::new();
        let mut nav = NavigationController::new();
        nav.subscribe(events.clone());
        Self { nav, events, display, emit_events }
    }

    /// Load a freshly fetched recording
    pub fn load(&mut self, parsed: ParsedRecording) -> String {
        let ParsedRecording { recording, violations } = parsed;
        let count = recording.snapshots.len();

        let mut out = Vec::new();
        let name = match (&recording.function, &recording.file) {
            (Some(function), Some(file)) => format!("{function} ({file})"),
            (Some(function), None) => function.clone(),
            (None, Some(file)) => file.clone(),
            (None, None) => "recording".to_string(),
        };
        if !violations.is_empty() {
            out.push(format!("Dropped {} malformed snapshot record(s)", violations.len()));
        }

        if self.nav.load(recording.snapshots) {
            out.push(format!("Loaded {name}: {count} snapshot(s)"));
            self.flush_events(&mut out);
            out.push(self.position());
        } else {
            out.push(format!("Loaded {name}: recording has no snapshots"));
        }
        out.join("\n")
    }

    /// Apply a live update (follow mode or reload)
    pub fn apply_update(&mut self, parsed: ParsedRecording) -> String {
        let count = parsed.recording.snapshots.len();
        debug!(count, dropped = parsed.violations.len(), "Applying live update");

        self.nav.on_external_update(parsed.recording.snapshots);

        let mut out = vec![format!("Updated: {count} snapshot(s)")];
        self.flush_events(&mut out);
        if count > 0 {
            out.push(self.position());
        }
        out.join("\n")
    }

    /// Execute one input line
    pub fn execute(&mut self, input: &str) -> (Flow, String) {
        let command = match Command::parse(input) {
            Ok(command) => command,
            Err(e) => return (Flow::Continue, format!("Error: {e}")),
        };
        debug!(?command, "Executing command");

        let mut flow = Flow::Continue;
        let text = match command {
            Command::Nothing => String::new(),
            Command::Next => self.navigate(|nav| nav.step_next(), "Already at the last step"),
            Command::Prev => self.navigate(|nav| nav.step_prev(), "Already at the first step"),
            Command::Goto(step) => {
                let len = self.nav.global_length();
                self.navigate(
                    |nav| nav.go_to_step(step),
                    &format!("Step {} is out of range (1..={len})", step + 1),
                )
            }
            Command::Line(line) => {
                self.navigate(|nav| nav.go_to_line(line), &format!("Line {line} was never executed"))
            }
            Command::Local(visit) => {
                let len = self.nav.local_timeline_state().local_length;
                self.navigate(
                    |nav| nav.go_to_local_step(visit),
                    &format!("Visit {} is out of range (1..={len})", visit + 1),
                )
            }
            Command::LocalNext => {
                self.navigate(|nav| nav.local_step_next(), "Already at the last visit of this line")
            }
            Command::LocalPrev => {
                self.navigate(|nav| nav.local_step_prev(), "Already at the first visit of this line")
            }
            Command::Frame => self.position(),
            Command::Table => {
                render::change_table(&self.nav.change_table(), self.nav.local_step(), &self.display)
            }
            Command::Timeline => {
                if self.nav.global_length() == 0 {
                    "No snapshots loaded".to_string()
                } else {
                    render::timeline(&self.nav)
                }
            }
            Command::Sync(id) => {
                let requested = match &id {
                    Some(id) => self.nav.request_state_sync_for(id),
                    None => self.nav.request_state_sync(),
                };
                let mut out = Vec::new();
                self.flush_events(&mut out);
                if !requested {
                    out.push(match id {
                        Some(id) => format!("Snapshot {id} is not part of this recording"),
                        None => "No snapshots loaded".to_string(),
                    });
                }
                out.join("\n")
            }
            Command::Reload => {
                flow = Flow::Reload;
                "Reloading recording...".to_string()
            }
            Command::Clear => {
                self.nav.clear();
                let mut out = Vec::new();
                self.flush_events(&mut out);
                out.push("Recording cleared".to_string());
                out.join("\n")
            }
            Command::Help => help(),
            Command::Quit => {
                flow = Flow::Quit;
                String::new()
            }
        };

        (flow, text)
    }

    fn navigate(
        &mut self,
        op: impl FnOnce(&mut NavigationController) -> bool,
        refused: &str,
    ) -> String {
        if self.nav.global_length() == 0 {
            return "No snapshots loaded".to_string();
        }
        if !op(&mut self.nav) {
            return refused.to_string();
        }

        let mut out = Vec::new();
        self.flush_events(&mut out);
        out.push(self.position());
        out.join("\n")
    }

    fn position(&self) -> String {
        format!(
            "{}\n{}",
            render::frame(&self.nav, &self.display),
            render::local_position(&self.nav)
        )
    }

    /// Turn buffered events into output lines
    fn flush_events(&mut self, out: &mut Vec<String>) {
        for event in self.events.take() {
            if self.emit_events {
                match serde_json::to_string(&event) {
                    Ok(line) => out.push(line),
                    Err(e) => warn!(error = %e, "Failed to serialize navigation event"),
                }
            }
            if let NavigationEvent::SnapshotSelectedForStateSync { id } = event {
                out.push(format!("Requested debugger state sync for snapshot {id}"));
            }
        }
    }
}

fn help() -> String {
    [
        "Available commands:",
        "",
        "Navigation:",
        "  next, n          - Step to next snapshot",
        "  prev, p          - Step to previous snapshot",
        "  goto <step>      - Jump to a step (1-based)",
        "  line <line>      - Jump to the first execution of a source line",
        "  local <visit>    - Jump to a visit of the current line (1-based)",
        "  lnext, ln        - Next visit of the current line",
        "  lprev, lp        - Previous visit of the current line",
        "",
        "Inspection:",
        "  frame, f         - Show the current frame",
        "  table, t         - Show how variables change across visits of this line",
        "  timeline         - Show all steps",
        "",
        "Debugger:",
        "  sync [id]        - Load a snapshot into the live debugger",
        "",
        "Other:",
        "  reload           - Re-read the recording",
        "  clear            - Drop the recording",
        "  help, h          - Show this help",
        "  quit, q, exit    - Exit",
    ]
    .join("\n")
}
