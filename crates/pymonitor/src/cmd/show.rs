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

//! Show command - print one position of a recording and exit

use eyre::{bail, Result};
use pymonitor_common::types::{Recording, Snapshot};
use pymonitor_engine::{ChangeTable, LocalTimelineState, NavigationController};
use serde::Serialize;

use crate::{cmd::fetch_recording, config::Config, render};

/// Where to position before printing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// First snapshot
    Start,
    /// Global step, 0-based
    Step(usize),
    /// First execution of a line
    Line(u32),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowOutput<'a> {
    function: Option<&'a str>,
    file: Option<&'a str>,
    global_length: usize,
    current_step: Option<usize>,
    frame: Option<&'a Snapshot>,
    local_timeline: LocalTimelineState,
    change_table: ChangeTable,
}

/// Print the frame, local position and change table at `position`
pub async fn show_recording(
    source_arg: &str,
    position: Position,
    json: bool,
    config: &Config,
) -> Result<()> {
    let (_, _, parsed) = fetch_recording(source_arg, config).await?;
    let Recording { function, file, snapshots } = parsed.recording;

    let mut nav = NavigationController::new();
    nav.load(snapshots);
    let text = render_position(&mut nav, position, json, config)?;

    if json {
        let output = ShowOutput {
            function: function.as_deref(),
            file: file.as_deref(),
            global_length: nav.global_length(),
            current_step: nav.current_step(),
            frame: nav.current_frame(),
            local_timeline: nav.local_timeline_state(),
            change_table: nav.change_table(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{text}");
    }
    Ok(())
}

/// Position `nav` and render it as text
fn render_position(
    nav: &mut NavigationController,
    position: Position,
    json: bool,
    config: &Config,
) -> Result<String> {
    match position {
        Position::Start if nav.global_length() == 0 => {
            if json {
                return Ok(String::new());
            }
            return Ok("Recording has no snapshots".to_string());
        }
        Position::Start => {}
        Position::Step(step) => {
            if !nav.go_to_step(step) {
                match nav.global_length() {
                    0 => bail!("Step {} is out of range: recording has no snapshots", step + 1),
                    len => bail!("Step {} is out of range (1..={len})", step + 1),
                }
            }
        }
        Position::Line(line) => {
            if !nav.go_to_line(line) {
                bail!("Line {line} was never executed");
            }
        }
    }

    Ok([
        render::frame(nav, &config.display),
        render::local_position(nav),
        String::new(),
        render::change_table(&nav.change_table(), nav.local_step(), &config.display),
    ]
    .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pymonitor_common::test_utils::snapshots_at_lines;

    #[test]
    fn test_render_position() {
        let config = Config::default();
        let mut nav = NavigationController::new();
        nav.load(snapshots_at_lines(&[1, 2, 1]));

        let text = render_position(&mut nav, Position::Line(2), false, &config).unwrap();
        assert!(text.starts_with("Step 2/3 · line 2 · id s1"));
        assert!(text.contains("Line 2 · visit 1 of 1"));
        assert!(text.ends_with("No variables on this line"));

        assert!(render_position(&mut nav, Position::Step(3), false, &config).is_err());
        assert!(render_position(&mut nav, Position::Line(7), false, &config).is_err());
        assert_eq!(nav.current_step(), Some(1));
    }

    #[test]
    fn test_render_empty_recording() {
        let config = Config::default();
        let mut nav = NavigationController::new();
        let text = render_position(&mut nav, Position::Start, false, &config).unwrap();
        assert_eq!(text, "Recording has no snapshots");

        assert!(render_position(&mut nav, Position::Step(4), false, &config).is_err());
        assert!(render_position(&mut nav, Position::Line(1), true, &config).is_err());
    }
}
