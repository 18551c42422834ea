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

//! Plain-text rendering of navigation state

use pymonitor_engine::{ChangeCell, ChangeTable, NavigationController};
use tabled::{
    builder::Builder,
    settings::{object::Columns, Modify, Padding, Style},
};

use crate::config::DisplayConfig;

/// Current frame: position header plus locals
pub fn frame(nav: &NavigationController, display: &DisplayConfig) -> String {
    let (Some(step), Some(snapshot)) = (nav.current_step(), nav.current_frame()) else {
        return "No snapshots loaded".to_string();
    };

    let mut header = format!(
        "Step {}/{} · line {} · id {}",
        step + 1,
        nav.global_length(),
        snapshot.line,
        snapshot.id
    );
    if let Some(time) = snapshot.display_time() {
        header.push_str(&format!(" · {time}"));
    }

    let mut lines = vec![header];
    if snapshot.locals.is_empty() {
        lines.push("  (no locals)".to_string());
    }
    for (name, var) in &snapshot.locals {
        let value = truncate(&var.value, display.max_value_width);
        if display.show_types && !var.type_name.is_empty() {
            lines.push(format!("  {name}: {} = {value}", var.type_name));
        } else {
            lines.push(format!("  {name} = {value}"));
        }
    }
    lines.join("\n")
}

/// Position within the visits of the current line
pub fn local_position(nav: &NavigationController) -> String {
    let Some(line) = nav.current_frame().map(|snapshot| snapshot.line) else {
        return "No local timeline".to_string();
    };

    let state = nav.local_timeline_state();
    match state.local_step {
        Some(local) => format!("Line {line} · visit {} of {}", local + 1, state.local_length),
        None => format!("Line {line} · local timeline unavailable"),
    }
}

/// Whole global timeline; `>` marks the current step, `*` other visits of its line
pub fn timeline(nav: &NavigationController) -> String {
    let current_line = nav.current_frame().map(|snapshot| snapshot.line);

    nav.snapshots()
        .iter()
        .enumerate()
        .map(|(step, snapshot)| {
            let marker = if Some(step) == nav.current_step() {
                '>'
            } else if Some(snapshot.line) == current_line {
                '*'
            } else {
                ' '
            };
            format!("{marker} {:>4}  line {:<5} {}", step + 1, snapshot.line, snapshot.id)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Change table with columns aligned by display width; `local_step` row is marked with `>`
pub fn change_table(
    table: &ChangeTable,
    local_step: Option<usize>,
    display: &DisplayConfig,
) -> String {
    if table.is_empty() {
        return "No visits to compare".to_string();
    }
    if table.columns.is_empty() {
        return "No variables on this line".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(std::iter::once("visit".to_string()).chain(table.columns.iter().cloned()));
    for (index, row) in table.rows.iter().enumerate() {
        let marker = if Some(index) == local_step { ">" } else { " " };
        let cells = row.cells.iter().map(|cell| match cell {
            ChangeCell::Changed(value) => truncate(value, display.max_value_width),
            ChangeCell::Unchanged => display.unchanged_marker.clone(),
            ChangeCell::Absent => display.absent_marker.clone(),
        });
        builder.push_record(std::iter::once(format!("{marker}{}", index + 1)).chain(cells));
    }

    let rendered = builder
        .build()
        .with(Style::empty().vertical('|'))
        .with(Modify::new(Columns::first()).with(Padding::new(0, 1, 0, 0)))
        .to_string();

    rendered.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

/// Shorten `value` to `width` characters, marking the cut with `…`
pub fn truncate(value: &str, width: usize) -> String {
    if width == 0 || value.chars().count() <= width {
        return value.to_string();
    }
    let kept: String = value.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pymonitor_common::types::Snapshot;

    fn nav() -> NavigationController {
        let mut nav = NavigationController::new();
        nav.load(vec![
            Snapshot::new("a", 3)
                .with_local("n", "1", "int")
                .with_timestamp("2024-05-01T10:00:00Z"),
            Snapshot::new("b", 4),
            Snapshot::new("c", 3).with_local("n", "1", "int").with_local("s", "'x'", "str"),
        ]);
        nav
    }

    #[test]
    fn test_frame() {
        let nav = nav();
        let display = DisplayConfig::default();
        assert_eq!(frame(&nav, &display), "Step 1/3 · line 3 · id a · 10:00:00.000\n  n: int = 1");

        let untyped = DisplayConfig { show_types: false, ..DisplayConfig::default() };
        assert!(frame(&nav, &untyped).ends_with("  n = 1"));
        assert_eq!(frame(&NavigationController::new(), &display), "No snapshots loaded");
    }

    #[test]
    fn test_local_position_and_timeline() {
        let mut nav = nav();
        nav.go_to_step(2);
        assert_eq!(local_position(&nav), "Line 3 · visit 2 of 2");
        assert_eq!(
            timeline(&nav),
            "*    1  line 3     a\n     2  line 4     b\n>    3  line 3     c"
        );
    }

    #[test]
    fn test_change_table_rendering() {
        let nav = nav();
        let rendered = change_table(&nav.change_table(), Some(0), &DisplayConfig::default());
        assert_eq!(rendered, "visit | n | s\n>1    | 1 | -\n 2    | · | 'x'");
    }

    #[test]
    fn test_change_table_aligns_wide_characters() {
        let mut nav = NavigationController::new();
        nav.load(vec![
            Snapshot::new("a", 3).with_local("s", "'日本語'", "str").with_local("t", "1", "int"),
            Snapshot::new("b", 3).with_local("s", "'abcde'", "str").with_local("t", "2", "int"),
        ]);

        let rendered = change_table(&nav.change_table(), Some(0), &DisplayConfig::default());
        assert_eq!(
            rendered,
            "visit | s        | t\n>1    | '日本語' | 1\n 2    | 'abcde'  | 2"
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
        assert_eq!(truncate("abcdef", 0), "abcdef");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }
}
