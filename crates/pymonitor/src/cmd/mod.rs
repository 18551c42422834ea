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

//! Command modules for the PyMonitor CLI

pub mod explore;
pub mod show;

pub use explore::explore_recording;
pub use show::show_recording;

use eyre::{Result, WrapErr};
use pymonitor_common::types::ParsedRecording;

use crate::{config::Config, source::RecordingSource};

/// Resolve and fetch the recording named on the command line
pub(crate) async fn fetch_recording(
    source_arg: &str,
    config: &Config,
) -> Result<(RecordingSource, String, ParsedRecording)> {
    let source = RecordingSource::resolve(source_arg, &config.source);
    tracing::info!("Loading recording from {source}");

    let text = source
        .fetch_text(config.source.request_timeout())
        .await
        .wrap_err_with(|| format!("Failed to load recording from {source}"))?;
    let parsed = pymonitor_common::types::parse_recording(&text)
        .wrap_err_with(|| format!("Failed to parse recording from {source}"))?;

    if !parsed.violations.is_empty() {
        tracing::warn!("Dropped {} malformed snapshot record(s)", parsed.violations.len());
    }
    Ok((source, text, parsed))
}
