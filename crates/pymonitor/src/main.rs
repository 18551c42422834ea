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

//! PyMonitor - Python Execution Recording Navigator
//!
//! Navigate a recorded Python function call snapshot by snapshot, along the global
//! timeline or through the visits of a single source line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::Result;
use tracing::Level;

mod cmd;
mod config;
mod render;
mod session;
mod source;

use config::Config;

/// Command-line interface for PyMonitor
#[derive(Debug, Parser)]
#[command(name = "pymonitor")]
#[command(about = "PyMonitor - Navigate recorded Python function executions")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: ~/.pymonitor.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the monitoring API serving recordings
    #[arg(long, env = "PYMONITOR_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Also write logs to a rotating file under the temp directory
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print one position of a recording
    Show {
        /// Recording file, URL, or call id on the monitoring API
        source: String,

        /// Global step to show (1-based)
        #[arg(long, conflicts_with = "line")]
        step: Option<usize>,

        /// Show the first execution of this line
        #[arg(long)]
        line: Option<u32>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Navigate a recording interactively
    Explore {
        /// Recording file, URL, or call id on the monitoring API
        source: String,

        /// Poll the source and apply live updates
        #[arg(long)]
        follow: bool,

        /// Print every navigation event as a JSON line
        #[arg(long)]
        emit_events: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    if let Some(log_path) = pymonitor_common::init_logging("pymonitor", Level::WARN, cli.log_file)?
    {
        tracing::info!("Writing logs to {}", log_path.display());
    }

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {e}");
            Config::default()
        }),
    }
    .with_api_url(cli.api_url.clone());

    match &cli.command {
        Commands::Show { source, step, line, json } => {
            let position = match (step, line) {
                (Some(0), _) => eyre::bail!("Steps start at 1"),
                (Some(step), _) => cmd::show::Position::Step(step - 1),
                (None, Some(line)) => cmd::show::Position::Line(*line),
                (None, None) => cmd::show::Position::Start,
            };
            cmd::show_recording(source, position, *json, &config).await
        }
        Commands::Explore { source, follow, emit_events } => {
            cmd::explore_recording(source, *follow, *emit_events, &config).await
        }
    }
}
