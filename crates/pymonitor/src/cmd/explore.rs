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

//! Explore command - interactive navigation with optional live updates

use eyre::Result;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};

use crate::{
    cmd::fetch_recording,
    config::Config,
    session::{Flow, Session},
    source::{self, AppliedDocument},
};

/// Run an interactive session over stdin.
///
/// With `follow`, the source is polled in a background task and every changed
/// document is applied as a live update between commands.
pub async fn explore_recording(
    source_arg: &str,
    follow: bool,
    emit_events: bool,
    config: &Config,
) -> Result<()> {
    let (source, text, parsed) = fetch_recording(source_arg, config).await?;
    let timeout = config.source.request_timeout();

    let mut session = Session::new(config.display.clone(), emit_events);
    print_output(&session.load(parsed));
    println!("Type 'help' for available commands");

    let applied = AppliedDocument::new(text);
    let (updates_tx, mut updates_rx) = mpsc::channel(8);
    let follow_handle = if follow {
        Some(tokio::spawn(source::follow(
            source.clone(),
            applied.clone(),
            config.follow.poll_interval(),
            timeout,
            updates_tx,
        )))
    } else {
        drop(updates_tx);
        None
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("Input closed, leaving session");
                    break;
                };

                let (flow, output) = session.execute(&line);
                print_output(&output);
                match flow {
                    Flow::Continue => {}
                    Flow::Quit => break,
                    Flow::Reload => match source.fetch(timeout).await {
                        Ok((text, parsed)) => {
                            applied.set(text);
                            print_output(&session.apply_update(parsed));
                        }
                        Err(e) => println!("Error: {e}"),
                    },
                }
            }
            Some(update) = updates_rx.recv() => {
                print_output(&session.apply_update(update));
            }
        }
    }

    if let Some(handle) = follow_handle {
        handle.abort();
    }
    Ok(())
}

fn print_output(output: &str) {
    if !output.is_empty() {
        println!("{output}");
    }
}
