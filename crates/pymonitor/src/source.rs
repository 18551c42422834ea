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

//! Recording sources
//!
//! A recording is read from a JSON file or fetched from the monitoring API. In
//! follow mode the source is polled and every changed document is parsed and
//! handed to the session as a live update.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;
use pymonitor_common::types::{parse_recording, ParsedRecording, RecordingError};
use thiserror::Error;
use tokio::{sync::mpsc, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::SourceConfig;

/// Failure to obtain a recording
#[derive(Debug, Error)]
pub enum SourceError {
    /// The recording file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The HTTP request failed
    #[error("request to {url} failed: {source}")]
    Http {
        /// Requested URL
        url: String,
        /// Underlying error
        #[source]
        source: reqwest::Error,
    },
    /// The API answered with a non-success status
    #[error("{url} answered with HTTP {status}")]
    Status {
        /// Requested URL
        url: String,
        /// Response status code
        status: u16,
    },
    /// The document is not a recording
    #[error(transparent)]
    Recording(#[from] RecordingError),
}

/// Where a recording comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingSource {
    /// Local JSON file
    File(PathBuf),
    /// HTTP endpoint returning the recording JSON
    Url(String),
}

impl fmt::Display for RecordingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

impl RecordingSource {
    /// Interpret a source argument.
    ///
    /// `http(s)://` arguments are URLs. Existing paths are files. Anything else is
    /// resolved against the configured API base URL, or treated as a file path
    /// when there is none.
    pub fn resolve(arg: &str, config: &SourceConfig) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            return Self::Url(arg.to_string());
        }

        if Path::new(arg).exists() {
            return Self::File(PathBuf::from(arg));
        }

        match &config.api_url {
            Some(base) => Self::Url(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                arg.trim_start_matches('/')
            )),
            None => Self::File(PathBuf::from(arg)),
        }
    }

    /// Read the raw recording document
    pub async fn fetch_text(&self, timeout: Duration) -> Result<String, SourceError> {
        match self {
            Self::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|source| SourceError::Io { path: path.clone(), source }),
            Self::Url(url) => {
                let http_err = |source| SourceError::Http { url: url.clone(), source };
                let client = reqwest::Client::builder().timeout(timeout).build().map_err(http_err)?;
                let response = client.get(url).send().await.map_err(http_err)?;

                let status = response.status();
                if !status.is_success() {
                    return Err(SourceError::Status { url: url.clone(), status: status.as_u16() });
                }
                response.text().await.map_err(http_err)
            }
        }
    }

    /// Read and validate the recording, returning the raw document alongside
    pub async fn fetch(
        &self,
        timeout: Duration,
    ) -> Result<(String, ParsedRecording), SourceError> {
        let text = self.fetch_text(timeout).await?;
        let parsed = parse_recording(&text)?;
        debug!(source = %self, snapshots = parsed.recording.snapshots.len(), "Fetched recording");
        Ok((text, parsed))
    }
}

/// Text of the recording document the session currently shows.
///
/// Shared between the follow task and manual reloads, so a document is applied
/// once no matter which path fetched it first.
#[derive(Debug, Clone, Default)]
pub struct AppliedDocument(Arc<Mutex<Option<String>>>);

impl AppliedDocument {
    /// Start from the document the session was loaded from
    pub fn new(text: String) -> Self {
        Self(Arc::new(Mutex::new(Some(text))))
    }

    /// Record `text` as applied
    pub fn set(&self, text: String) {
        *self.0.lock() = Some(text);
    }

    /// Whether `text` differs from the applied document
    pub fn differs_from(&self, text: &str) -> bool {
        self.0.lock().as_deref() != Some(text)
    }
}

/// Poll `source` and send every changed, parseable document to `updates`.
///
/// Documents equal to `applied` are skipped; sent ones become the new `applied`.
/// Failed polls are logged and retried on the next tick. Returns when the receiver
/// is dropped.
pub async fn follow(
    source: RecordingSource,
    applied: AppliedDocument,
    interval: Duration,
    timeout: Duration,
    updates: mpsc::Sender<ParsedRecording>,
) {
    info!(%source, ?interval, "Following recording for live updates");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick fires immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if updates.is_closed() {
            debug!("Live update receiver dropped, stopping follow task");
            return;
        }

        let text = match source.fetch_text(timeout).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to poll recording");
                continue;
            }
        };
        if !applied.differs_from(&text) {
            continue;
        }

        match parse_recording(&text) {
            Ok(parsed) => {
                applied.set(text);
                if updates.send(parsed).await.is_err() {
                    return;
                }
            }
            // a writer may be halfway through the file; try again next tick
            Err(e) => debug!(error = %e, "Ignoring unreadable recording update"),
        }
    }
}
