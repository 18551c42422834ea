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

// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
// SPDX-License-Identifier: AGPL-3.0
//! PyMonitor Common - Shared functionality for PyMonitor components
//!
//! This crate provides the recording data model used by both the navigation
//! engine and the command-line host, plus logging setup.

/// Snapshot and recording types, including validation of raw backend records
pub mod types;

/// Logging setup and utilities for consistent logging across PyMonitor components
pub mod logging;
/// Fixture builders for tests of PyMonitor components
pub mod test_utils;

pub use logging::*;
