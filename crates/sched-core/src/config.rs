// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scheduler configuration loaded from TOML files or constructed
//! programmatically.
//!
//! The daemon's command line carries only the socket path; everything
//! else lives here with defaults chosen for the target board.
//!
//! # TOML Format
//! ```toml
//! socket_path = "/tmp/coex_sched.sock"
//! monitor_enabled = true
//! monitor_interval_ms = 500
//! ```

use std::path::{Path, PathBuf};

/// Configuration for the scheduler daemon.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SchedulerConfig {
    /// Filesystem path of the scheduler's datagram endpoint.
    pub socket_path: PathBuf,
    /// Whether to run the background utilisation sampler.
    #[serde(default = "default_true")]
    pub monitor_enabled: bool,
    /// Sampling period of the utilisation monitor in milliseconds.
    #[serde(default = "default_monitor_interval_ms")]
    pub monitor_interval_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_monitor_interval_ms() -> u64 {
    500
}

impl SchedulerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, super::SchedulerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            super::SchedulerError::Config(format!(
                "cannot read config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, super::SchedulerError> {
        toml::from_str(toml_str)
            .map_err(|e| super::SchedulerError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, super::SchedulerError> {
        toml::to_string_pretty(self)
            .map_err(|e| super::SchedulerError::Config(format!("TOML serialise error: {e}")))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/coex_sched.sock"),
            monitor_enabled: true,
            monitor_interval_ms: 500,
        }
    }
}
