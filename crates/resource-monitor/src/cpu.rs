// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! CPU utilisation from `/proc/stat` deltas.
//!
//! The aggregate `cpu` line reports cumulative jiffies per category since
//! boot. Utilisation is only defined between two samples:
//!
//! ```text
//! util = Δbusy / (Δbusy + Δidle)
//! ```
//!
//! where busy = user + nice + system + irq + softirq + steal and
//! idle = idle + iowait.

use crate::MonitorError;
use std::path::Path;

/// Default procfs path for CPU time accounting.
const PROC_STAT: &str = "/proc/stat";

/// Cumulative CPU time counters from one `/proc/stat` sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CpuTimes {
    /// Jiffies spent doing work (user, nice, system, irq, softirq, steal).
    pub busy: u64,
    /// Jiffies spent idle or waiting on I/O.
    pub idle: u64,
}

impl CpuTimes {
    /// Reads the aggregate CPU counters from `/proc/stat`.
    pub fn read() -> Result<Self, MonitorError> {
        Self::read_from(Path::new(PROC_STAT))
    }

    /// Reads CPU counters from a specific procfs-format file.
    pub(crate) fn read_from(path: &Path) -> Result<Self, MonitorError> {
        let content = read_sys_file(path)?;
        let line = content
            .lines()
            .find(|l| l.starts_with("cpu "))
            .ok_or_else(|| MonitorError::ParseError {
                path: path.display().to_string(),
                detail: "no aggregate 'cpu' line".to_string(),
            })?;

        let fields: Vec<u64> = line
            .split_whitespace()
            .skip(1)
            .map(|f| f.parse::<u64>())
            .collect::<Result<_, _>>()
            .map_err(|e| MonitorError::ParseError {
                path: path.display().to_string(),
                detail: format!("non-numeric jiffy field: {e}"),
            })?;
        if fields.len() < 5 {
            return Err(MonitorError::ParseError {
                path: path.display().to_string(),
                detail: format!("expected at least 5 jiffy fields, got {}", fields.len()),
            });
        }

        // user nice system idle iowait irq softirq steal ...
        let get = |i: usize| fields.get(i).copied().unwrap_or(0);
        let busy = get(0) + get(1) + get(2) + get(5) + get(6) + get(7);
        let idle = get(3) + get(4);
        Ok(Self { busy, idle })
    }

    /// Returns total jiffies in this sample.
    pub fn total(&self) -> u64 {
        self.busy + self.idle
    }

    /// Utilisation in `[0.0, 1.0]` between an earlier sample and this one.
    ///
    /// Returns 0.0 when the samples are identical (or the counters moved
    /// backwards, which happens across a suspend/resume).
    pub fn utilisation_since(&self, earlier: &CpuTimes) -> f32 {
        let busy = self.busy.saturating_sub(earlier.busy);
        let total = self.total().saturating_sub(earlier.total());
        if total == 0 {
            return 0.0;
        }
        (busy as f32 / total as f32).clamp(0.0, 1.0)
    }
}

/// Reads a procfs/sysfs file and returns its trimmed content.
///
/// Shared helper for the readers in this crate.
pub(crate) fn read_sys_file(path: &Path) -> Result<String, MonitorError> {
    if !path.exists() {
        return Err(MonitorError::NotAvailable {
            path: path.display().to_string(),
        });
    }
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| MonitorError::ReadError {
            path: path.display().to_string(),
            source: e,
        })
}
