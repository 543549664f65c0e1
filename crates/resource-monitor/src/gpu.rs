// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! GPU utilisation from the integrated GPU's sysfs load interface.
//!
//! On Jetson-class boards the GPU driver exposes an instantaneous load
//! figure in tenths of a percent (0–1000) at `/sys/devices/gpu.0/load`.
//! Unlike the CPU counters this is already a rate, so a single read
//! suffices.

use crate::cpu::read_sys_file;
use crate::MonitorError;
use std::path::Path;

/// Candidate sysfs paths for the GPU load interface, tried in order.
const GPU_LOAD_PATHS: &[&str] = &[
    "/sys/devices/gpu.0/load",
    "/sys/devices/platform/gpu.0/load",
];

/// One GPU load reading.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct GpuLoad {
    /// Utilisation in `[0.0, 1.0]`.
    pub utilisation: f32,
}

impl GpuLoad {
    /// Reads the GPU load from the first candidate path that exists.
    ///
    /// Returns [`MonitorError::NotAvailable`] when no interface is
    /// present; callers treat that as zero load, not as a failure.
    pub fn read() -> Result<Self, MonitorError> {
        for candidate in GPU_LOAD_PATHS {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::read_from(path);
            }
        }
        Err(MonitorError::NotAvailable {
            path: GPU_LOAD_PATHS.join(", "),
        })
    }

    /// Reads a load figure (tenths of a percent) from a specific path.
    pub(crate) fn read_from(path: &Path) -> Result<Self, MonitorError> {
        let content = read_sys_file(path)?;
        let tenths: u32 = content.parse().map_err(|_| MonitorError::ParseError {
            path: path.display().to_string(),
            detail: format!("expected integer load value, got '{content}'"),
        })?;
        Ok(Self {
            utilisation: (tenths as f32 / 1000.0).clamp(0.0, 1.0),
        })
    }
}
