// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The background system monitor task.
//!
//! Samples CPU and GPU utilisation on a fixed interval and publishes the
//! readings into the scheduler's [`UtilizationCells`]. The task is the
//! cells' only writer and touches no other scheduler state; the
//! controller reads the cells whenever a future policy wants them.
//!
//! CPU utilisation needs two `/proc/stat` samples, so the first tick
//! only primes the baseline.

use resource_monitor::{CpuTimes, GpuLoad, MonitorError, UtilizationCells};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Spawns the sampling task.
///
/// The task runs until aborted; dropping the handle detaches it.
pub fn spawn(cells: Arc<UtilizationCells>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(interval_ms = interval.as_millis() as u64, "system monitor started");
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let mut baseline: Option<CpuTimes> = None;
        loop {
            ticker.tick().await;

            match CpuTimes::read() {
                Ok(sample) => {
                    if let Some(earlier) = baseline {
                        cells.set_cpu(sample.utilisation_since(&earlier));
                    }
                    baseline = Some(sample);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "cpu utilisation sample failed");
                }
            }

            match GpuLoad::read() {
                Ok(load) => cells.set_gpu(load.utilisation),
                // No GPU load interface on this host: report idle.
                Err(MonitorError::NotAvailable { .. }) => cells.set_gpu(0.0),
                Err(e) => {
                    tracing::debug!(error = %e, "gpu utilisation sample failed");
                }
            }
        }
    })
}
