// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # resource-monitor
//!
//! Reads CPU and GPU utilisation from `/proc/` and `/sys/` and publishes
//! the latest readings through lock-free [`UtilizationCells`].
//!
//! # Monitored Metrics
//! - **CPU utilisation** — busy/total deltas between two `/proc/stat`
//!   samples; a single sample carries no rate information.
//! - **GPU utilisation** — the integrated GPU's load interface
//!   (Jetson-style `gpu.0/load`, reported in tenths of a percent).
//!
//! # Sharing Model
//! One sampling task owns the readers and is the only writer of the
//! cells; the scheduler's arbitration path reads them without any
//! coordination. Readings are advisory — a stale value is acceptable,
//! a blocked arbiter is not.
//!
//! # Graceful Degradation
//! On hosts without the GPU load interface (containers, x86 dev boxes)
//! GPU utilisation reads as zero rather than failing; CPU sampling only
//! needs `/proc/stat`.
//!
//! # Example
//! ```no_run
//! use resource_monitor::{CpuTimes, UtilizationCells};
//!
//! let cells = UtilizationCells::new();
//! let before = CpuTimes::read().expect("no /proc/stat");
//! std::thread::sleep(std::time::Duration::from_millis(200));
//! let after = CpuTimes::read().expect("no /proc/stat");
//! cells.set_cpu(after.utilisation_since(&before));
//! println!("cpu at {:.0}%", cells.cpu() * 100.0);
//! ```

mod cells;
mod cpu;
mod error;
mod gpu;

pub use cells::UtilizationCells;
pub use cpu::CpuTimes;
pub use error::MonitorError;
pub use gpu::GpuLoad;
