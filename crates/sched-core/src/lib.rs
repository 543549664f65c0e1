// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # sched-core
//!
//! The co-execution scheduler: one long-running process that arbitrates
//! CPU and GPU access across independent inference runtimes on the same
//! board.
//!
//! The scheduler owns global policy only — registration, partitioning
//! plans, and who may invoke next on which device. Models, kernels and
//! tensors live entirely in the runtimes; the two sides talk exclusively
//! through fixed-size datagrams over a UNIX socket (see `sched-proto`).
//!
//! # Concurrency Model
//! A single task blocks in receive and handles one packet to completion
//! before the next, which serialises all registry, arbiter and planner
//! state. The only other task is the system monitor, which writes two
//! utilisation cells and touches nothing else.
//!
//! # Example
//! ```no_run
//! use sched_core::{Scheduler, SchedulerConfig};
//!
//! # async fn run() -> Result<(), sched_core::SchedulerError> {
//! let config = SchedulerConfig {
//!     socket_path: "/tmp/coex_sched.sock".into(),
//!     ..Default::default()
//! };
//! let mut scheduler = Scheduler::bind(&config)?;
//! sched_core::monitor::spawn(
//!     scheduler.utilization(),
//!     std::time::Duration::from_millis(config.monitor_interval_ms),
//! );
//! scheduler.run().await
//! # }
//! ```

mod arbiter;
mod config;
mod error;
pub mod monitor;
mod registry;
mod server;
mod transport;

pub use arbiter::Arbiter;
pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use registry::{RuntimeEntry, RuntimeRegistry};
pub use server::Scheduler;
pub use transport::SchedulerSocket;
