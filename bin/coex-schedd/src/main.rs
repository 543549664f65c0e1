// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # coex-schedd
//!
//! The co-execution scheduler daemon.
//!
//! Binds the scheduler to a UNIX datagram socket and serves runtime
//! packets until killed. The command line is deliberately minimal — the
//! runtimes and the scheduler only have to agree on one thing, the
//! socket path. Log verbosity comes from `RUST_LOG`.
//!
//! ## Usage
//! ```bash
//! coex-schedd /tmp/coex_sched.sock
//! RUST_LOG=debug coex-schedd /run/coex/sched.sock
//! ```
//!
//! Exits non-zero if the socket cannot be created or bound.

use clap::Parser;
use sched_core::{Scheduler, SchedulerConfig};
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "coex-schedd",
    about = "CPU/GPU co-execution scheduler for on-device inference runtimes",
    version
)]
struct Cli {
    /// Filesystem path for the scheduler's datagram socket.
    socket_path: std::path::PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = SchedulerConfig {
        socket_path: cli.socket_path,
        ..Default::default()
    };

    let mut scheduler = match Scheduler::bind(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "scheduler startup failed");
            return Err(e.into());
        }
    };

    if config.monitor_enabled {
        sched_core::monitor::spawn(
            scheduler.utilization(),
            Duration::from_millis(config.monitor_interval_ms),
        );
    }

    if let Err(e) = scheduler.run().await {
        tracing::error!(error = %e, "receive loop failed");
        return Err(e.into());
    }
    Ok(())
}
