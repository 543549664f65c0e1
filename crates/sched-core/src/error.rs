// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the scheduler core.

/// Errors that can occur in the scheduler.
///
/// Only the socket-setup variants are fatal; everything else is logged
/// at the call site and the receive loop continues.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Could not remove a stale socket file left by a previous run.
    #[error("failed to remove stale socket file '{path}': {source}")]
    RemoveStale {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or bind the scheduler's datagram socket.
    #[error("failed to bind scheduler socket at '{path}': {source}")]
    Bind {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The blocking receive itself failed.
    #[error("receive failed: {source}")]
    Receive {
        #[source]
        source: std::io::Error,
    },

    /// A reply datagram could not be sent to a runtime.
    #[error("send to '{path}' failed: {source}")]
    Send {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file problem.
    #[error("configuration error: {0}")]
    Config(String),
}
