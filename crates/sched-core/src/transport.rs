// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The scheduler's datagram endpoint.
//!
//! One UNIX-domain datagram socket bound to a filesystem path. Datagram
//! semantics carry the protocol's framing: one send is one packet, never
//! fragmented or coalesced, so the receive side can validate a packet by
//! its byte length alone.
//!
//! Replies are routed by the sender's own socket path, which the kernel
//! attaches to every datagram from a bound peer.

use crate::SchedulerError;
use sched_proto::WIRE_SIZE;
use std::path::{Path, PathBuf};
use tokio::net::UnixDatagram;

/// Receive buffer length: one byte more than the wire size, so an
/// oversized datagram shows up as a length mismatch instead of being
/// silently truncated to a valid-looking packet.
pub const RECV_BUF_LEN: usize = WIRE_SIZE + 1;

/// The scheduler's bound datagram socket.
#[derive(Debug)]
pub struct SchedulerSocket {
    socket: UnixDatagram,
    path: PathBuf,
}

impl SchedulerSocket {
    /// Removes any stale socket file at `path`, then creates and binds.
    ///
    /// Both failures are fatal to the caller: a scheduler that cannot own
    /// its endpoint has nothing to do.
    pub fn bind(path: &Path) -> Result<Self, SchedulerError> {
        if path.exists() {
            std::fs::remove_file(path).map_err(|source| SchedulerError::RemoveStale {
                path: path.display().to_string(),
                source,
            })?;
            tracing::debug!(path = %path.display(), "removed stale socket file");
        }

        let socket = UnixDatagram::bind(path).map_err(|source| SchedulerError::Bind {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), "scheduler socket bound");
        Ok(Self {
            socket,
            path: path.to_path_buf(),
        })
    }

    /// Waits for one datagram.
    ///
    /// Returns the byte count and the peer's socket path. Peers that did
    /// not bind their own path come back as `None` — they cannot be
    /// replied to.
    pub async fn receive(
        &self,
        buf: &mut [u8],
    ) -> Result<(usize, Option<PathBuf>), SchedulerError> {
        let (len, addr) = self
            .socket
            .recv_from(buf)
            .await
            .map_err(|source| SchedulerError::Receive { source })?;
        Ok((len, addr.as_pathname().map(Path::to_path_buf)))
    }

    /// Sends one datagram to a peer's socket path.
    pub async fn send(&self, bytes: &[u8], peer: &Path) -> Result<usize, SchedulerError> {
        self.socket
            .send_to(bytes, peer)
            .await
            .map_err(|source| SchedulerError::Send {
                path: peer.display().to_string(),
                source,
            })
    }

    /// The path this socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
