// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The runtime registry: every connected peer, by id.
//!
//! Ids are handed out in registration order and are never reused for the
//! life of the process — a late packet from a terminated runtime must
//! not be mistaken for a new one. A runtime's entry changes only when one
//! of its own packets arrives, and leaves the registry only on terminate.

use sched_proto::RuntimeState;
use std::path::{Path, PathBuf};

/// One registered runtime.
#[derive(Debug, Clone)]
pub struct RuntimeEntry {
    /// Scheduler-assigned id, unique for the process lifetime.
    pub id: i32,
    /// Last lifecycle state reported by the runtime.
    pub state: RuntimeState,
    /// The runtime's own socket path, learned from its first datagram.
    pub return_address: PathBuf,
    /// Per-layer latencies from the runtime's most recent profile.
    pub latencies: Vec<f32>,
}

/// Registry of all connected runtimes.
#[derive(Debug, Default)]
pub struct RuntimeRegistry {
    runtimes: Vec<RuntimeEntry>,
    created: i32,
}

impl RuntimeRegistry {
    /// Creates an empty registry; the first id assigned will be 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new runtime and returns its id.
    pub fn register(&mut self, return_address: &Path) -> i32 {
        let id = self.created;
        self.created += 1;
        self.runtimes.push(RuntimeEntry {
            id,
            state: RuntimeState::Initialize,
            return_address: return_address.to_path_buf(),
            latencies: Vec::new(),
        });
        id
    }

    /// Returns `true` if a runtime with this id is registered.
    pub fn contains(&self, id: i32) -> bool {
        self.runtimes.iter().any(|r| r.id == id)
    }

    /// Updates a runtime's state; returns `false` for an unknown id.
    pub fn update_state(&mut self, id: i32, state: RuntimeState) -> bool {
        match self.runtimes.iter_mut().find(|r| r.id == id) {
            Some(entry) => {
                entry.state = state;
                true
            }
            None => false,
        }
    }

    /// Stores a runtime's latest latency profile; returns `false` for an
    /// unknown id.
    pub fn set_latencies(&mut self, id: i32, samples: &[f32]) -> bool {
        match self.runtimes.iter_mut().find(|r| r.id == id) {
            Some(entry) => {
                entry.latencies = samples.to_vec();
                true
            }
            None => false,
        }
    }

    /// Looks up a runtime by id.
    pub fn lookup(&self, id: i32) -> Option<&RuntimeEntry> {
        self.runtimes.iter().find(|r| r.id == id)
    }

    /// Removes and returns a runtime.
    pub fn remove(&mut self, id: i32) -> Option<RuntimeEntry> {
        let index = self.runtimes.iter().position(|r| r.id == id)?;
        Some(self.runtimes.remove(index))
    }

    /// Number of registered runtimes.
    pub fn len(&self) -> usize {
        self.runtimes.len()
    }

    /// Returns `true` if no runtime is registered.
    pub fn is_empty(&self) -> bool {
        self.runtimes.is_empty()
    }

    /// Returns `true` when every registered runtime has reached
    /// [`RuntimeState::Invoke`] — the arbiter's bootstrap barrier.
    ///
    /// Only consulted on behalf of a registered sender, so the registry
    /// is never empty at the call site.
    pub fn all_invoking(&self) -> bool {
        self.runtimes.iter().all(|r| r.state == RuntimeState::Invoke)
    }

    /// Iterates over all entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RuntimeEntry> {
        self.runtimes.iter()
    }

    /// One-line registry overview for log output.
    pub fn summary(&self) -> String {
        let states: Vec<String> = self
            .runtimes
            .iter()
            .map(|r| format!("{}:{}", r.id, r.state))
            .collect();
        format!("{} runtimes [{}]", self.runtimes.len(), states.join(", "))
    }
}
