// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Lock-free utilisation cells shared between the sampler and the
//! scheduler.
//!
//! Each cell is one atomic word holding an `f32` bit pattern. The
//! sampling task is the single writer; the arbitration path reads the
//! latest value without taking any lock. Relaxed ordering is sufficient:
//! readers want a recent value, not a synchronised one.

use std::sync::atomic::{AtomicU32, Ordering};

/// Latest CPU and GPU utilisation readings, each in `[0.0, 1.0]`.
///
/// Constructed once, shared via `Arc`, written by exactly one task.
#[derive(Debug, Default)]
pub struct UtilizationCells {
    cpu: AtomicU32,
    gpu: AtomicU32,
}

impl UtilizationCells {
    /// Creates cells reading zero utilisation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a CPU utilisation reading.
    pub fn set_cpu(&self, utilisation: f32) {
        self.cpu.store(utilisation.to_bits(), Ordering::Relaxed);
    }

    /// Publishes a GPU utilisation reading.
    pub fn set_gpu(&self, utilisation: f32) {
        self.gpu.store(utilisation.to_bits(), Ordering::Relaxed);
    }

    /// Returns the latest CPU utilisation.
    pub fn cpu(&self) -> f32 {
        f32::from_bits(self.cpu.load(Ordering::Relaxed))
    }

    /// Returns the latest GPU utilisation.
    pub fn gpu(&self) -> f32 {
        f32::from_bits(self.gpu.load(Ordering::Relaxed))
    }
}
