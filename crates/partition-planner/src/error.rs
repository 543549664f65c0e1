// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the partition planner.

/// Errors raised while validating or converting partitioning plans.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// The plan has no entries at all.
    #[error("partitioning plan is empty")]
    EmptyPlan,

    /// An entry does not start where the previous one ended.
    #[error("plan entry {index} breaks the chain: expected first layer {expected}, got {found}")]
    NotContiguous {
        index: usize,
        expected: i32,
        found: i32,
    },

    /// An entry's layer range is inverted or negative.
    #[error("plan entry {index} has invalid range [{first}, {last})")]
    InvalidRange { index: usize, first: i32, last: i32 },

    /// The plan does not fit the packet's plan table.
    #[error("plan with {rows} rows exceeds the packet plan table")]
    PlanOverflow { rows: usize },

    /// A raw plan row carried an out-of-range wire value.
    #[error(transparent)]
    Proto(#[from] sched_proto::ProtoError),
}
