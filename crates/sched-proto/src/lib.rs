// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # sched-proto
//!
//! The datagram protocol spoken between the scheduler and its runtimes.
//!
//! Every message in either direction is one [`Packet`] of exactly
//! [`WIRE_SIZE`] bytes: a four-word header, a fixed latency table and a
//! fixed partitioning-plan table, both sentinel-terminated. The layout is
//! bit-exact and identical in both directions, so a runtime can reuse its
//! receive buffer for its next transmission.
//!
//! # Wire stability
//! The integer values of [`RuntimeState`] and [`Resource`], the sentinel
//! constants and the field order are all wire contract. Changing any of
//! them breaks every deployed runtime; extend the protocol by appending
//! new state values instead.
//!
//! # Example
//! ```
//! use sched_proto::{Packet, RuntimeState};
//!
//! let mut pkt = Packet::new();
//! pkt.set_latency_profile(&[0.4, 1.2, 0.7]);
//! let bytes = pkt.to_bytes();
//! let back = Packet::from_bytes(&bytes).unwrap();
//! assert_eq!(back.current_state, RuntimeState::Initialize);
//! assert_eq!(back.latency_profile().len(), 3);
//! ```

mod error;
mod packet;
mod state;

pub use error::ProtoError;
pub use packet::{
    Packet, END_MASTER, END_PLAN, LATENCY_TERMINATOR, MAX_LAYERS, MAX_PLAN_ROWS, PLAN_COLS,
    PLAN_COL_FIRST, PLAN_COL_LAST, PLAN_COL_RATIO, PLAN_COL_RESOURCE, WIRE_SIZE,
};
pub use state::{Resource, RuntimeState};
