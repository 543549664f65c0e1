// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The fixed-layout scheduler packet and its codec.
//!
//! # Layout
//! ```text
//! offset  size     field
//! 0       4        runtime_id          (i32 LE)
//! 4       4        current_state       (i32 LE, RuntimeState)
//! 8       4        next_state          (i32 LE, RuntimeState)
//! 12      4        cur_graph_resource  (i32 LE, Resource)
//! 16      4000     latency[1000]       (f32 LE each; first -1.0 terminates)
//! 4016    16000    plan[1000][4]       (i32 LE each; row with first == END_PLAN terminates)
//! ```
//! Total: 20 016 bytes. Datagram semantics — a packet is never fragmented
//! or coalesced, so any receive of a different length is a protocol error.

use crate::{ProtoError, Resource, RuntimeState};

/// Number of latency slots in a packet; also the per-model layer limit.
pub const MAX_LAYERS: usize = 1000;

/// Number of partitioning-plan rows in a packet.
pub const MAX_PLAN_ROWS: usize = 1000;

/// Columns per plan row: `(first, last, resource, ratio)`.
pub const PLAN_COLS: usize = 4;

/// Plan-row column: first layer index of the subgraph.
pub const PLAN_COL_FIRST: usize = 0;
/// Plan-row column: last layer index of the subgraph, exclusive.
pub const PLAN_COL_LAST: usize = 1;
/// Plan-row column: wire value of the target [`Resource`].
pub const PLAN_COL_RESOURCE: usize = 2;
/// Plan-row column: co-execution split ratio hint.
pub const PLAN_COL_RATIO: usize = 3;

/// Placed in a row's first column to terminate a plan.
///
/// Negative, so it can never collide with a layer index.
pub const END_PLAN: i32 = -1;

/// Placed in a row's first column to terminate a list of plans.
pub const END_MASTER: i32 = -2;

/// Terminates the latency table; entries before it are per-layer samples.
pub const LATENCY_TERMINATOR: f32 = -1.0;

/// Exact size of an encoded packet in bytes.
pub const WIRE_SIZE: usize = 16 + 4 * MAX_LAYERS + 4 * PLAN_COLS * MAX_PLAN_ROWS;

/// One scheduler datagram, either direction.
///
/// Freshly constructed packets are all-zero apart from the typed fields'
/// zero values (`Initialize`, `Cpu`), matching the zero-filled buffers the
/// runtimes transmit on first contact.
#[derive(Clone)]
pub struct Packet {
    /// Runtime id as known to both parties; 0 on a first `Initialize`.
    pub runtime_id: i32,
    /// The sender's lifecycle state.
    pub current_state: RuntimeState,
    /// The replier's instruction; meaningful only in scheduler replies.
    pub next_state: RuntimeState,
    /// Resource the sender intends to use for its current subgraph.
    pub cur_graph_resource: Resource,
    /// Per-layer latency samples, terminated by [`LATENCY_TERMINATOR`].
    pub latency: [f32; MAX_LAYERS],
    /// Partitioning-plan rows, terminated by an [`END_PLAN`] row.
    pub plan: [[i32; PLAN_COLS]; MAX_PLAN_ROWS],
}

impl Packet {
    /// Creates a zeroed packet.
    pub fn new() -> Self {
        Self {
            runtime_id: 0,
            current_state: RuntimeState::Initialize,
            next_state: RuntimeState::Initialize,
            cur_graph_resource: Resource::Cpu,
            latency: [0.0; MAX_LAYERS],
            plan: [[0; PLAN_COLS]; MAX_PLAN_ROWS],
        }
    }

    /// Returns the latency samples before the terminator.
    ///
    /// The slice length is the model's layer count as reported by the
    /// runtime. A table with no terminator yields all [`MAX_LAYERS`] slots.
    pub fn latency_profile(&self) -> &[f32] {
        let end = self
            .latency
            .iter()
            .position(|v| *v == LATENCY_TERMINATOR)
            .unwrap_or(MAX_LAYERS);
        &self.latency[..end]
    }

    /// Copies `samples` into the latency table and terminates it.
    ///
    /// Samples beyond `MAX_LAYERS - 1` are dropped; one slot is always
    /// reserved for the terminator.
    pub fn set_latency_profile(&mut self, samples: &[f32]) {
        let n = samples.len().min(MAX_LAYERS - 1);
        self.latency[..n].copy_from_slice(&samples[..n]);
        self.latency[n] = LATENCY_TERMINATOR;
        for slot in self.latency[n + 1..].iter_mut() {
            *slot = 0.0;
        }
    }

    /// Returns the plan rows before the first [`END_PLAN`] marker.
    pub fn plan_rows(&self) -> &[[i32; PLAN_COLS]] {
        let end = self
            .plan
            .iter()
            .position(|row| row[PLAN_COL_FIRST] == END_PLAN)
            .unwrap_or(MAX_PLAN_ROWS);
        &self.plan[..end]
    }

    /// Encodes the packet into its fixed little-endian wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(WIRE_SIZE);
        buf.extend_from_slice(&self.runtime_id.to_le_bytes());
        buf.extend_from_slice(&self.current_state.to_wire().to_le_bytes());
        buf.extend_from_slice(&self.next_state.to_wire().to_le_bytes());
        buf.extend_from_slice(&self.cur_graph_resource.to_wire().to_le_bytes());
        for v in &self.latency {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        for row in &self.plan {
            for v in row {
                buf.extend_from_slice(&v.to_le_bytes());
            }
        }
        debug_assert_eq!(buf.len(), WIRE_SIZE);
        buf
    }

    /// Decodes a received datagram.
    ///
    /// Rejects any byte length other than [`WIRE_SIZE`] and any header
    /// field outside its enum range.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtoError> {
        if bytes.len() != WIRE_SIZE {
            return Err(ProtoError::SizeMismatch {
                expected: WIRE_SIZE,
                actual: bytes.len(),
            });
        }

        let mut off = 0;
        let runtime_id = read_i32(bytes, &mut off);

        let raw = read_i32(bytes, &mut off);
        let current_state = RuntimeState::from_wire(raw).map_err(|_| ProtoError::InvalidState {
            field: "current_state",
            value: raw,
        })?;

        let raw = read_i32(bytes, &mut off);
        let next_state = RuntimeState::from_wire(raw).map_err(|_| ProtoError::InvalidState {
            field: "next_state",
            value: raw,
        })?;

        let cur_graph_resource = Resource::from_wire(read_i32(bytes, &mut off))?;

        let mut latency = [0.0f32; MAX_LAYERS];
        for slot in latency.iter_mut() {
            *slot = read_f32(bytes, &mut off);
        }

        let mut plan = [[0i32; PLAN_COLS]; MAX_PLAN_ROWS];
        for row in plan.iter_mut() {
            for slot in row.iter_mut() {
                *slot = read_i32(bytes, &mut off);
            }
        }

        Ok(Self {
            runtime_id,
            current_state,
            next_state,
            cur_graph_resource,
            latency,
            plan,
        })
    }
}

impl Default for Packet {
    fn default() -> Self {
        Self::new()
    }
}

// The latency and plan tables are 20 KB of mostly-zero filler; summarise
// them instead of dumping every slot.
impl std::fmt::Debug for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packet")
            .field("runtime_id", &self.runtime_id)
            .field("current_state", &self.current_state)
            .field("next_state", &self.next_state)
            .field("cur_graph_resource", &self.cur_graph_resource)
            .field("profiled_layers", &self.latency_profile().len())
            .field("plan_rows", &self.plan_rows().len())
            .finish()
    }
}

fn read_i32(bytes: &[u8], off: &mut usize) -> i32 {
    let v = i32::from_le_bytes(bytes[*off..*off + 4].try_into().expect("4-byte slice"));
    *off += 4;
    v
}

fn read_f32(bytes: &[u8], off: &mut usize) -> f32 {
    let v = f32::from_le_bytes(bytes[*off..*off + 4].try_into().expect("4-byte slice"));
    *off += 4;
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_size() {
        assert_eq!(WIRE_SIZE, 20_016);
        assert_eq!(Packet::new().to_bytes().len(), WIRE_SIZE);
    }

    #[test]
    fn test_roundtrip_header() {
        let mut pkt = Packet::new();
        pkt.runtime_id = 7;
        pkt.current_state = RuntimeState::Invoke;
        pkt.next_state = RuntimeState::Blocked;
        pkt.cur_graph_resource = Resource::Gpu;

        let back = Packet::from_bytes(&pkt.to_bytes()).unwrap();
        assert_eq!(back.runtime_id, 7);
        assert_eq!(back.current_state, RuntimeState::Invoke);
        assert_eq!(back.next_state, RuntimeState::Blocked);
        assert_eq!(back.cur_graph_resource, Resource::Gpu);
    }

    #[test]
    fn test_roundtrip_tables() {
        let mut pkt = Packet::new();
        pkt.set_latency_profile(&[0.5, 1.5, 2.5]);
        pkt.plan[0] = [0, 3, Resource::CoExecute.to_wire(), 15];
        pkt.plan[1] = [END_PLAN, 0, 0, 0];

        let back = Packet::from_bytes(&pkt.to_bytes()).unwrap();
        assert_eq!(back.latency_profile(), &[0.5, 1.5, 2.5]);
        assert_eq!(back.plan_rows(), &[[0, 3, 2, 15]]);
    }

    #[test]
    fn test_latency_profile_counts_to_terminator() {
        let mut pkt = Packet::new();
        pkt.set_latency_profile(&[1.0; 9]);
        assert_eq!(pkt.latency_profile().len(), 9);
        assert_eq!(pkt.latency[9], LATENCY_TERMINATOR);
    }

    #[test]
    fn test_latency_profile_without_terminator() {
        let mut pkt = Packet::new();
        pkt.latency = [0.25; MAX_LAYERS];
        assert_eq!(pkt.latency_profile().len(), MAX_LAYERS);
    }

    #[test]
    fn test_set_latency_profile_truncates() {
        let mut pkt = Packet::new();
        pkt.set_latency_profile(&[2.0; MAX_LAYERS + 10]);
        assert_eq!(pkt.latency_profile().len(), MAX_LAYERS - 1);
        assert_eq!(pkt.latency[MAX_LAYERS - 1], LATENCY_TERMINATOR);
    }

    #[test]
    fn test_set_latency_profile_clears_stale_tail() {
        let mut pkt = Packet::new();
        pkt.set_latency_profile(&[1.0; 20]);
        pkt.set_latency_profile(&[1.0; 5]);
        assert_eq!(pkt.latency_profile().len(), 5);
        assert!(pkt.latency[6..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_rejects_short_datagram() {
        let err = Packet::from_bytes(&[0u8; WIRE_SIZE - 1]).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::SizeMismatch {
                actual: 20_015,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_oversized_datagram() {
        assert!(Packet::from_bytes(&[0u8; WIRE_SIZE + 1]).is_err());
    }

    #[test]
    fn test_rejects_bad_state_discriminant() {
        let mut bytes = Packet::new().to_bytes();
        bytes[4..8].copy_from_slice(&99i32.to_le_bytes());
        let err = Packet::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::InvalidState {
                field: "current_state",
                value: 99,
            }
        ));
    }

    #[test]
    fn test_rejects_bad_resource_discriminant() {
        let mut bytes = Packet::new().to_bytes();
        bytes[12..16].copy_from_slice(&(-3i32).to_le_bytes());
        assert!(matches!(
            Packet::from_bytes(&bytes),
            Err(ProtoError::InvalidResource { value: -3 })
        ));
    }

    #[test]
    fn test_zeroed_packet_is_initialize() {
        // A runtime's first transmission is a zero-filled buffer; it must
        // decode as an Initialize packet with id 0.
        let pkt = Packet::from_bytes(&[0u8; WIRE_SIZE]).unwrap();
        assert_eq!(pkt.runtime_id, 0);
        assert_eq!(pkt.current_state, RuntimeState::Initialize);
        assert_eq!(pkt.cur_graph_resource, Resource::Cpu);
    }

    #[test]
    fn test_debug_is_summarised() {
        let s = format!("{:?}", Packet::new());
        assert!(s.contains("profiled_layers"));
        assert!(s.len() < 300);
    }
}
