// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime lifecycle states and compute resources, with their wire values.
//!
//! Both enums travel as 32-bit little-endian integers inside a [`crate::Packet`].
//! The discriminants are wire contract — see the crate-level note on wire
//! stability.

use crate::ProtoError;

/// Lifecycle state of a runtime, as carried in the packet header.
///
/// Inbound packets report the sender's current state; the scheduler's
/// reply instructs the runtime which state to enter next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[repr(i32)]
pub enum RuntimeState {
    /// First contact: the runtime has no id yet and asks to register.
    Initialize = 0,
    /// The runtime has profiled its model and needs a partitioning plan.
    NeedProfile = 1,
    /// The runtime is cutting its model into the planned subgraphs.
    SubgraphCreate = 2,
    /// The runtime wants to invoke its next subgraph on a resource.
    Invoke = 3,
    /// The arbiter denied the last invocation; the runtime should retry.
    Blocked = 4,
    /// The runtime is shutting down and leaves the registry.
    Terminate = 5,
}

impl RuntimeState {
    /// Decodes a wire value, rejecting anything outside the enum range.
    pub fn from_wire(value: i32) -> Result<Self, ProtoError> {
        match value {
            0 => Ok(Self::Initialize),
            1 => Ok(Self::NeedProfile),
            2 => Ok(Self::SubgraphCreate),
            3 => Ok(Self::Invoke),
            4 => Ok(Self::Blocked),
            5 => Ok(Self::Terminate),
            other => Err(ProtoError::InvalidState {
                field: "state",
                value: other,
            }),
        }
    }

    /// Returns the wire value of this state.
    pub fn to_wire(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Initialize => "initialize",
            Self::NeedProfile => "need-profile",
            Self::SubgraphCreate => "subgraph-create",
            Self::Invoke => "invoke",
            Self::Blocked => "blocked",
            Self::Terminate => "terminate",
        };
        f.write_str(name)
    }
}

/// A compute resource a subgraph can be scheduled onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[repr(i32)]
pub enum Resource {
    /// The CPU alone.
    Cpu = 0,
    /// The GPU alone.
    Gpu = 1,
    /// Both devices cooperatively; the plan's ratio splits the work.
    CoExecute = 2,
    /// No resource requested.
    None = 3,
}

impl Resource {
    /// Decodes a wire value, rejecting anything outside the enum range.
    pub fn from_wire(value: i32) -> Result<Self, ProtoError> {
        match value {
            0 => Ok(Self::Cpu),
            1 => Ok(Self::Gpu),
            2 => Ok(Self::CoExecute),
            3 => Ok(Self::None),
            other => Err(ProtoError::InvalidResource { value: other }),
        }
    }

    /// Returns the wire value of this resource.
    pub fn to_wire(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
            Self::CoExecute => "co-execute",
            Self::None => "none",
        };
        f.write_str(name)
    }
}
