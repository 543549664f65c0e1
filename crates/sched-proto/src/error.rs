// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for packet decoding.

/// Errors raised while decoding an inbound datagram.
///
/// All of these are protocol errors in the scheduler's error model: the
/// offending datagram is logged and dropped, the receive loop continues.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// The datagram is shorter or longer than the fixed wire size.
    #[error("datagram size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A state field holds a value outside the known enum range.
    #[error("invalid runtime state value {value} in field '{field}'")]
    InvalidState { field: &'static str, value: i32 },

    /// The resource field holds a value outside the known enum range.
    #[error("invalid resource value {value}")]
    InvalidResource { value: i32 },
}
