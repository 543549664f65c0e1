// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The partitioning table: one hand-tuned plan per known model shape.
//!
//! Each plan is the product of offline co-execution measurements on the
//! target board; the split points and ratios are not derivable from the
//! latency profile alone. The rows are contract — runtimes bake subgraph
//! boundaries into their compiled models, so a changed row is a silently
//! incompatible deployment. Treat edits like wire-format changes.
//!
//! Ratios are only meaningful on `CoExecute` rows, where the runtime uses
//! them to split the subgraph between CPU and GPU.

use crate::plan::{ModelShape, PlanEntry};
use sched_proto::Resource;

type Row = (i32, i32, Resource, i32);

/// 9 layers — two subgraphs: a co-executed stem, then the rest on GPU.
const MNIST: &[Row] = &[(0, 1, Resource::CoExecute, 2), (1, 9, Resource::Gpu, 0)];

/// 31 layers — height-wise then channel-wise co-execution, CPU tail.
const MOBILENET_V1: &[Row] = &[
    (0, 27, Resource::CoExecute, 18),
    (27, 29, Resource::CoExecute, 8),
    (29, 31, Resource::Cpu, 0),
];

/// 52 layers — co-executed backbone, CPU head.
const ULTRA_FAST_LANENET: &[Row] =
    &[(0, 47, Resource::CoExecute, 15), (47, 52, Resource::Cpu, 0)];

/// 54 layers — INT8 export of the 52-layer model; same measured split.
/// The rows stop at layer 52, exactly as deployed.
const ULTRA_FAST_LANENET_INT8: &[Row] =
    &[(0, 47, Resource::CoExecute, 15), (47, 52, Resource::Cpu, 0)];

/// 59 layers — single CPU subgraph.
const YOLO_V4_TINY: &[Row] = &[(0, 59, Resource::Cpu, 0)];

/// 68 layers — CPU throughout, but cut at the measured boundaries so the
/// runtime still interleaves with its co-resident peer.
const YOLO_V4_TINY_QUANT: &[Row] = &[
    (0, 8, Resource::Cpu, 0),
    (8, 9, Resource::Cpu, 0),
    (9, 21, Resource::Cpu, 0),
    (21, 23, Resource::Cpu, 0),
    (23, 36, Resource::Cpu, 0),
    (36, 38, Resource::Cpu, 0),
    (38, 58, Resource::Cpu, 0),
    (58, 65, Resource::Cpu, 0),
    (65, 68, Resource::Cpu, 0),
];

/// 118 layers — co-executed trunk, GPU tail.
const EFFICIENTNET_LITE_4: &[Row] = &[
    (0, 114, Resource::CoExecute, 18),
    (114, 118, Resource::Gpu, 0),
];

/// 123 layers — slim export, single CPU subgraph.
const MOBILENET_V3_SLIM: &[Row] = &[(0, 123, Resource::Cpu, 0)];

/// 124 layers — model-hub export, single GPU subgraph.
const MOBILENET_V3: &[Row] = &[(0, 124, Resource::Gpu, 0)];

/// 152 layers — alternating co-execution blocks and single-layer CPU
/// bridges, a GPU mid-section, CPU tail.
const YOLO_V4_TINY_IEIE: &[Row] = &[
    (0, 8, Resource::CoExecute, 15),
    (8, 9, Resource::Cpu, 0),
    (9, 20, Resource::CoExecute, 15),
    (20, 21, Resource::Cpu, 0),
    (21, 32, Resource::CoExecute, 15),
    (32, 33, Resource::Cpu, 0),
    (33, 55, Resource::Gpu, 0),
    (55, 152, Resource::Cpu, 0),
];

/// Pass-through plan for unrecognised layer counts: the runtime builds
/// nothing and idles instead of crashing.
const FALLBACK: &[Row] = &[(0, 0, Resource::Cpu, 0)];

/// Returns the table rows for a shape as typed entries.
pub fn entries_for(shape: ModelShape) -> Vec<PlanEntry> {
    let rows = match shape {
        ModelShape::Mnist => MNIST,
        ModelShape::MobileNetV1 => MOBILENET_V1,
        ModelShape::UltraFastLanenet => ULTRA_FAST_LANENET,
        ModelShape::UltraFastLanenetInt8 => ULTRA_FAST_LANENET_INT8,
        ModelShape::YoloV4Tiny => YOLO_V4_TINY,
        ModelShape::YoloV4TinyQuant => YOLO_V4_TINY_QUANT,
        ModelShape::EfficientNetLite4 => EFFICIENTNET_LITE_4,
        ModelShape::MobileNetV3Slim => MOBILENET_V3_SLIM,
        ModelShape::MobileNetV3 => MOBILENET_V3,
        ModelShape::YoloV4TinyIeie => YOLO_V4_TINY_IEIE,
        ModelShape::Unknown => FALLBACK,
    };
    rows.iter()
        .map(|&(first, last, resource, ratio)| PlanEntry {
            first,
            last,
            resource,
            ratio,
        })
        .collect()
}
