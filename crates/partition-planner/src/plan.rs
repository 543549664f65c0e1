// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Partitioning plans: the output of the shape lookup.
//!
//! A plan is a sequence of [`PlanEntry`]s describing a linear chain of
//! subgraphs. The runtime cuts its model along the entry boundaries,
//! compiles one subgraph per entry for the entry's resource, and invokes
//! them in order. The plan is the contract between the scheduler and the
//! runtime; on the wire it travels as raw `(first, last, resource, ratio)`
//! rows terminated by [`END_PLAN`].

use crate::{table, PlannerError};
use sched_proto::{
    Resource, END_PLAN, MAX_PLAN_ROWS, PLAN_COLS, PLAN_COL_FIRST, PLAN_COL_LAST, PLAN_COL_RATIO,
    PLAN_COL_RESOURCE,
};

/// Model shapes known to the partitioning table, keyed by layer count.
///
/// The layer count comes from the runtime's latency profile and is the
/// only fingerprint the scheduler has — it never sees the model itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ModelShape {
    /// 9 layers: MNIST classifier.
    Mnist,
    /// 31 layers: MobileNet-V1 224.
    MobileNetV1,
    /// 52 layers: Ultra-fast-lanenet, FP32.
    UltraFastLanenet,
    /// 54 layers: Ultra-fast-lanenet, INT8.
    UltraFastLanenetInt8,
    /// 59 layers: YOLO-v4-tiny (pinto export).
    YoloV4Tiny,
    /// 68 layers: YOLO-v4-tiny with quantise layers.
    YoloV4TinyQuant,
    /// 118 layers: EfficientNet-Lite-4, FP32.
    EfficientNetLite4,
    /// 123 layers: MobileNet-V3 224, slim export.
    MobileNetV3Slim,
    /// 124 layers: MobileNet-V3 224, TF model-hub export.
    MobileNetV3,
    /// 152 layers: YOLO-v4-tiny, IEIE variant.
    YoloV4TinyIeie,
    /// Any other layer count; gets the pass-through fallback plan.
    Unknown,
}

impl ModelShape {
    /// Fingerprints a model by its profiled layer count.
    pub fn from_layer_count(layers: usize) -> Self {
        match layers {
            9 => Self::Mnist,
            31 => Self::MobileNetV1,
            52 => Self::UltraFastLanenet,
            54 => Self::UltraFastLanenetInt8,
            59 => Self::YoloV4Tiny,
            68 => Self::YoloV4TinyQuant,
            118 => Self::EfficientNetLite4,
            123 => Self::MobileNetV3Slim,
            124 => Self::MobileNetV3,
            152 => Self::YoloV4TinyIeie,
            _ => Self::Unknown,
        }
    }

    /// Human-readable shape name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mnist => "mnist",
            Self::MobileNetV1 => "mobilenet-v1-224",
            Self::UltraFastLanenet => "ultra-fast-lanenet",
            Self::UltraFastLanenetInt8 => "ultra-fast-lanenet-int8",
            Self::YoloV4Tiny => "yolo-v4-tiny",
            Self::YoloV4TinyQuant => "yolo-v4-tiny-quant",
            Self::EfficientNetLite4 => "efficientnet-lite-4",
            Self::MobileNetV3Slim => "mobilenet-v3-224-slim",
            Self::MobileNetV3 => "mobilenet-v3-224",
            Self::YoloV4TinyIeie => "yolo-v4-tiny-ieie",
            Self::Unknown => "unknown",
        }
    }
}

/// One subgraph of a partitioning plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PlanEntry {
    /// First layer index of the subgraph.
    pub first: i32,
    /// Last layer index, exclusive.
    pub last: i32,
    /// Resource the subgraph runs on.
    pub resource: Resource,
    /// Work-split hint for [`Resource::CoExecute`]; 0 otherwise.
    ///
    /// Consumed by the runtime when dividing the subgraph between the two
    /// devices; the scheduler only transports it.
    pub ratio: i32,
}

impl PlanEntry {
    /// Converts this entry into its wire row.
    pub fn as_row(&self) -> [i32; PLAN_COLS] {
        [self.first, self.last, self.resource.to_wire(), self.ratio]
    }

    /// Parses a wire row back into a typed entry.
    pub fn from_row(row: &[i32; PLAN_COLS]) -> Result<Self, PlannerError> {
        Ok(Self {
            first: row[PLAN_COL_FIRST],
            last: row[PLAN_COL_LAST],
            resource: Resource::from_wire(row[PLAN_COL_RESOURCE])?,
            ratio: row[PLAN_COL_RATIO],
        })
    }

    /// Number of layers covered by this entry.
    pub fn num_layers(&self) -> i32 {
        self.last - self.first
    }
}

/// The complete partitioning plan for one runtime's model.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PartitionPlan {
    /// The shape the layer count matched.
    pub shape: ModelShape,
    /// Ordered subgraph entries.
    pub entries: Vec<PlanEntry>,
}

impl PartitionPlan {
    /// Looks up the plan for a profiled layer count.
    ///
    /// Never fails: an unknown layer count yields the fallback plan, which
    /// the runtime interprets as "do nothing useful but do not crash".
    pub fn for_layer_count(layers: usize) -> Self {
        let shape = ModelShape::from_layer_count(layers);
        let entries = table::entries_for(shape);
        tracing::debug!(
            layers,
            shape = shape.name(),
            subgraphs = entries.len(),
            "partitioning table lookup"
        );
        Self { shape, entries }
    }

    /// Returns `true` if this is the unknown-shape pass-through plan.
    pub fn is_fallback(&self) -> bool {
        self.shape == ModelShape::Unknown
    }

    /// Validates the plan's chain structure.
    ///
    /// Checks:
    /// - At least one entry.
    /// - The chain starts at layer 0.
    /// - Every entry starts where the previous one ended.
    /// - No entry has an inverted range.
    ///
    /// Deliberately does *not* check coverage against a layer count: the
    /// table is contract, and one deployed plan stops short of its model's
    /// final layer (see [`Self::covers`]).
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.entries.is_empty() {
            return Err(PlannerError::EmptyPlan);
        }

        let mut expected = 0i32;
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.first != expected {
                return Err(PlannerError::NotContiguous {
                    index,
                    expected,
                    found: entry.first,
                });
            }
            if entry.last < entry.first {
                return Err(PlannerError::InvalidRange {
                    index,
                    first: entry.first,
                    last: entry.last,
                });
            }
            expected = entry.last;
        }
        Ok(())
    }

    /// Returns `true` if the chain covers layers `0..layer_count` exactly.
    pub fn covers(&self, layer_count: usize) -> bool {
        self.entries
            .last()
            .is_some_and(|e| e.last == layer_count as i32)
    }

    /// Writes the plan into a packet's plan table, followed by the
    /// [`END_PLAN`] sentinel row.
    pub fn write_into(
        &self,
        plan: &mut [[i32; PLAN_COLS]; MAX_PLAN_ROWS],
    ) -> Result<(), PlannerError> {
        // One row is reserved for the sentinel.
        if self.entries.len() >= MAX_PLAN_ROWS {
            return Err(PlannerError::PlanOverflow {
                rows: self.entries.len(),
            });
        }
        for (row, entry) in plan.iter_mut().zip(&self.entries) {
            *row = entry.as_row();
        }
        plan[self.entries.len()] = [END_PLAN, 0, 0, 0];
        Ok(())
    }

    /// Parses the rows of a received packet back into a typed plan.
    ///
    /// `rows` must already be stripped of the sentinel (see
    /// `Packet::plan_rows`). The shape is not recoverable from the wire.
    pub fn from_rows(rows: &[[i32; PLAN_COLS]]) -> Result<Self, PlannerError> {
        let entries = rows
            .iter()
            .map(PlanEntry::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            shape: ModelShape::Unknown,
            entries,
        })
    }

    /// Returns a human-readable summary of the plan.
    pub fn summary(&self) -> String {
        let chain: Vec<String> = self
            .entries
            .iter()
            .map(|e| {
                if e.resource == Resource::CoExecute {
                    format!("[{}..{}) {}:{}", e.first, e.last, e.resource, e.ratio)
                } else {
                    format!("[{}..{}) {}", e.first, e.last, e.resource)
                }
            })
            .collect();
        format!(
            "plan '{}': {} subgraphs — {}",
            self.shape.name(),
            self.entries.len(),
            chain.join(" → "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(first: i32, last: i32, resource: Resource, ratio: i32) -> PlanEntry {
        PlanEntry {
            first,
            last,
            resource,
            ratio,
        }
    }

    #[test]
    fn test_validate_ok() {
        let plan = PartitionPlan {
            shape: ModelShape::Mnist,
            entries: vec![
                entry(0, 1, Resource::CoExecute, 2),
                entry(1, 9, Resource::Gpu, 0),
            ],
        };
        plan.validate().unwrap();
        assert!(plan.covers(9));
    }

    #[test]
    fn test_validate_empty() {
        let plan = PartitionPlan {
            shape: ModelShape::Unknown,
            entries: vec![],
        };
        assert!(matches!(plan.validate(), Err(PlannerError::EmptyPlan)));
    }

    #[test]
    fn test_validate_gap() {
        let plan = PartitionPlan {
            shape: ModelShape::Unknown,
            entries: vec![
                entry(0, 4, Resource::Cpu, 0),
                entry(5, 9, Resource::Gpu, 0), // skips layer 4
            ],
        };
        assert!(matches!(
            plan.validate(),
            Err(PlannerError::NotContiguous {
                index: 1,
                expected: 4,
                found: 5,
            })
        ));
    }

    #[test]
    fn test_validate_must_start_at_zero() {
        let plan = PartitionPlan {
            shape: ModelShape::Unknown,
            entries: vec![entry(1, 9, Resource::Cpu, 0)],
        };
        assert!(matches!(
            plan.validate(),
            Err(PlannerError::NotContiguous { index: 0, .. })
        ));
    }

    #[test]
    fn test_validate_inverted_range() {
        let plan = PartitionPlan {
            shape: ModelShape::Unknown,
            entries: vec![entry(0, -1, Resource::Cpu, 0)],
        };
        assert!(matches!(
            plan.validate(),
            Err(PlannerError::InvalidRange { index: 0, .. })
        ));
    }

    #[test]
    fn test_fallback_pass_through_validates() {
        // The fallback entry is the empty range [0, 0) — legal by design.
        let plan = PartitionPlan::for_layer_count(7);
        assert!(plan.is_fallback());
        plan.validate().unwrap();
        assert!(!plan.covers(7));
    }

    #[test]
    fn test_write_into_appends_sentinel() {
        let plan = PartitionPlan::for_layer_count(9);
        let mut rows = [[0i32; PLAN_COLS]; MAX_PLAN_ROWS];
        plan.write_into(&mut rows).unwrap();
        assert_eq!(rows[0], [0, 1, Resource::CoExecute.to_wire(), 2]);
        assert_eq!(rows[1], [1, 9, Resource::Gpu.to_wire(), 0]);
        assert_eq!(rows[2][PLAN_COL_FIRST], END_PLAN);
    }

    #[test]
    fn test_write_into_overflow() {
        let plan = PartitionPlan {
            shape: ModelShape::Unknown,
            entries: (0..MAX_PLAN_ROWS as i32)
                .map(|i| entry(i, i + 1, Resource::Cpu, 0))
                .collect(),
        };
        let mut rows = [[0i32; PLAN_COLS]; MAX_PLAN_ROWS];
        assert!(matches!(
            plan.write_into(&mut rows),
            Err(PlannerError::PlanOverflow { .. })
        ));
    }

    #[test]
    fn test_row_roundtrip() {
        let original = entry(27, 29, Resource::CoExecute, 8);
        let back = PlanEntry::from_row(&original.as_row()).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_from_rows_rejects_bad_resource() {
        let rows = [[0, 9, 42, 0]];
        assert!(PlanEntry::from_row(&rows[0]).is_err());
        assert!(PartitionPlan::from_rows(&rows).is_err());
    }

    #[test]
    fn test_from_rows_matches_write_into() {
        let plan = PartitionPlan::for_layer_count(31);
        let mut rows = [[0i32; PLAN_COLS]; MAX_PLAN_ROWS];
        plan.write_into(&mut rows).unwrap();

        let n = plan.entries.len();
        let back = PartitionPlan::from_rows(&rows[..n]).unwrap();
        assert_eq!(back.entries, plan.entries);
    }

    #[test]
    fn test_summary() {
        let s = PartitionPlan::for_layer_count(31).summary();
        assert!(s.contains("mobilenet-v1-224"));
        assert!(s.contains("3 subgraphs"));
        assert!(s.contains("co-execute:18"));
    }
}
