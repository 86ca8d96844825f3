use serde::{Deserialize, Serialize};

use crate::shared::error::DecodeError;

/// Network input resolution in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub width: u32,
    pub height: u32,
}

impl NetworkInfo {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Largest valid x coordinate (`width - 1`).
    pub fn max_x(&self) -> f32 {
        self.width as f32 - 1.0
    }

    /// Largest valid y coordinate (`height - 1`).
    pub fn max_y(&self) -> f32 {
        self.height as f32 - 1.0
    }
}

impl std::fmt::Display for NetworkInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Caller-owned, read-only decoding parameters.
///
/// Holds the per-class precluster threshold table (indexed by class id)
/// and the network resolution used for coordinate clamping.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionParams {
    thresholds: Vec<f32>,
    network: NetworkInfo,
}

impl DetectionParams {
    pub fn new(thresholds: Vec<f32>, network: NetworkInfo) -> Result<Self, DecodeError> {
        if thresholds.is_empty() {
            return Err(DecodeError::InvalidParams(
                "threshold table must have at least one class".to_string(),
            ));
        }
        if let Some(class_id) = thresholds.iter().position(|t| !t.is_finite()) {
            return Err(DecodeError::InvalidParams(format!(
                "threshold for class {class_id} is not finite"
            )));
        }
        if network.width == 0 || network.height == 0 {
            return Err(DecodeError::InvalidParams(format!(
                "network resolution must be non-zero, got {network}"
            )));
        }
        Ok(Self {
            thresholds,
            network,
        })
    }

    /// Same threshold for every one of `num_classes` classes.
    pub fn uniform(
        threshold: f32,
        num_classes: usize,
        network: NetworkInfo,
    ) -> Result<Self, DecodeError> {
        Self::new(vec![threshold; num_classes], network)
    }

    pub fn thresholds(&self) -> &[f32] {
        &self.thresholds
    }

    pub fn num_classes(&self) -> usize {
        self.thresholds.len()
    }

    pub fn network(&self) -> NetworkInfo {
        self.network
    }

    pub fn threshold(&self, class_id: usize) -> Option<f32> {
        self.thresholds.get(class_id).copied()
    }

    /// Truncates a float class value toward zero and checks it indexes the table.
    pub fn class_index(&self, row: usize, value: f32) -> Result<usize, DecodeError> {
        let truncated = value.trunc();
        if !truncated.is_finite() || truncated < 0.0 {
            return Err(DecodeError::InvalidClassId { row, value });
        }
        let class_id = truncated as usize;
        if class_id >= self.thresholds.len() {
            return Err(DecodeError::ClassIdOutOfRange {
                row,
                class_id,
                num_classes: self.thresholds.len(),
            });
        }
        Ok(class_id)
    }
}
