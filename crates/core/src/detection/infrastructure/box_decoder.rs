//! Decoder for generic object detector output (boxes, scores, classes).
//!
//! Coordinates are clamped to the network frame before the box is built,
//! so every emitted box lies inside `[0, netW-1] x [0, netH-1]`.

use crate::detection::domain::candidate_decoder::{CandidateDecoder, CandidateRow, ProposalBuilder};
use crate::detection::domain::detection::Detection;
use crate::detection::domain::detection_params::{DetectionParams, NetworkInfo};
use crate::shared::error::DecodeError;
use crate::shared::geometry::{clamp, clamp_corners, BoxRect};
use crate::shared::tensor::{RawTensorSet, TensorLayer, TensorSetKind};

#[derive(Clone, Copy, Debug, Default)]
pub struct BoxDecoder {
    candidates: CandidateDecoder,
}

impl BoxDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.candidates = CandidateDecoder::new(verbose);
        self
    }

    pub fn decode(
        &self,
        tensors: &RawTensorSet<'_>,
        params: &DetectionParams,
    ) -> Result<Vec<Detection>, DecodeError> {
        self.candidates.decode(tensors, params, &ClampedBoxBuilder)
    }

    /// Validates a four-layer host output list, then decodes it.
    pub fn decode_layers(
        &self,
        layers: &[TensorLayer],
        params: &DetectionParams,
    ) -> Result<Vec<Detection>, DecodeError> {
        let tensors = RawTensorSet::from_layers(layers, TensorSetKind::Boxes)?;
        self.decode(&tensors, params)
    }
}

struct ClampedBoxBuilder;

impl ProposalBuilder for ClampedBoxBuilder {
    type Proposal = Detection;

    fn build(&self, row: &CandidateRow, network: NetworkInfo) -> Option<Detection> {
        let (max_x, max_y) = (network.max_x(), network.max_y());
        let [x1, y1, x2, y2] = clamp_corners(row.corners, max_x, max_y);
        let rect = BoxRect {
            left: x1,
            top: y1,
            width: clamp(x2 - x1, 0.0, max_x),
            height: clamp(y2 - y1, 0.0, max_y),
        };
        if rect.is_degenerate() {
            return None;
        }
        Some(Detection {
            rect,
            confidence: row.score,
            class_id: row.class_id,
        })
    }
}
