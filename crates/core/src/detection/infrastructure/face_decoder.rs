//! Decoder for face detector output (boxes, scores, classes, landmarks).
//!
//! Unlike [`BoxDecoder`](super::box_decoder::BoxDecoder) no clamping is
//! applied: a face that extends past the frame keeps its raw coordinates.
//! The optional margin grows the box on every side and shifts landmarks by
//! the same amount.

use crate::detection::domain::candidate_decoder::{CandidateDecoder, CandidateRow, ProposalBuilder};
use crate::detection::domain::detection::FaceDetection;
use crate::detection::domain::detection_params::{DetectionParams, NetworkInfo};
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::error::DecodeError;
use crate::shared::geometry::{expand_corners, MIN_BOX_SIDE};
use crate::shared::tensor::{RawTensorSet, TensorLayer, TensorSetKind, LANDMARKS_LAYER};

pub const DEFAULT_MARGIN: i32 = 0;

#[derive(Clone, Copy, Debug, Default)]
pub struct FaceDecoder {
    margin: i32,
    candidates: CandidateDecoder,
}

impl FaceDecoder {
    pub fn new(margin: i32) -> Self {
        Self {
            margin,
            candidates: CandidateDecoder::default(),
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.candidates = CandidateDecoder::new(verbose);
        self
    }

    pub fn margin(&self) -> i32 {
        self.margin
    }

    pub fn verbose(&self) -> bool {
        self.candidates.verbose()
    }

    /// Decodes one tensor set. The set must carry a landmark layer.
    pub fn decode(
        &self,
        tensors: &RawTensorSet<'_>,
        params: &DetectionParams,
    ) -> Result<Vec<FaceDetection>, DecodeError> {
        if !tensors.has_landmarks() {
            return Err(DecodeError::MissingLayer(LANDMARKS_LAYER));
        }
        let builder = MarginFaceBuilder {
            margin: self.margin as f32,
        };
        self.candidates.decode(tensors, params, &builder)
    }

    /// Validates a five-layer host output list, then decodes it.
    pub fn decode_layers(
        &self,
        layers: &[TensorLayer],
        params: &DetectionParams,
    ) -> Result<Vec<FaceDetection>, DecodeError> {
        let tensors = RawTensorSet::from_layers(layers, TensorSetKind::Faces)?;
        self.decode(&tensors, params)
    }
}

struct MarginFaceBuilder {
    margin: f32,
}

impl ProposalBuilder for MarginFaceBuilder {
    type Proposal = FaceDetection;

    fn build(&self, row: &CandidateRow, _network: NetworkInfo) -> Option<FaceDetection> {
        let bbox = expand_corners(row.corners, self.margin);
        let width = bbox[2] - bbox[0];
        let height = bbox[3] - bbox[1];
        if !(width >= MIN_BOX_SIDE && height >= MIN_BOX_SIDE) {
            return None;
        }
        let landmarks = FaceLandmarks::new(row.landmarks?).shifted(self.margin);
        Some(FaceDetection {
            bbox,
            confidence: row.score,
            class_id: row.class_id,
            landmarks,
        })
    }
}
