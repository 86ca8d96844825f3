//! Shared row loop for every detector output decoder.
//!
//! Reads the validated row count, walks the candidate rows in order, applies
//! the per-class precluster threshold and hands surviving rows to a
//! [`ProposalBuilder`], which decides the record geometry (or rejects it).
//! Output order always equals input row order.

use std::cmp::Ordering;

use super::detection_params::{DetectionParams, NetworkInfo};
use crate::shared::error::DecodeError;
use crate::shared::tensor::{RawTensorSet, LANDMARK_STRIDE};

/// One candidate row that passed the confidence threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandidateRow {
    pub index: usize,
    /// Raw `(x1, y1, x2, y2)` as read from the box layer.
    pub corners: [f32; 4],
    pub score: f32,
    pub class_id: usize,
    /// Present only when the tensor set carries a landmark layer.
    pub landmarks: Option<[f32; LANDMARK_STRIDE]>,
}

/// Strategy that turns a thresholded row into an output record.
///
/// Returning `None` drops the row silently (degenerate geometry).
pub trait ProposalBuilder {
    type Proposal;

    fn build(&self, row: &CandidateRow, network: NetworkInfo) -> Option<Self::Proposal>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CandidateDecoder {
    verbose: bool,
}

impl CandidateDecoder {
    /// `verbose` logs every row's raw values and verdict at debug level.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn decode<B: ProposalBuilder>(
        &self,
        tensors: &RawTensorSet<'_>,
        params: &DetectionParams,
        builder: &B,
    ) -> Result<Vec<B::Proposal>, DecodeError> {
        let num_detections = tensors.num_detections();
        let network = params.network();
        let mut proposals = Vec::with_capacity(num_detections);

        for index in 0..num_detections {
            let corners = tensors.corners(index)?;
            let score = tensors.score(index)?;
            let class_id = params.class_index(index, tensors.class_value(index)?)?;
            let threshold = params.threshold(class_id).ok_or(DecodeError::ClassIdOutOfRange {
                row: index,
                class_id,
                num_classes: params.num_classes(),
            })?;

            if score.partial_cmp(&threshold) != Some(Ordering::Greater) {
                if self.verbose {
                    log::debug!(
                        "row {index}: corners={corners:?} score={score} class={class_id} \
                         rejected, threshold {threshold}"
                    );
                }
                continue;
            }

            let landmarks = if tensors.has_landmarks() {
                Some(tensors.landmarks(index)?)
            } else {
                None
            };

            let row = CandidateRow {
                index,
                corners,
                score,
                class_id,
                landmarks,
            };
            match builder.build(&row, network) {
                Some(proposal) => {
                    if self.verbose {
                        log::debug!(
                            "row {index}: corners={corners:?} score={score} class={class_id} accepted"
                        );
                    }
                    proposals.push(proposal);
                }
                None => {
                    if self.verbose {
                        log::debug!(
                            "row {index}: corners={corners:?} score={score} class={class_id} \
                             dropped, degenerate box"
                        );
                    }
                }
            }
        }

        Ok(proposals)
    }
}
