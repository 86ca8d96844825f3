//! Face extraction for the live pipeline.
//!
//! Each tensor-output entry attached to a frame is decoded with the face
//! decoder at margin 0. The active resolution context (cropped face crops or
//! the full frame) is carried alongside the result for bookkeeping only; it
//! never changes how boxes or landmarks are built.

use serde::{Deserialize, Serialize};

use super::face_decoder::FaceDecoder;
use crate::detection::domain::detection::FaceDetection;
use crate::detection::domain::detection_params::{DetectionParams, NetworkInfo};
use crate::shared::error::DecodeError;
use crate::shared::tensor::{RawTensorSet, TensorLayer, TensorSetKind};

/// Calibration resolution of the cropped-face model.
pub const CROPPED_FACE_RESOLUTION: NetworkInfo = NetworkInfo::new(160, 320);

/// Calibration resolution of the full-frame model.
pub const FULL_FRAME_RESOLUTION: NetworkInfo = NetworkInfo::new(640, 640);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionContext {
    Cropped,
    #[default]
    FullFrame,
}

impl ResolutionContext {
    pub fn from_fullframe_flag(is_fullframe: bool) -> Self {
        if is_fullframe {
            ResolutionContext::FullFrame
        } else {
            ResolutionContext::Cropped
        }
    }

    pub fn resolution(self) -> NetworkInfo {
        match self {
            ResolutionContext::Cropped => CROPPED_FACE_RESOLUTION,
            ResolutionContext::FullFrame => FULL_FRAME_RESOLUTION,
        }
    }
}

impl std::fmt::Display for ResolutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionContext::Cropped => write!(f, "cropped"),
            ResolutionContext::FullFrame => write!(f, "full_frame"),
        }
    }
}

/// Faces decoded under one resolution context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFaces {
    pub context: ResolutionContext,
    pub resolution: NetworkInfo,
    pub faces: Vec<FaceDetection>,
}

#[derive(Clone, Copy, Debug)]
pub struct FaceExtractor {
    decoder: FaceDecoder,
    context: ResolutionContext,
}

impl FaceExtractor {
    pub fn new(context: ResolutionContext) -> Self {
        Self {
            decoder: FaceDecoder::new(0),
            context,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.decoder = self.decoder.with_verbose(verbose);
        self
    }

    pub fn context(&self) -> ResolutionContext {
        self.context
    }

    /// Decodes a single tensor-output entry.
    pub fn extract(
        &self,
        tensors: &RawTensorSet<'_>,
        params: &DetectionParams,
    ) -> Result<ExtractedFaces, DecodeError> {
        self.extract_all(std::slice::from_ref(tensors), params)
    }

    /// Decodes every tensor-output entry of a frame, appending faces in
    /// entry order.
    pub fn extract_all(
        &self,
        sets: &[RawTensorSet<'_>],
        params: &DetectionParams,
    ) -> Result<ExtractedFaces, DecodeError> {
        let resolution = self.context.resolution();
        if self.decoder.verbose() {
            log::debug!(
                "extracting {} tensor set(s), context {} ({resolution})",
                sets.len(),
                self.context
            );
        }

        let mut faces = Vec::new();
        for tensors in sets {
            faces.extend(self.decoder.decode(tensors, params)?);
        }

        Ok(ExtractedFaces {
            context: self.context,
            resolution,
            faces,
        })
    }

    /// Validates and decodes several five-layer host output lists.
    pub fn extract_layers(
        &self,
        entries: &[&[TensorLayer]],
        params: &DetectionParams,
    ) -> Result<ExtractedFaces, DecodeError> {
        let sets = entries
            .iter()
            .map(|layers| RawTensorSet::from_layers(layers, TensorSetKind::Faces))
            .collect::<Result<Vec<_>, _>>()?;
        self.extract_all(&sets, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const LANDMARKS: [f32; 10] = [
        110.0, 110.0, 120.0, 120.0, 130.0, 130.0, 140.0, 140.0, 150.0, 150.0,
    ];

    fn params() -> DetectionParams {
        DetectionParams::new(vec![0.5], FULL_FRAME_RESOLUTION).unwrap()
    }

    #[rstest]
    #[case::cropped(false, ResolutionContext::Cropped, 160, 320)]
    #[case::full_frame(true, ResolutionContext::FullFrame, 640, 640)]
    fn test_context_from_flag(
        #[case] flag: bool,
        #[case] expected: ResolutionContext,
        #[case] width: u32,
        #[case] height: u32,
    ) {
        let ctx = ResolutionContext::from_fullframe_flag(flag);
        assert_eq!(ctx, expected);
        assert_eq!(ctx.resolution(), NetworkInfo::new(width, height));
    }

    #[test]
    fn test_context_does_not_change_output() {
        let corners = [100.0, 100.0, 150.0, 180.0];
        let set = RawTensorSet::new(1, &corners, &[0.8], &[0.0], Some(&LANDMARKS[..])).unwrap();

        let cropped = FaceExtractor::new(ResolutionContext::Cropped)
            .extract(&set, &params())
            .unwrap();
        let full = FaceExtractor::new(ResolutionContext::FullFrame)
            .with_verbose(true)
            .extract(&set, &params())
            .unwrap();

        assert_eq!(cropped.faces, full.faces);
        assert_eq!(cropped.resolution, CROPPED_FACE_RESOLUTION);
        assert_eq!(full.resolution, FULL_FRAME_RESOLUTION);
        assert_eq!(full.faces[0].bbox, corners);
        assert_eq!(full.faces[0].landmarks.coords(), &LANDMARKS);
    }

    #[test]
    fn test_extract_all_appends_in_entry_order() {
        let first = [10.0, 10.0, 20.0, 20.0];
        let second = [30.0, 30.0, 60.0, 60.0, 70.0, 70.0, 90.0, 90.0];
        let lmk2 = [0.0; 20];
        let sets = [
            RawTensorSet::new(1, &first, &[0.9], &[0.0], Some(&LANDMARKS[..])).unwrap(),
            RawTensorSet::new(2, &second, &[0.9, 0.7], &[0.0, 0.0], Some(&lmk2[..])).unwrap(),
        ];

        let out = FaceExtractor::new(ResolutionContext::default())
            .extract_all(&sets, &params())
            .unwrap();

        let lefts: Vec<f32> = out.faces.iter().map(|f| f.bbox[0]).collect();
        assert_eq!(lefts, vec![10.0, 30.0, 70.0]);
    }

    #[test]
    fn test_extract_all_with_no_entries() {
        let out = FaceExtractor::new(ResolutionContext::Cropped)
            .extract_all(&[], &params())
            .unwrap();
        assert!(out.faces.is_empty());
        assert_eq!(out.context, ResolutionContext::Cropped);
    }

    #[test]
    fn test_extract_layers_rejects_four_layer_entry() {
        use crate::shared::tensor::{BOXES_LAYER, CLASSES_LAYER, COUNT_LAYER, SCORES_LAYER};

        let entry = vec![
            TensorLayer::int32(COUNT_LAYER, vec![1], vec![0]),
            TensorLayer::float32(BOXES_LAYER, vec![0, 4], vec![]),
            TensorLayer::float32(SCORES_LAYER, vec![0], vec![]),
            TensorLayer::float32(CLASSES_LAYER, vec![0], vec![]),
        ];
        let err = FaceExtractor::new(ResolutionContext::FullFrame)
            .extract_layers(&[entry.as_slice()], &params())
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::LayerCount {
                expected: 5,
                actual: 4
            }
        );
    }

    #[test]
    fn test_context_serde_names() {
        let json = serde_json::to_string(&ResolutionContext::FullFrame).unwrap();
        assert_eq!(json, "\"full_frame\"");
        let back: ResolutionContext = serde_json::from_str("\"cropped\"").unwrap();
        assert_eq!(back, ResolutionContext::Cropped);
    }
}
