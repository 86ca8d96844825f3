use crate::detection::domain::detection_params::DetectionParams;
use crate::detection::infrastructure::box_decoder::BoxDecoder;
use crate::detection::infrastructure::face_decoder::FaceDecoder;
use crate::detection::infrastructure::face_extractor::FaceExtractor;
use crate::pipeline::tensor_dump::FrameRecords;
use crate::shared::error::DecodeError;
use crate::shared::tensor::TensorLayer;

/// Decodes the captured output layers of a single frame.
///
/// This is a port: the batch executors only see this trait, so any decoder
/// can be run over a tensor dump.
pub trait DumpDecoder: Send + Sync {
    /// Short name used in log lines and timing stages.
    fn name(&self) -> &'static str;

    fn decode_frame(
        &self,
        layers: &[TensorLayer],
        params: &DetectionParams,
    ) -> Result<FrameRecords, DecodeError>;
}

impl DumpDecoder for BoxDecoder {
    fn name(&self) -> &'static str {
        "boxes"
    }

    fn decode_frame(
        &self,
        layers: &[TensorLayer],
        params: &DetectionParams,
    ) -> Result<FrameRecords, DecodeError> {
        self.decode_layers(layers, params).map(FrameRecords::Boxes)
    }
}

impl DumpDecoder for FaceDecoder {
    fn name(&self) -> &'static str {
        "faces"
    }

    fn decode_frame(
        &self,
        layers: &[TensorLayer],
        params: &DetectionParams,
    ) -> Result<FrameRecords, DecodeError> {
        self.decode_layers(layers, params).map(FrameRecords::Faces)
    }
}

impl DumpDecoder for FaceExtractor {
    fn name(&self) -> &'static str {
        "extract"
    }

    fn decode_frame(
        &self,
        layers: &[TensorLayer],
        params: &DetectionParams,
    ) -> Result<FrameRecords, DecodeError> {
        self.extract_layers(&[layers], params).map(FrameRecords::Extracted)
    }
}
