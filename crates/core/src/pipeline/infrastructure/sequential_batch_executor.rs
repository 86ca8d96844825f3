use crate::detection::domain::detection_params::DetectionParams;
use crate::pipeline::batch_executor::{decode_frame, record_outcome, BatchExecutor};
use crate::pipeline::dump_decoder::DumpDecoder;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::tensor_dump::{DecodedFrame, DumpError, FrameTensors};

/// Decodes frames one after another on the calling thread.
///
/// Stops at the first failing frame.
#[derive(Debug, Default)]
pub struct SequentialBatchExecutor;

impl BatchExecutor for SequentialBatchExecutor {
    fn execute(
        &self,
        frames: &[FrameTensors],
        decoder: &dyn DumpDecoder,
        params: &DetectionParams,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Vec<DecodedFrame>, DumpError> {
        let total = frames.len();
        let mut decoded = Vec::with_capacity(total);
        for (i, frame) in frames.iter().enumerate() {
            let outcome = decode_frame(frame, decoder, params);
            record_outcome(logger, decoder.name(), &outcome, i + 1, total);
            decoded.push(outcome.result?);
        }
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_params::NetworkInfo;
    use crate::detection::infrastructure::box_decoder::BoxDecoder;
    use crate::pipeline::pipeline_logger::{LoggingPipelineLogger, NullPipelineLogger};
    use crate::shared::tensor::{
        TensorLayer, BOXES_LAYER, CLASSES_LAYER, COUNT_LAYER, SCORES_LAYER,
    };

    fn params() -> DetectionParams {
        DetectionParams::new(vec![0.5], NetworkInfo::new(640, 640)).unwrap()
    }

    fn frame(index: u64, count: i32) -> FrameTensors {
        FrameTensors::new(
            index,
            vec![
                TensorLayer::int32(COUNT_LAYER, vec![1], vec![count]),
                TensorLayer::float32(BOXES_LAYER, vec![1, 4], vec![10.0, 10.0, 50.0, 60.0]),
                TensorLayer::float32(SCORES_LAYER, vec![1], vec![0.9]),
                TensorLayer::float32(CLASSES_LAYER, vec![1], vec![0.0]),
            ],
        )
    }

    #[test]
    fn test_decodes_every_frame_in_order() {
        let frames = vec![frame(0, 1), frame(1, 0), frame(2, 1)];
        let mut logger = LoggingPipelineLogger::new(1);
        let out = SequentialBatchExecutor
            .execute(&frames, &BoxDecoder::new(), &params(), &mut logger)
            .unwrap();

        let order: Vec<u64> = out.iter().map(|f| f.frame).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(out[1].records.len(), 0);
        assert_eq!(logger.metrics_for("records").unwrap(), &[1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_stops_at_first_error() {
        let frames = vec![frame(0, 1), frame(1, 5), frame(2, -1)];
        let err = SequentialBatchExecutor
            .execute(&frames, &BoxDecoder::new(), &params(), &mut NullPipelineLogger)
            .unwrap_err();
        assert!(matches!(err, DumpError::Decode { frame: 1, .. }));
    }

    #[test]
    fn test_empty_batch() {
        let out = SequentialBatchExecutor
            .execute(&[], &BoxDecoder::new(), &params(), &mut NullPipelineLogger)
            .unwrap();
        assert!(out.is_empty());
    }
}
