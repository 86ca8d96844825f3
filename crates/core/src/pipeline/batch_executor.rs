use std::time::{Duration, Instant};

use crate::detection::domain::detection_params::DetectionParams;
use crate::detection::domain::frame_scaler::FrameScaler;
use crate::pipeline::dump_decoder::DumpDecoder;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::tensor_dump::{DecodedFrame, DumpError, FrameTensors};
use crate::shared::error::DecodeError;

/// Abstracts how a batch of captured frames is decoded.
///
/// This is a port (application-layer interface). Infrastructure provides
/// the concrete strategies (sequential, worker pool). Every implementation
/// returns frames in input order and, on failure, the error of the
/// earliest failing frame.
pub trait BatchExecutor: Send {
    fn execute(
        &self,
        frames: &[FrameTensors],
        decoder: &dyn DumpDecoder,
        params: &DetectionParams,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Vec<DecodedFrame>, DumpError>;
}

/// Result of decoding one frame, with the time spent doing it.
pub struct FrameOutcome {
    pub result: Result<DecodedFrame, DumpError>,
    pub elapsed: Duration,
}

/// Decodes one frame and rescales it when the dump records a frame size.
pub fn decode_frame(
    frame: &FrameTensors,
    decoder: &dyn DumpDecoder,
    params: &DetectionParams,
) -> FrameOutcome {
    let start = Instant::now();
    let result = decode_and_rescale(frame, decoder, params);
    FrameOutcome {
        result,
        elapsed: start.elapsed(),
    }
}

fn decode_and_rescale(
    frame: &FrameTensors,
    decoder: &dyn DumpDecoder,
    params: &DetectionParams,
) -> Result<DecodedFrame, DumpError> {
    let decode_err = |source: DecodeError| DumpError::Decode {
        frame: frame.frame,
        source,
    };
    let mut records = decoder
        .decode_frame(&frame.layers, params)
        .map_err(decode_err)?;
    if let Some((width, height)) = frame.frame_size() {
        let scaler = FrameScaler::new(params.network(), width, height).map_err(decode_err)?;
        records = records.rescaled(&scaler);
    }
    Ok(DecodedFrame {
        frame: frame.frame,
        records,
    })
}

/// Reports a finished frame to the logger.
pub fn record_outcome(
    logger: &mut dyn PipelineLogger,
    stage: &str,
    outcome: &FrameOutcome,
    current: usize,
    total: usize,
) {
    logger.timing(stage, outcome.elapsed.as_secs_f64() * 1000.0);
    if let Ok(decoded) = &outcome.result {
        logger.metric("records", decoded.records.len() as f64);
    }
    logger.progress(current, total);
}
