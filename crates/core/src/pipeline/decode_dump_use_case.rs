use std::io::Write;
use std::path::Path;

use crate::detection::domain::detection_params::DetectionParams;
use crate::pipeline::batch_executor::BatchExecutor;
use crate::pipeline::dump_decoder::DumpDecoder;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::tensor_dump::{DecodedDump, DumpError, TensorDump};

/// Tensor dump pipeline: read → decode (per frame) → write.
pub struct DecodeDumpUseCase {
    executor: Box<dyn BatchExecutor>,
    decoder: Box<dyn DumpDecoder>,
    logger: Box<dyn PipelineLogger>,
}

impl DecodeDumpUseCase {
    pub fn new(
        executor: Box<dyn BatchExecutor>,
        decoder: Box<dyn DumpDecoder>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            executor,
            decoder,
            logger,
        }
    }

    /// Decodes every frame of an in-memory dump.
    pub fn decode(
        &mut self,
        dump: &TensorDump,
        params: &DetectionParams,
    ) -> Result<DecodedDump, DumpError> {
        self.logger.info(&format!(
            "Decoding {} frame(s) with the {} decoder",
            dump.frames.len(),
            self.decoder.name()
        ));
        let frames = self.executor.execute(
            &dump.frames,
            self.decoder.as_ref(),
            params,
            self.logger.as_mut(),
        )?;
        let decoded = DecodedDump { frames };
        self.logger.info(&format!(
            "Decoded {} record(s) across {} frame(s)",
            decoded.total_records(),
            decoded.frames.len()
        ));
        self.logger.summary();
        Ok(decoded)
    }

    /// Reads a dump from `input` and writes the decoded result to `output`.
    pub fn execute<W: Write>(
        &mut self,
        input: &Path,
        params: &DetectionParams,
        output: W,
    ) -> Result<DecodedDump, DumpError> {
        let dump = TensorDump::load(input)?;
        let decoded = self.decode(&dump, params)?;
        decoded.write_to(output)?;
        Ok(decoded)
    }
}
