use std::thread::ScopedJoinHandle;

use crate::detection::domain::detection_params::DetectionParams;
use crate::pipeline::batch_executor::{decode_frame, record_outcome, BatchExecutor, FrameOutcome};
use crate::pipeline::dump_decoder::DumpDecoder;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::tensor_dump::{DecodedFrame, DumpError, FrameTensors};

const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Decodes frames on a pool of worker threads.
///
/// Layout: `feeder → workers[decode] → main [reassemble/log]`
///
/// Workers pull frame indices from a bounded channel, so decoding order is
/// arbitrary; the main thread puts results back into input order. Every
/// frame is decoded, and the error of the earliest failing frame wins, which
/// keeps the outcome identical to [`SequentialBatchExecutor`].
///
/// [`SequentialBatchExecutor`]: super::sequential_batch_executor::SequentialBatchExecutor
pub struct ThreadedBatchExecutor {
    workers: usize,
    channel_capacity: usize,
}

impl ThreadedBatchExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for ThreadedBatchExecutor {
    fn default() -> Self {
        Self::new(
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        )
    }
}

impl BatchExecutor for ThreadedBatchExecutor {
    fn execute(
        &self,
        frames: &[FrameTensors],
        decoder: &dyn DumpDecoder,
        params: &DetectionParams,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Vec<DecodedFrame>, DumpError> {
        let total = frames.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let workers = self.workers.min(total);
        let cap = self.channel_capacity;
        let mut slots: Vec<Option<Result<DecodedFrame, DumpError>>> =
            (0..total).map(|_| None).collect();

        std::thread::scope(|scope| {
            let (job_tx, job_rx) = crossbeam_channel::bounded::<usize>(cap);
            let (result_tx, result_rx) = crossbeam_channel::bounded::<(usize, FrameOutcome)>(cap);

            let feeder = scope.spawn(move || {
                for index in 0..total {
                    if job_tx.send(index).is_err() {
                        break;
                    }
                }
            });

            let handles: Vec<_> = (0..workers)
                .map(|_| spawn_worker(scope, job_rx.clone(), result_tx.clone(), frames, decoder, params))
                .collect();
            drop(job_rx);
            drop(result_tx);

            let mut done = 0;
            for (index, outcome) in result_rx {
                done += 1;
                record_outcome(logger, decoder.name(), &outcome, done, total);
                slots[index] = Some(outcome.result);
            }

            join_threads(feeder, handles)
        })?;

        let mut decoded = Vec::with_capacity(total);
        for slot in slots {
            match slot {
                Some(result) => decoded.push(result?),
                None => return Err(DumpError::WorkerPanicked("decode worker")),
            }
        }
        Ok(decoded)
    }
}

fn spawn_worker<'scope, 'env>(
    scope: &'scope std::thread::Scope<'scope, 'env>,
    job_rx: crossbeam_channel::Receiver<usize>,
    result_tx: crossbeam_channel::Sender<(usize, FrameOutcome)>,
    frames: &'env [FrameTensors],
    decoder: &'env dyn DumpDecoder,
    params: &'env DetectionParams,
) -> ScopedJoinHandle<'scope, ()> {
    scope.spawn(move || {
        for index in job_rx {
            let outcome = decode_frame(&frames[index], decoder, params);
            if result_tx.send((index, outcome)).is_err() {
                break;
            }
        }
    })
}

/// Joins the feeder and all workers, reporting the first panic.
fn join_threads(
    feeder: ScopedJoinHandle<'_, ()>,
    workers: Vec<ScopedJoinHandle<'_, ()>>,
) -> Result<(), DumpError> {
    let mut first_error = None;
    if feeder.join().is_err() {
        first_error = Some(DumpError::WorkerPanicked("feeder"));
    }
    for handle in workers {
        if handle.join().is_err() && first_error.is_none() {
            first_error = Some(DumpError::WorkerPanicked("decode worker"));
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
