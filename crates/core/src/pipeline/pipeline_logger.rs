//! Progress and timing observation for batch decoding.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::shared::constants::PROGRESS_LOG_INTERVAL;

/// Receives decode events from the use case and the batch executors.
///
/// Stage names are decoder names (`boxes`, `faces`, `extract`); metric
/// names describe per-frame quantities such as `records`.
pub trait PipelineLogger: Send {
    fn progress(&mut self, current: usize, total: usize);

    /// Milliseconds spent by `stage` on one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// One per-frame sample of `name`.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Called once after the last frame. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Per-frame samples of one stage or metric.
#[derive(Debug, Default, Clone, PartialEq)]
struct Series {
    samples: Vec<f64>,
}

impl Series {
    fn push(&mut self, value: f64) {
        self.samples.push(value);
    }

    fn total(&self) -> f64 {
        self.samples.iter().sum()
    }

    fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.total() / self.samples.len() as f64
        }
    }

    fn max(&self) -> f64 {
        self.samples.iter().copied().fold(0.0, f64::max)
    }
}

/// Forwards decode events to the `log` facade and keeps per-decoder
/// statistics for an end-of-run report.
///
/// Progress lines are emitted every `progress_interval` frames and on the
/// last frame.
pub struct LoggingPipelineLogger {
    progress_interval: usize,
    stages: BTreeMap<String, Series>,
    metrics: BTreeMap<String, Series>,
    started: Instant,
    frames_total: usize,
    frames_done: usize,
    messages: Vec<String>,
}

impl LoggingPipelineLogger {
    pub fn new(progress_interval: usize) -> Self {
        Self {
            progress_interval: progress_interval.max(1),
            stages: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
            frames_total: 0,
            frames_done: 0,
            messages: Vec::new(),
        }
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.stages.get(stage).map(|s| s.samples.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|s| s.samples.as_slice())
    }

    /// Status messages passed to [`PipelineLogger::info`], oldest first.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// End-of-run report, or `None` before any frame was timed or measured.
    pub fn report(&self) -> Option<String> {
        if self.stages.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let wall_s = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Decoded {}/{} frame(s) in {wall_s:.2}s",
            self.frames_done, self.frames_total
        )];

        for (decoder, series) in &self.stages {
            lines.push(format!(
                "  {decoder} decoder: {} frame(s), avg {:.3}ms, max {:.3}ms, total {:.1}ms",
                series.samples.len(),
                series.mean(),
                series.max(),
                series.total()
            ));
        }
        for (name, series) in &self.metrics {
            lines.push(format!(
                "  {name}: {:.0} total, {:.1} per frame",
                series.total(),
                series.mean()
            ));
        }
        if self.frames_done > 0 && wall_s > 0.0 {
            lines.push(format!(
                "  rate: {:.1} frames/s",
                self.frames_done as f64 / wall_s
            ));
        }

        Some(lines.join("\n"))
    }
}

impl Default for LoggingPipelineLogger {
    fn default() -> Self {
        Self::new(PROGRESS_LOG_INTERVAL)
    }
}

impl PipelineLogger for LoggingPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_total = total;
        self.frames_done = current;
        if total == 0 {
            return;
        }
        if current % self.progress_interval == 0 || current == total {
            log::info!(
                "Decoded frame {current} of {total} ({:.0}%)",
                current as f64 * 100.0 / total as f64
            );
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages.entry(stage.to_owned()).or_default().push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_owned()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
        self.messages.push(message.to_owned());
    }

    fn summary(&self) {
        if let Some(report) = self.report() {
            log::info!("{report}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    // ── Series ──────────────────────────────────────────────────────

    #[rstest]
    #[case::empty(vec![], 0.0, 0.0, 0.0)]
    #[case::single(vec![2.5], 2.5, 2.5, 2.5)]
    #[case::several(vec![1.0, 4.0, 1.0], 6.0, 2.0, 4.0)]
    fn test_series_stats(
        #[case] samples: Vec<f64>,
        #[case] total: f64,
        #[case] mean: f64,
        #[case] max: f64,
    ) {
        let series = Series { samples };
        assert_relative_eq!(series.total(), total);
        assert_relative_eq!(series.mean(), mean);
        assert_relative_eq!(series.max(), max);
    }

    // ── NullPipelineLogger ──────────────────────────────────────────

    #[test]
    fn test_null_logger_ignores_events() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 2);
        logger.timing("boxes", 0.4);
        logger.metric("records", 2.0);
        logger.info("ignored");
        logger.summary();
    }

    // ── LoggingPipelineLogger ───────────────────────────────────────

    #[test]
    fn test_samples_kept_per_decoder() {
        let mut logger = LoggingPipelineLogger::new(10);
        logger.timing("faces", 0.2);
        logger.timing("faces", 0.3);
        logger.timing("extract", 0.05);

        let faces = logger.timings_for("faces").unwrap();
        assert_eq!(faces.len(), 2);
        assert_relative_eq!(faces[1], 0.3);
        assert_eq!(logger.timings_for("extract").unwrap().len(), 1);
        assert!(logger.timings_for("boxes").is_none());
    }

    #[test]
    fn test_report_names_decoder_and_record_totals() {
        let mut logger = LoggingPipelineLogger::new(10);
        logger.progress(2, 4);
        logger.timing("boxes", 1.0);
        logger.timing("boxes", 3.0);
        logger.metric("records", 3.0);
        logger.metric("records", 4.0);

        let report = logger.report().unwrap();
        assert!(report.starts_with("Decoded 2/4 frame(s)"));
        assert!(report.contains("boxes decoder: 2 frame(s), avg 2.000ms, max 3.000ms"));
        assert!(report.contains("records: 7 total, 3.5 per frame"));
    }

    #[test]
    fn test_report_empty_until_something_recorded() {
        let mut logger = LoggingPipelineLogger::new(10);
        logger.progress(1, 1);
        assert!(logger.report().is_none());
    }

    #[test]
    fn test_progress_tracks_done_and_total() {
        let mut logger = LoggingPipelineLogger::new(3);
        for i in 1..=7 {
            logger.progress(i, 7);
        }
        assert_eq!((logger.frames_done, logger.frames_total), (7, 7));
    }

    #[test]
    fn test_info_keeps_messages_in_order() {
        let mut logger = LoggingPipelineLogger::new(10);
        logger.info("first");
        logger.info("second");
        assert_eq!(logger.messages(), &["first".to_string(), "second".to_string()]);
    }

    #[rstest]
    #[case::zero_clamped(0, 1)]
    #[case::kept(25, 25)]
    fn test_progress_interval(#[case] requested: usize, #[case] expected: usize) {
        assert_eq!(LoggingPipelineLogger::new(requested).progress_interval, expected);
    }

    #[test]
    fn test_default_interval() {
        assert_eq!(
            LoggingPipelineLogger::default().progress_interval,
            PROGRESS_LOG_INTERVAL
        );
    }
}
