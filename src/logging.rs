// src/logging.rs
//
// Telemetry sinks for Greenwave.
// - EventSink: trait used by episode runners
// - NoopSink:  discards all events
// - FileSink:  writes one JSON line per step for offline analysis

use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::config::Config;
use crate::env::StepResult;
use crate::types::StepIndex;

/// Abstract sink for per-step telemetry.
pub trait EventSink {
    fn log_step(&mut self, step: StepIndex, cfg: &Config, result: &StepResult);
}

/// Sink that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn log_step(&mut self, _step: StepIndex, _cfg: &Config, _result: &StepResult) {
        // intentionally no-op
    }
}

/// JSONL file sink.
///
/// Each step is written as a single JSON object on its own line. The
/// payload is kept small and encoded manually to keep the hot logging
/// path free of intermediate allocations.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    /// Create a new sink writing to `path`.
    pub fn create(path: &str) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl EventSink for FileSink {
    fn log_step(&mut self, step: StepIndex, _cfg: &Config, result: &StepResult) {
        let n = result.observations.len().max(1) as f64;
        let mean_congestion: f64 =
            result.observations.values().map(|o| o.congestion).sum::<f64>() / n;
        let mean_halted: f64 = result
            .observations
            .values()
            .map(|o| o.halted_fraction)
            .sum::<f64>()
            / n;
        let switches: usize = result
            .applied
            .values()
            .filter(|a| a.as_u8() == 1)
            .count();

        let line = format!(
            "{{\
                \"step\":{},\
                \"switches\":{},\
                \"mean_congestion\":{:.6},\
                \"mean_halted\":{:.6},\
                \"reconcile_failures\":{},\
                \"done\":{}\
            }}",
            step,
            switches,
            mean_congestion,
            mean_halted,
            result.info.reconcile_failures.len(),
            result.done,
        );

        // Logging failures are not allowed to kill the episode.
        let _ = writeln!(self.writer, "{line}");
        let _ = self.writer.flush();
    }
}
