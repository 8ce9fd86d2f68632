use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::fs::File;
use std::path::Path;
use tracing::warn;

use crate::result::finding::Finding;

const CSV_HEADER: [&str; 7] = [
    "offending_value",
    "evaluator_key",
    "context",
    "row_type",
    "kind",
    "severity",
    "message",
];

/// Write-only sink for findings.
///
/// `accept` must be safe to call from evaluators running on distinct
/// threads; implementations serialize internally.
pub trait FindingAccumulator: Send + Sync {
    fn accept(&self, finding: Finding) -> Result<()>;
}

#[derive(Default)]
struct InMemoryState {
    findings: Vec<Finding>,
    dropped: usize,
    overflow_warned: bool,
}

/// Accumulator backed by a vector, with read-back access. Optionally
/// bounded; findings past the bound are dropped and counted.
#[derive(Default)]
pub struct InMemoryAccumulator {
    state: Mutex<InMemoryState>,
    capacity: Option<usize>,
}

impl InMemoryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounded(capacity: usize) -> Self {
        Self {
            state: Mutex::new(InMemoryState::default()),
            capacity: Some(capacity),
        }
    }

    pub fn findings(&self) -> Vec<Finding> {
        self.state.lock().findings.clone()
    }

    pub fn count(&self) -> usize {
        self.state.lock().findings.len()
    }

    pub fn dropped(&self) -> usize {
        self.state.lock().dropped
    }
}

impl FindingAccumulator for InMemoryAccumulator {
    fn accept(&self, finding: Finding) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(capacity) = self.capacity {
            if state.findings.len() >= capacity {
                state.dropped += 1;
                if !state.overflow_warned {
                    state.overflow_warned = true;
                    warn!(capacity, "finding accumulator is full, dropping further findings");
                }
                return Ok(());
            }
        }
        state.findings.push(finding);
        Ok(())
    }
}

/// Accumulator writing one CSV row per finding, header first.
pub struct CsvAccumulator {
    writer: Mutex<csv::Writer<File>>,
}

impl CsvAccumulator {
    pub fn create(path: &Path) -> Result<Self> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("can't create finding output file {}", path.display()))?;
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;
        Ok(Self {
            writer: Mutex::new(writer),
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }
}

impl FindingAccumulator for CsvAccumulator {
    fn accept(&self, finding: Finding) -> Result<()> {
        let row_type = finding
            .row_type
            .as_ref()
            .map(|r| r.as_str().to_string())
            .unwrap_or_default();
        self.writer.lock().write_record([
            finding.offending_value.as_str(),
            finding.evaluator_key.as_str(),
            finding.context.as_str(),
            row_type.as_str(),
            finding.kind.as_str(),
            finding.severity.as_str(),
            finding.message.as_str(),
        ])?;
        Ok(())
    }
}

impl Drop for CsvAccumulator {
    fn drop(&mut self) {
        if let Err(e) = self.writer.lock().flush() {
            warn!("can't flush finding output file on drop: {}", e);
        }
    }
}
