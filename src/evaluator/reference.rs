use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::debug;

use crate::evaluator::reference_index::ReferenceIndex;
use crate::evaluator::{RecordEvaluator, StatefulRecordEvaluator};
use crate::external_sort::{sort_file, ExternalSortConfig};
use crate::messages::{
    MessageCatalog, DEFAULT_CATALOG, FAILURE_MESSAGE_KEY, INCOMPLETE_MESSAGE_KEY,
    REFERENTIAL_INTEGRITY_MESSAGE_KEY,
};
use crate::model::{EvaluationContext, Record, RowType, Term};
use crate::recorder::ValueRecorder;
use crate::result::{Finding, FindingAccumulator, FindingKind, Severity};
use crate::utils::is_blank;

pub const REFERENCE_EVALUATOR_KEY: &str = "referential_integrity";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Field holding the references to check.
    pub source_term: Term,
    pub source_context: EvaluationContext,
    pub source_row_type: RowType,
    /// When set, a source value containing this separator is split into
    /// tokens and each non-blank token is checked on its own.
    #[serde(default)]
    pub multi_value_separator: Option<String>,
    /// Caller-owned directory the evaluator creates its files in.
    pub working_folder: PathBuf,
    #[serde(default)]
    pub sort: ExternalSortConfig,
}

impl ReferenceConfig {
    pub fn new(
        source_term: Term,
        source_context: EvaluationContext,
        source_row_type: RowType,
        working_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_term,
            source_context,
            source_row_type,
            multi_value_separator: None,
            working_folder: working_folder.into(),
            sort: ExternalSortConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.working_folder.is_dir() {
            return Err(anyhow::anyhow!(
                "Working folder {} does not exist or is not a directory",
                self.working_folder.display()
            ));
        }

        if let Some(separator) = &self.multi_value_separator {
            if separator.is_empty() {
                return Err(anyhow::anyhow!("Multi-value separator must not be empty"));
            }
        }

        self.sort.validate()
    }
}

/// Stateful evaluator detecting source field values with no counterpart in
/// the reference index exported by a uniqueness evaluator.
///
/// Source values are spilled and sorted like uniqueness values;
/// finalization walks both sorted files with two cursors and emits one
/// finding per distinct unmatched source value. The comparison is
/// case-sensitive. Not safe for concurrent mutation.
pub struct ReferenceEvaluator {
    config: ReferenceConfig,
    target: ReferenceIndex,
    recorder: ValueRecorder,
    sorted_path: PathBuf,
    catalog: &'static MessageCatalog,
}

impl ReferenceEvaluator {
    /// `target` must come from a uniqueness evaluator that the driver
    /// finalizes before this one.
    pub fn new(config: ReferenceConfig, target: ReferenceIndex) -> Result<Self> {
        config.validate()?;

        let recorder = ValueRecorder::create_in(&config.working_folder)?;
        let sorted_path = recorder.sorted_path();

        Ok(Self {
            config,
            target,
            recorder,
            sorted_path,
            catalog: &DEFAULT_CATALOG,
        })
    }

    pub fn with_catalog(mut self, catalog: &'static MessageCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn target(&self) -> &ReferenceIndex {
        &self.target
    }

    fn matches_restriction(&self, record: &dyn Record, context: EvaluationContext) -> bool {
        context == self.config.source_context
            && self.config.source_row_type.matches(record.row_type())
    }

    /// Sorted merge diff: for every distinct source value absent from the
    /// target index, emit one finding. Blank lines are skipped on both
    /// sides; duplicate source values produce a single finding.
    fn diff_against_target(&mut self, accumulator: &dyn FindingAccumulator) -> Result<usize> {
        sort_file(self.recorder.spill_path(), &self.sorted_path, &self.config.sort)?;

        let own = File::open(&self.sorted_path)
            .with_context(|| format!("can't open sorted values {}", self.sorted_path.display()))?;
        let mut source = BufReader::new(own);
        let mut target = self.target.open()?;

        let mut findings = 0;
        let mut target_head = next_value(&mut target)?;
        let mut previous: Option<String> = None;

        while let Some(current) = next_value(&mut source)? {
            if previous.as_deref() == Some(current.as_str()) {
                continue;
            }

            while matches!(&target_head, Some(head) if head.as_str() < current.as_str()) {
                target_head = next_value(&mut target)?;
            }

            if target_head.as_deref() == Some(current.as_str()) {
                target_head = next_value(&mut target)?;
            } else {
                let message = self.catalog.format(
                    REFERENTIAL_INTEGRITY_MESSAGE_KEY,
                    &[&current, self.target.term_label()],
                );
                accumulator.accept(Finding::new(
                    current.clone(),
                    REFERENCE_EVALUATOR_KEY,
                    self.config.source_context,
                    Some(self.config.source_row_type.clone()),
                    FindingKind::FieldReferentialIntegrity,
                    Severity::Error,
                    message,
                ))?;
                findings += 1;
            }

            previous = Some(current);
        }

        Ok(findings)
    }

    fn diagnostic(&self, kind: FindingKind, severity: Severity, message: String) -> Finding {
        Finding::new(
            "",
            REFERENCE_EVALUATOR_KEY,
            self.config.source_context,
            Some(self.config.source_row_type.clone()),
            kind,
            severity,
            message,
        )
    }
}

impl RecordEvaluator for ReferenceEvaluator {
    fn key(&self) -> &'static str {
        REFERENCE_EVALUATOR_KEY
    }

    fn handle_eval(
        &mut self,
        record: &dyn Record,
        context: EvaluationContext,
    ) -> Option<Finding> {
        if !self.matches_restriction(record, context) {
            return None;
        }

        let value = record.value(&self.config.source_term)?;
        if is_blank(value) {
            return None;
        }

        match &self.config.multi_value_separator {
            Some(separator) if value.contains(separator.as_str()) => {
                for token in value.split(separator.as_str()) {
                    if !is_blank(token) {
                        self.recorder.record(token);
                    }
                }
            }
            _ => self.recorder.record(value),
        }

        None
    }
}

impl StatefulRecordEvaluator for ReferenceEvaluator {
    fn handle_post_iterate(&mut self, accumulator: &dyn FindingAccumulator) -> Result<()> {
        self.recorder.finish();

        match self.diff_against_target(accumulator) {
            Ok(findings) => {
                debug!(
                    source_term = self.config.source_term.simple_name(),
                    target_term = self.target.term_label(),
                    findings,
                    "referential integrity diff finished"
                );
                if self.recorder.is_degraded() {
                    let message = self.catalog.format(
                        INCOMPLETE_MESSAGE_KEY,
                        &[self.config.source_term.simple_name()],
                    );
                    accumulator.accept(self.diagnostic(
                        FindingKind::EvaluationIncomplete,
                        Severity::Warning,
                        message,
                    ))?;
                }
                Ok(())
            }
            Err(e) => {
                let message = self.catalog.format(
                    FAILURE_MESSAGE_KEY,
                    &[self.config.source_term.simple_name(), &e.to_string()],
                );
                let _ = accumulator.accept(self.diagnostic(
                    FindingKind::EvaluationFailure,
                    Severity::Error,
                    message,
                ));
                Err(e)
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        // the target index belongs to the producing evaluator
        self.recorder.delete()?;
        if self.sorted_path.exists() {
            fs::remove_file(&self.sorted_path).with_context(|| {
                format!("can't delete sorted values {}", self.sorted_path.display())
            })?;
        }
        Ok(())
    }
}

fn next_value(reader: &mut BufReader<File>) -> Result<Option<String>> {
    let mut line = String::new();
    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
        }
        if is_blank(&line) {
            continue;
        }
        return Ok(Some(line));
    }
}
