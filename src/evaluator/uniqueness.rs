use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::evaluator::reference_index::ReferenceIndex;
use crate::evaluator::{RecordEvaluator, StatefulRecordEvaluator};
use crate::external_sort::{sort_file, ExternalSortConfig};
use crate::messages::{
    MessageCatalog, DEFAULT_CATALOG, FAILURE_MESSAGE_KEY, INCOMPLETE_MESSAGE_KEY,
    UNIQUENESS_MESSAGE_KEY,
};
use crate::model::{EvaluationContext, Record, RowType, Term};
use crate::recorder::ValueRecorder;
use crate::result::{Finding, FindingAccumulator, FindingKind, Severity};
use crate::utils::is_blank;

pub const UNIQUENESS_EVALUATOR_KEY: &str = "uniqueness";

/// Label used in messages when the evaluation targets the record's primary
/// identifier rather than a term.
const CORE_ID_LABEL: &str = "coreId";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniquenessConfig {
    /// Records outside this context are ignored.
    pub context: EvaluationContext,
    /// When set, records of any other row-type are ignored
    /// (case-insensitive comparison).
    #[serde(default)]
    pub row_type: Option<RowType>,
    /// Term whose values must be unique; the record's primary identifier
    /// when absent.
    #[serde(default)]
    pub term: Option<Term>,
    /// Caller-owned directory the evaluator creates its files in.
    pub working_folder: PathBuf,
    /// Compare the duplicate scan case-sensitively. The default mirrors the
    /// archive convention of case-preserved but case-insensitively compared
    /// identifiers.
    #[serde(default)]
    pub case_sensitive: bool,
    /// When set, values containing this separator are rejected at intake.
    /// Use the separator a downstream referential evaluator splits on, so
    /// the exported index can never hold a value that side would split.
    #[serde(default)]
    pub reject_separator: Option<String>,
    #[serde(default)]
    pub sort: ExternalSortConfig,
}

impl UniquenessConfig {
    pub fn new(context: EvaluationContext, working_folder: impl Into<PathBuf>) -> Self {
        Self {
            context,
            row_type: None,
            term: None,
            working_folder: working_folder.into(),
            case_sensitive: false,
            reject_separator: None,
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

        if let Some(separator) = &self.reject_separator {
            if separator.is_empty() {
                return Err(anyhow::anyhow!("Reject separator must not be empty"));
            }
        }

        self.sort.validate()
    }
}

/// Stateful evaluator detecting repeated values of one field within one
/// stream.
///
/// Values are spilled to a temporary file during intake; finalization sorts
/// the spill into the exported reference index and scans it with a one-line
/// lookback for adjacent equal values. Not safe for concurrent mutation.
pub struct UniquenessEvaluator {
    config: UniquenessConfig,
    term_label: String,
    recorder: ValueRecorder,
    sorted_path: PathBuf,
    catalog: &'static MessageCatalog,
}

impl UniquenessEvaluator {
    pub fn new(config: UniquenessConfig) -> Result<Self> {
        config.validate()?;

        let term_label = config
            .term
            .as_ref()
            .map(|term| term.simple_name().to_string())
            .unwrap_or_else(|| CORE_ID_LABEL.to_string());

        let recorder = ValueRecorder::create_in(&config.working_folder)?;
        let sorted_path = recorder.sorted_path();

        Ok(Self {
            config,
            term_label,
            recorder,
            sorted_path,
            catalog: &DEFAULT_CATALOG,
        })
    }

    pub fn with_catalog(mut self, catalog: &'static MessageCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Handle other evaluators use to consult this evaluator's sorted
    /// values. The underlying file exists once finalization has run.
    pub fn reference_index(&self) -> ReferenceIndex {
        ReferenceIndex::new(
            UNIQUENESS_EVALUATOR_KEY,
            self.term_label.clone(),
            self.sorted_path.clone(),
        )
    }

    fn matches_restriction(&self, record: &dyn Record, context: EvaluationContext) -> bool {
        if context != self.config.context {
            return false;
        }
        match &self.config.row_type {
            Some(restriction) => restriction.matches(record.row_type()),
            None => true,
        }
    }

    fn is_duplicate(&self, previous: &str, current: &str) -> bool {
        if self.config.case_sensitive {
            previous == current
        } else {
            previous == current || previous.to_lowercase() == current.to_lowercase()
        }
    }

    fn sort_and_scan(&mut self, accumulator: &dyn FindingAccumulator) -> Result<usize> {
        sort_file(self.recorder.spill_path(), &self.sorted_path, &self.config.sort)?;

        let file = File::open(&self.sorted_path)
            .with_context(|| format!("can't open sorted values {}", self.sorted_path.display()))?;
        let reader = BufReader::new(file);

        let mut duplicates = 0;
        let mut previous: Option<String> = None;
        for line in reader.lines() {
            let line = line?;
            if let Some(previous) = &previous {
                if self.is_duplicate(previous, &line) {
                    let message =
                        self.catalog.format(UNIQUENESS_MESSAGE_KEY, &[&line, &self.term_label]);
                    accumulator.accept(Finding::new(
                        line.clone(),
                        UNIQUENESS_EVALUATOR_KEY,
                        self.config.context,
                        self.config.row_type.clone(),
                        FindingKind::FieldUniqueness,
                        Severity::Error,
                        message,
                    ))?;
                    duplicates += 1;
                }
            }
            previous = Some(line);
        }

        Ok(duplicates)
    }

    fn diagnostic(&self, kind: FindingKind, severity: Severity, message: String) -> Finding {
        Finding::new(
            "",
            UNIQUENESS_EVALUATOR_KEY,
            self.config.context,
            self.config.row_type.clone(),
            kind,
            severity,
            message,
        )
    }
}

impl RecordEvaluator for UniquenessEvaluator {
    fn key(&self) -> &'static str {
        UNIQUENESS_EVALUATOR_KEY
    }

    fn handle_eval(
        &mut self,
        record: &dyn Record,
        context: EvaluationContext,
    ) -> Option<Finding> {
        if !self.matches_restriction(record, context) {
            return None;
        }

        let value = match &self.config.term {
            Some(term) => record.value(term)?,
            None => record.id(),
        };

        if is_blank(value) {
            return None;
        }

        if let Some(separator) = &self.config.reject_separator {
            if value.contains(separator.as_str()) {
                warn!(
                    value,
                    separator = separator.as_str(),
                    "rejecting value containing the multi-value separator"
                );
                return None;
            }
        }

        self.recorder.record(value);
        None
    }
}

impl StatefulRecordEvaluator for UniquenessEvaluator {
    fn handle_post_iterate(&mut self, accumulator: &dyn FindingAccumulator) -> Result<()> {
        self.recorder.finish();

        match self.sort_and_scan(accumulator) {
            Ok(duplicates) => {
                debug!(
                    term = self.term_label.as_str(),
                    duplicates, "uniqueness scan finished"
                );
                if self.recorder.is_degraded() {
                    let message =
                        self.catalog.format(INCOMPLETE_MESSAGE_KEY, &[&self.term_label]);
                    accumulator.accept(self.diagnostic(
                        FindingKind::EvaluationIncomplete,
                        Severity::Warning,
                        message,
                    ))?;
                }
                Ok(())
            }
            Err(e) => {
                let message = self
                    .catalog
                    .format(FAILURE_MESSAGE_KEY, &[&self.term_label, &e.to_string()]);
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
        self.recorder.delete()?;
        if self.sorted_path.exists() {
            fs::remove_file(&self.sorted_path).with_context(|| {
                format!("can't delete sorted values {}", self.sorted_path.display())
            })?;
        }
        Ok(())
    }
}
