use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{EvaluationContext, RowType};

/// Category of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingKind {
    FieldUniqueness,
    FieldReferentialIntegrity,
    /// Intake lost at least one batch of values; the content findings of
    /// the emitting evaluator may under-report.
    EvaluationIncomplete,
    /// Terminal diagnostic: finalization failed and no content findings
    /// should be trusted.
    EvaluationFailure,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::FieldUniqueness => "FIELD_UNIQUENESS",
            FindingKind::FieldReferentialIntegrity => "FIELD_REFERENTIAL_INTEGRITY",
            FindingKind::EvaluationIncomplete => "EVALUATION_INCOMPLETE",
            FindingKind::EvaluationFailure => "EVALUATION_FAILURE",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural data-quality violation, complete enough to be rendered
/// by any downstream sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub offending_value: String,
    pub evaluator_key: String,
    pub context: EvaluationContext,
    pub row_type: Option<RowType>,
    pub kind: FindingKind,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn new(
        offending_value: impl Into<String>,
        evaluator_key: impl Into<String>,
        context: EvaluationContext,
        row_type: Option<RowType>,
        kind: FindingKind,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            offending_value: offending_value.into(),
            evaluator_key: evaluator_key.into(),
            context,
            row_type,
            kind,
            severity,
            message: message.into(),
        }
    }
}
