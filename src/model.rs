use serde::{Deserialize, Serialize};
use std::fmt;

/// Column identifier with a short name and a qualified name.
/// Terms are value-equal and immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    simple_name: String,
    qualified_name: String,
}

impl Term {
    pub fn new(simple_name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        Self {
            simple_name: simple_name.into(),
            qualified_name: qualified_name.into(),
        }
    }

    pub fn simple_name(&self) -> &str {
        &self.simple_name
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.simple_name)
    }
}

/// Qualified identifier of the stream a record belongs to.
/// Restriction matching is case-insensitive; the stored form is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowType(String);

impl RowType {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self(qualified_name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: &RowType) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discriminator between the archive's core stream and its extension streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationContext {
    Core,
    Ext,
}

impl EvaluationContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationContext::Core => "CORE",
            EvaluationContext::Ext => "EXT",
        }
    }
}

impl fmt::Display for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one tabular row as presented to evaluators.
///
/// Records are ephemeral; an evaluator must copy anything it keeps past the
/// current `handle_eval` call.
pub trait Record {
    /// Primary identifier of the record within its stream.
    fn id(&self) -> &str;

    fn row_type(&self) -> &RowType;

    /// Value of the given term, or `None` when the column is absent.
    fn value(&self, term: &Term) -> Option<&str>;
}

/// Owned record backed by a list of term/value pairs.
#[derive(Debug, Clone)]
pub struct FieldRecord {
    id: String,
    row_type: RowType,
    fields: Vec<(Term, String)>,
}

impl FieldRecord {
    pub fn new(id: impl Into<String>, row_type: RowType) -> Self {
        Self {
            id: id.into(),
            row_type,
            fields: Vec::new(),
        }
    }

    pub fn with_value(mut self, term: Term, value: impl Into<String>) -> Self {
        self.fields.push((term, value.into()));
        self
    }
}

impl Record for FieldRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn row_type(&self) -> &RowType {
        &self.row_type
    }

    fn value(&self, term: &Term) -> Option<&str> {
        self.fields
            .iter()
            .find(|(t, _)| t == term)
            .map(|(_, v)| v.as_str())
    }
}
