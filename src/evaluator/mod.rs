pub mod reference;
pub mod reference_index;
pub mod uniqueness;


pub use reference::{ReferenceConfig, ReferenceEvaluator, REFERENCE_EVALUATOR_KEY};
pub use reference_index::ReferenceIndex;
pub use uniqueness::{UniquenessConfig, UniquenessEvaluator, UNIQUENESS_EVALUATOR_KEY};

use anyhow::Result;

use crate::model::{EvaluationContext, Record};
use crate::result::{Finding, FindingAccumulator};

/// A component that consumes records and may emit findings.
///
/// Stateless evaluators report through the return value of `handle_eval`;
/// the stateful evaluators in this crate always return `None` there and
/// only report at end-of-stream.
pub trait RecordEvaluator {
    /// Stable registry key identifying the evaluator implementation.
    fn key(&self) -> &'static str;

    fn handle_eval(
        &mut self,
        record: &dyn Record,
        context: EvaluationContext,
    ) -> Option<Finding>;
}

/// An evaluator that buffers state across the whole pass and reports only
/// once the final record has been offered.
///
/// Not safe for concurrent mutation: `handle_eval` calls must be totally
/// ordered and must not overlap `handle_post_iterate` or `close`. A driver
/// finalizes producers before the evaluators bound to them.
pub trait StatefulRecordEvaluator: RecordEvaluator {
    /// Called exactly once, after the final record. Safe with zero records.
    fn handle_post_iterate(&mut self, accumulator: &dyn FindingAccumulator) -> Result<()>;

    /// Idempotent cleanup of the evaluator's temporary files, whether or
    /// not finalization ran.
    fn close(&mut self) -> Result<()>;
}
