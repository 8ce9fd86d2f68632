pub mod constants;
pub mod evaluator;
pub mod external_sort;
pub mod messages;
pub mod model;
pub mod recorder;
pub mod result;
pub mod utils;

// Re-export main types for easier access
pub use evaluator::{
    RecordEvaluator, ReferenceConfig, ReferenceEvaluator, ReferenceIndex,
    StatefulRecordEvaluator, UniquenessConfig, UniquenessEvaluator,
};
pub use external_sort::ExternalSortConfig;
pub use messages::MessageCatalog;
pub use model::{EvaluationContext, FieldRecord, Record, RowType, Term};
pub use result::{
    CsvAccumulator, Finding, FindingAccumulator, FindingKind, InMemoryAccumulator, Severity,
};
