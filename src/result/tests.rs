#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::model::{EvaluationContext, RowType};
    use crate::result::{CsvAccumulator, Finding, FindingAccumulator, FindingKind, InMemoryAccumulator, Severity};

    fn sample_finding(value: &str) -> Finding {
        Finding::new(
            value,
            "uniqueness",
            EvaluationContext::Core,
            Some(RowType::new("http://rs.tdwg.org/dwc/terms/Taxon")),
            FindingKind::FieldUniqueness,
            Severity::Error,
            format!("{} is not unique for taxonID", value),
        )
    }

    #[test]
    fn test_in_memory_read_back() {
        let accumulator = InMemoryAccumulator::new();
        accumulator.accept(sample_finding("a")).unwrap();
        accumulator.accept(sample_finding("b")).unwrap();

        let findings = accumulator.findings();
        assert_eq!(accumulator.count(), 2);
        assert_eq!(findings[0].offending_value, "a");
        assert_eq!(findings[1].offending_value, "b");
        assert_eq!(accumulator.dropped(), 0);
    }

    #[test]
    fn test_in_memory_bounded_drops_overflow() {
        let accumulator = InMemoryAccumulator::bounded(2);
        for value in ["a", "b", "c", "d"] {
            accumulator.accept(sample_finding(value)).unwrap();
        }

        assert_eq!(accumulator.count(), 2);
        assert_eq!(accumulator.dropped(), 2);
    }

    #[test]
    fn test_csv_accumulator_rows() {
        let temp_dir = tempdir().unwrap();
        let output = temp_dir.path().join("findings.csv");

        let accumulator = CsvAccumulator::create(&output).unwrap();
        accumulator.accept(sample_finding("t-1")).unwrap();
        let mut diagnostic = sample_finding("");
        diagnostic.row_type = None;
        diagnostic.kind = FindingKind::EvaluationIncomplete;
        diagnostic.severity = Severity::Warning;
        accumulator.accept(diagnostic).unwrap();
        accumulator.flush().unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("offending_value,evaluator_key,context"));
        assert!(lines[1].contains("t-1"));
        assert!(lines[1].contains("FIELD_UNIQUENESS"));
        assert!(lines[1].contains("ERROR"));
        // absent row type serializes as an empty column
        assert!(lines[2].contains("CORE,,EVALUATION_INCOMPLETE"));
        assert!(lines[2].contains("WARNING"));
    }

    #[test]
    fn test_finding_serialization_names() {
        let json = serde_json::to_string(&sample_finding("x")).unwrap();
        assert!(json.contains("\"FIELD_UNIQUENESS\""));
        assert!(json.contains("\"ERROR\""));
        assert!(json.contains("\"CORE\""));
    }
}
