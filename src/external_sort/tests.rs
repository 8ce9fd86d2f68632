#[cfg(test)]
mod tests {
    use std::fs;
    use tempfile::tempdir;

    use crate::external_sort::{sort_file, ExternalSortConfig};

    fn small_chunk_config() -> ExternalSortConfig {
        ExternalSortConfig {
            max_chunk_lines: 100,
            ..ExternalSortConfig::default()
        }
    }

    fn run_sort(input_lines: &str, config: &ExternalSortConfig) -> Vec<String> {
        let temp_dir = tempdir().unwrap();
        let input = temp_dir.path().join("input.txt");
        let output = temp_dir.path().join("input_sorted.txt");
        fs::write(&input, input_lines).unwrap();

        sort_file(&input, &output, config).unwrap();

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.is_empty() || content.ends_with('\n'));
        content.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_sorts_lines_ascending() {
        let lines = run_sort("banana\napple\ncherry\n", &ExternalSortConfig::default());
        assert_eq!(lines, vec!["apple", "banana", "cherry"]);
    }

    #[test]
    fn test_preserves_duplicates() {
        let lines = run_sort("b\na\nb\na\nb\n", &ExternalSortConfig::default());
        assert_eq!(lines, vec!["a", "a", "b", "b", "b"]);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let lines = run_sort("", &ExternalSortConfig::default());
        assert!(lines.is_empty());
    }

    #[test]
    fn test_missing_final_newline_is_tolerated() {
        let lines = run_sort("b\na", &ExternalSortConfig::default());
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn test_byte_lexicographic_order() {
        // uppercase sorts before lowercase in byte order
        let lines = run_sort("abc\nABC\nZzz\n", &ExternalSortConfig::default());
        assert_eq!(lines, vec!["ABC", "Zzz", "abc"]);
    }

    #[test]
    fn test_multiset_preserved_across_many_chunks() {
        let mut input = String::new();
        let mut expected: Vec<String> = Vec::new();
        for i in 0..1000 {
            let value = format!("value_{:04}", (i * 7919) % 500);
            input.push_str(&value);
            input.push('\n');
            expected.push(value);
        }
        expected.sort();

        // 100-line chunks force a real k-way merge
        let lines = run_sort(&input, &small_chunk_config());
        assert_eq!(lines.len(), 1000);
        assert_eq!(lines, expected);
    }

    #[test]
    fn test_chunk_files_are_removed() {
        let temp_dir = tempdir().unwrap();
        let input = temp_dir.path().join("input.txt");
        let output = temp_dir.path().join("input_sorted.txt");

        let mut content = String::new();
        for i in 0..500 {
            content.push_str(&format!("line_{}\n", i));
        }
        fs::write(&input, content).unwrap();

        sort_file(&input, &output, &small_chunk_config()).unwrap();

        let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("sort_chunk_"))
            .collect();
        assert!(leftovers.is_empty(), "leftover chunk files: {:?}", leftovers);
    }

    #[test]
    fn test_missing_input_cleans_partial_output() {
        let temp_dir = tempdir().unwrap();
        let input = temp_dir.path().join("does_not_exist.txt");
        let output = temp_dir.path().join("out.txt");

        let result = sort_file(&input, &output, &ExternalSortConfig::default());
        assert!(result.is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ExternalSortConfig::default();
        assert!(config.validate().is_ok());

        config.max_chunk_lines = 10;
        assert!(config.validate().is_err());

        config.max_chunk_lines = 50_000;
        config.io_buffer_size_kb = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_round_trip() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("sort_config.json");

        let config = ExternalSortConfig::default();
        config.to_file(&config_path).unwrap();

        let loaded = ExternalSortConfig::from_file(&config_path).unwrap();
        assert_eq!(config.max_chunk_lines, loaded.max_chunk_lines);
        assert_eq!(config.io_buffer_size_kb, loaded.io_buffer_size_kb);
    }
}
