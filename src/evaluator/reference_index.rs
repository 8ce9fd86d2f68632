use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Typed handle to the sorted value file a uniqueness evaluator exports.
///
/// The handle can be taken before finalization; the file only exists once
/// the producing evaluator has been finalized. The file is owned by the
/// producer and must not be deleted through this handle.
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    evaluator_key: &'static str,
    term_label: String,
    path: PathBuf,
}

impl ReferenceIndex {
    pub(crate) fn new(evaluator_key: &'static str, term_label: String, path: PathBuf) -> Self {
        Self {
            evaluator_key,
            term_label,
            path,
        }
    }

    /// Key of the uniqueness evaluator that produces the index.
    pub fn evaluator_key(&self) -> &'static str {
        self.evaluator_key
    }

    /// Short name of the term whose values the index holds.
    pub fn term_label(&self) -> &str {
        &self.term_label
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open(&self) -> Result<BufReader<File>> {
        let file = File::open(&self.path).with_context(|| {
            format!(
                "can't open reference index {} (was the producing evaluator finalized?)",
                self.path.display()
            )
        })?;
        Ok(BufReader::new(file))
    }
}
