use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::error;

use crate::constants::*;
use crate::utils::{is_blank, random_file_stem};

/// Append-only buffer of captured strings that spills in batches to a
/// temporary file.
///
/// The spill file is created eagerly with a random stem inside the
/// caller-provided working folder. Spill failures during intake are logged
/// and recorded in a degraded flag instead of interrupting intake; the
/// affected batch is lost.
pub struct ValueRecorder {
    buffer: Vec<String>,
    capacity: usize,
    writer: Option<BufWriter<File>>,
    spill_path: PathBuf,
    degraded: bool,
}

impl ValueRecorder {
    pub fn create_in(working_folder: &Path) -> Result<Self> {
        Self::with_capacity(working_folder, VALUE_BUFFER_THRESHOLD)
    }

    pub fn with_capacity(working_folder: &Path, capacity: usize) -> Result<Self> {
        let spill_path =
            working_folder.join(format!("{}{}", random_file_stem(), TEXT_FILE_EXT));
        let file = File::create(&spill_path)
            .with_context(|| format!("can't create spill file {}", spill_path.display()))?;

        Ok(Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            writer: Some(BufWriter::new(file)),
            spill_path,
            degraded: false,
        })
    }

    pub fn spill_path(&self) -> &Path {
        &self.spill_path
    }

    /// Path of the sorted companion file, `<stem>_sorted.txt` beside the
    /// spill file. The file only exists once the owner has sorted it.
    pub fn sorted_path(&self) -> PathBuf {
        let stem = self
            .spill_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("values");
        self.spill_path
            .with_file_name(format!("{}{}{}", stem, SORTED_FILE_SUFFIX, TEXT_FILE_EXT))
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn record(&mut self, value: &str) {
        self.buffer.push(value.to_owned());
        if self.buffer.len() >= self.capacity {
            self.flush();
        }
    }

    /// Writes the buffered batch to the spill file and clears the buffer.
    /// Must also be invoked at finalization for a partial batch.
    pub fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        if let Err(e) = self.write_buffer() {
            error!("can't write value batch to {}: {}", self.spill_path.display(), e);
            self.degraded = true;
        }
        self.buffer.clear();
    }

    fn write_buffer(&mut self) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .context("spill file is already closed")?;
        for value in &self.buffer {
            if is_blank(value) {
                continue;
            }
            writer.write_all(value.as_bytes())?;
            writer.write_all(ENDLINE.as_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Flushes any partial batch and releases the write handle. The spill
    /// file stays on disk for sorting.
    pub fn finish(&mut self) {
        self.flush();
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                error!("can't close spill file {}: {}", self.spill_path.display(), e);
                self.degraded = true;
            }
        }
    }

    /// Removes the spill file; safe to call more than once.
    pub fn delete(&mut self) -> Result<()> {
        self.writer.take();
        if self.spill_path.exists() {
            fs::remove_file(&self.spill_path).with_context(|| {
                format!("can't delete spill file {}", self.spill_path.display())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_values_are_written_on_flush() {
        let temp_dir = tempdir().unwrap();
        let mut recorder = ValueRecorder::create_in(temp_dir.path()).unwrap();

        recorder.record("a");
        recorder.record("b");
        // nothing written before the buffer flushes
        assert_eq!(fs::read_to_string(recorder.spill_path()).unwrap(), "");

        recorder.finish();
        assert_eq!(fs::read_to_string(recorder.spill_path()).unwrap(), "a\nb\n");
        assert!(!recorder.is_degraded());
    }

    #[test]
    fn test_buffer_spills_at_capacity() {
        let temp_dir = tempdir().unwrap();
        let mut recorder = ValueRecorder::with_capacity(temp_dir.path(), 3).unwrap();

        recorder.record("1");
        recorder.record("2");
        recorder.record("3");

        assert_eq!(fs::read_to_string(recorder.spill_path()).unwrap(), "1\n2\n3\n");
    }

    #[test]
    fn test_blank_values_are_not_written() {
        let temp_dir = tempdir().unwrap();
        let mut recorder = ValueRecorder::create_in(temp_dir.path()).unwrap();

        recorder.record("a");
        recorder.record("");
        recorder.record("   ");
        recorder.record("b");
        recorder.finish();

        assert_eq!(fs::read_to_string(recorder.spill_path()).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_sorted_path_naming() {
        let temp_dir = tempdir().unwrap();
        let recorder = ValueRecorder::create_in(temp_dir.path()).unwrap();

        let spill_name = recorder.spill_path().file_name().unwrap().to_str().unwrap().to_string();
        let sorted_name = recorder.sorted_path().file_name().unwrap().to_str().unwrap().to_string();
        let stem = spill_name.strip_suffix(".txt").unwrap();
        assert_eq!(sorted_name, format!("{}_sorted.txt", stem));
    }

    #[test]
    fn test_failed_spill_sets_degraded_flag() {
        let temp_dir = tempdir().unwrap();
        let mut recorder = ValueRecorder::with_capacity(temp_dir.path(), 1).unwrap();

        recorder.record("kept");
        recorder.finish();
        assert!(!recorder.is_degraded());

        // the write handle is gone, so the next batch is lost and flagged
        recorder.record("lost");
        assert!(recorder.is_degraded());
        assert_eq!(fs::read_to_string(recorder.spill_path()).unwrap(), "kept\n");
    }

    #[test]
    fn test_delete_is_idempotent() {
        let temp_dir = tempdir().unwrap();
        let mut recorder = ValueRecorder::create_in(temp_dir.path()).unwrap();
        recorder.record("x");
        recorder.finish();

        let spill_path = recorder.spill_path().to_path_buf();
        assert!(spill_path.exists());
        recorder.delete().unwrap();
        assert!(!spill_path.exists());
        recorder.delete().unwrap();
    }
}
