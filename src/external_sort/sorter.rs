use anyhow::{Context, Result};
use rayon::prelude::*;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::external_sort::config::ExternalSortConfig;
use crate::utils::random_file_stem;

#[derive(Debug)]
struct MergeEntry {
    line: String,
    chunk_id: usize,
}

impl PartialEq for MergeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.line == other.line && self.chunk_id == other.chunk_id
    }
}

impl Eq for MergeEntry {}

impl PartialOrd for MergeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // chunk index breaks ties so equal lines keep their input order
        self.line
            .cmp(&other.line)
            .then(self.chunk_id.cmp(&other.chunk_id))
    }
}

/// Sorts the lines of `input` into `output` in ascending byte-lexicographic
/// order, holding at most `max_chunk_lines` lines in memory at a time.
///
/// Duplicate lines are preserved, the sort is stable with respect to the
/// input order of equal lines, and every output line is `\n`-terminated
/// even when the input's final line is not. On failure all chunk files and
/// the partial output are removed before the error propagates.
pub fn sort_file(input: &Path, output: &Path, config: &ExternalSortConfig) -> Result<()> {
    let mut chunk_files = Vec::new();
    let result = sort_file_inner(input, output, config, &mut chunk_files);

    for chunk_file in &chunk_files {
        if chunk_file.exists() {
            let _ = fs::remove_file(chunk_file);
        }
    }
    if result.is_err() && output.exists() {
        let _ = fs::remove_file(output);
    }

    result
}

fn sort_file_inner(
    input: &Path,
    output: &Path,
    config: &ExternalSortConfig,
    chunk_files: &mut Vec<PathBuf>,
) -> Result<()> {
    let chunk_dir = output.parent().map(Path::to_path_buf).unwrap_or_default();
    let chunk_stem = random_file_stem();

    write_sorted_chunks(input, &chunk_dir, &chunk_stem, config, chunk_files)?;
    merge_chunks(chunk_files, output, config)
}

fn write_sorted_chunks(
    input: &Path,
    chunk_dir: &Path,
    chunk_stem: &str,
    config: &ExternalSortConfig,
    chunk_files: &mut Vec<PathBuf>,
) -> Result<()> {
    let file = File::open(input)
        .with_context(|| format!("can't open sort input {}", input.display()))?;
    let mut reader = BufReader::with_capacity(config.io_buffer_size_bytes(), file);

    let mut current_chunk: Vec<String> = Vec::new();
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            break;
        }

        if line.ends_with('\n') {
            line.pop();
        }
        current_chunk.push(line.clone());

        if current_chunk.len() >= config.max_chunk_lines {
            let chunk_file = sort_and_write_chunk(
                chunk_dir,
                chunk_stem,
                chunk_files.len(),
                std::mem::take(&mut current_chunk),
                config,
            )?;
            chunk_files.push(chunk_file);
        }
    }

    if !current_chunk.is_empty() {
        let chunk_file =
            sort_and_write_chunk(chunk_dir, chunk_stem, chunk_files.len(), current_chunk, config)?;
        chunk_files.push(chunk_file);
    }

    Ok(())
}

fn sort_and_write_chunk(
    chunk_dir: &Path,
    chunk_stem: &str,
    chunk_id: usize,
    mut lines: Vec<String>,
    config: &ExternalSortConfig,
) -> Result<PathBuf> {
    // stable, so equal lines stay in read order within the chunk
    lines.par_sort();

    let chunk_file = chunk_dir.join(format!(
        "{}{}_{}{}",
        SORT_CHUNK_FILE_PREFIX, chunk_stem, chunk_id, TEXT_FILE_EXT
    ));

    let file = File::create(&chunk_file)
        .with_context(|| format!("can't create sort chunk {}", chunk_file.display()))?;
    let mut writer = BufWriter::with_capacity(config.io_buffer_size_bytes(), file);

    for line in &lines {
        writer.write_all(line.as_bytes())?;
        writer.write_all(ENDLINE.as_bytes())?;
    }
    writer.flush()?;

    Ok(chunk_file)
}

fn merge_chunks(chunk_files: &[PathBuf], output: &Path, config: &ExternalSortConfig) -> Result<()> {
    let file = File::create(output)
        .with_context(|| format!("can't create sort output {}", output.display()))?;
    let mut writer = BufWriter::with_capacity(config.io_buffer_size_bytes(), file);

    let mut chunk_readers = Vec::with_capacity(chunk_files.len());
    for chunk_file in chunk_files {
        let file = File::open(chunk_file)?;
        chunk_readers.push(BufReader::with_capacity(config.io_buffer_size_bytes(), file));
    }

    let mut merge_heap = BinaryHeap::with_capacity(chunk_readers.len());
    for (chunk_id, reader) in chunk_readers.iter_mut().enumerate() {
        if let Some(line) = read_next_line(reader)? {
            merge_heap.push(Reverse(MergeEntry { line, chunk_id }));
        }
    }

    while let Some(Reverse(entry)) = merge_heap.pop() {
        writer.write_all(entry.line.as_bytes())?;
        writer.write_all(ENDLINE.as_bytes())?;

        if let Some(next_line) = read_next_line(&mut chunk_readers[entry.chunk_id])? {
            merge_heap.push(Reverse(MergeEntry {
                line: next_line,
                chunk_id: entry.chunk_id,
            }));
        }
    }

    writer.flush()?;
    Ok(())
}

fn read_next_line(reader: &mut BufReader<File>) -> Result<Option<String>> {
    let mut line = String::new();
    let bytes_read = reader.read_line(&mut line)?;
    if bytes_read == 0 {
        return Ok(None);
    }
    if line.ends_with('\n') {
        line.pop();
    }
    Ok(Some(line))
}
