use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::constants::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalSortConfig {
    pub max_chunk_lines: usize,
    pub io_buffer_size_kb: usize,
}

impl Default for ExternalSortConfig {
    fn default() -> Self {
        Self {
            max_chunk_lines: DEFAULT_MAX_CHUNK_LINES,
            io_buffer_size_kb: DEFAULT_IO_BUFFER_SIZE_KB,
        }
    }
}

impl ExternalSortConfig {
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_lines < MIN_CHUNK_LINES || self.max_chunk_lines > MAX_CHUNK_LINES {
            return Err(anyhow::anyhow!(
                "Chunk size must be between {} and {} lines",
                MIN_CHUNK_LINES,
                MAX_CHUNK_LINES
            ));
        }

        if self.io_buffer_size_kb < MIN_IO_BUFFER_SIZE_KB
            || self.io_buffer_size_kb > MAX_IO_BUFFER_SIZE_KB
        {
            return Err(anyhow::anyhow!(
                "IO buffer size must be between {} and {} KB",
                MIN_IO_BUFFER_SIZE_KB,
                MAX_IO_BUFFER_SIZE_KB
            ));
        }

        Ok(())
    }

    pub fn io_buffer_size_bytes(&self) -> usize {
        self.io_buffer_size_kb * BYTES_PER_KB
    }
}
