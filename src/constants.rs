/// Value recorder constants
pub const VALUE_BUFFER_THRESHOLD: usize = 1000;

/// External sort constants
pub const DEFAULT_MAX_CHUNK_LINES: usize = 50_000;
pub const DEFAULT_IO_BUFFER_SIZE_KB: usize = 64;

pub const MIN_CHUNK_LINES: usize = 100;
pub const MAX_CHUNK_LINES: usize = 10_000_000;
pub const MIN_IO_BUFFER_SIZE_KB: usize = 4;
pub const MAX_IO_BUFFER_SIZE_KB: usize = 8192;

pub const BYTES_PER_KB: usize = 1024;

/// File naming constants
pub const TEXT_FILE_EXT: &str = ".txt";
pub const SORTED_FILE_SUFFIX: &str = "_sorted";
pub const SORT_CHUNK_FILE_PREFIX: &str = "sort_chunk_";
pub const ENDLINE: &str = "\n";

pub const RANDOM_FILE_STEM_LEN: usize = 16;
