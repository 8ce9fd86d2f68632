use anyhow::Result;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::constants::RANDOM_FILE_STEM_LEN;

pub fn setup_logging(verbosity: &str) -> Result<()> {
    let level = match verbosity {
        "silent" => Level::ERROR,
        "normal" => Level::INFO,
        "verbose" => Level::DEBUG,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("dwca_integrity={}", level).parse()?);

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Random stem for evaluator-owned files inside a caller-provided working folder.
pub fn random_file_stem() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_FILE_STEM_LEN)
        .map(char::from)
        .collect()
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
