//! Logging initialization

use std::path::PathBuf;

/// Initialize logging based on debug flag
///
/// With `debug`, everything down to `debug` (or `RUST_LOG`) goes to a temp
/// log file whose path is returned. Otherwise warnings and errors go to
/// stderr, so partial listing failures are still visible.
pub fn init_logging(debug: bool) -> Option<PathBuf> {
    if debug {
        let temp_file = tempfile::Builder::new()
            .prefix("svcview-")
            .suffix(".log")
            .tempfile()
            .and_then(|f| f.keep().map_err(|e| e.error))
            .map(|(_, path)| path)
            .unwrap_or_else(|_| {
                std::env::temp_dir().join(format!("svcview-{}.log", std::process::id()))
            });

        match std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&temp_file)
        {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_writer(file)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env()
                            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
                    )
                    .with_ansi(false) // No ANSI codes in log file
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .init();

                return Some(temp_file);
            }
            Err(e) => {
                eprintln!(
                    "Failed to open log file {}: {}, logging to stderr",
                    temp_file.display(),
                    e
                );
            }
        }
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    None
}
