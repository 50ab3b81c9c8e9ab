// SPDX-License-Identifier: MIT
//
// Diagnostic logging.
//
// The terminal belongs to the editor, so logs never go to stdout or stderr.
// With `--log-file PATH` a `tracing` subscriber writes to that file through
// a non-blocking appender; without it no subscriber is installed and every
// `tracing` macro is a no-op. The filter comes from `KVI_LOG` (same syntax
// as `RUST_LOG`), defaulting to `info`.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::Error;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "KVI_LOG";

/// Filter used when `KVI_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "info";

/// Open `path` for appending, creating it if needed.
fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the file subscriber when a path is given.
///
/// The returned guard flushes buffered lines when dropped; keep it alive
/// until the session ends.
///
/// # Errors
///
/// Returns [`Error::Log`] if the file cannot be opened.
pub fn init(path: Option<&Path>) -> Result<Option<WorkerGuard>, Error> {
    let Some(path) = path else {
        return Ok(None);
    };

    let file = open_log_file(path).map_err(|source| Error::Log {
        path: path.to_path_buf(),
        source,
    })?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    // A subscriber may already be installed (tests); the guard still works.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init();

    Ok(Some(guard))
}
