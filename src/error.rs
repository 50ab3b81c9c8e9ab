// SPDX-License-Identifier: MIT
//
// Failure taxonomy for the kvi binary.
//
// Library crates speak `io::Result`; this enum records which stage failed,
// which decides the exit code and whether the terminal was ever touched.
// Usage and open failures happen before raw mode. Terminal failures happen
// inside the session, after the raw mode guard has already restored the
// terminal.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad or missing command-line arguments, or `--help`/`--version`.
    #[error(transparent)]
    Usage(clap::Error),

    /// The log file could not be opened.
    #[error("{}: {source}", path.display())]
    Log {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file to edit could not be loaded.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Raw mode, window size, or a terminal read/write failed.
    #[error("terminal: {0}")]
    Terminal(#[source] io::Error),
}

impl Error {
    /// Process exit code. `--help` and `--version` exit 0; every real
    /// failure exits 1.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(e) if !e.use_stderr() => 0,
            _ => 1,
        }
    }
}
