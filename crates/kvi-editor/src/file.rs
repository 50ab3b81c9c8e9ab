//! Loading and saving the edited file.
//!
//! The format is plain newline-delimited bytes. Loading strips every
//! trailing `\r` and `\n` from each line, so CRLF files open cleanly (and
//! are saved back with LF). Saving writes each line followed by one `\n`,
//! including the last.
//!
//! The editor reaches the disk through the [`FileStore`] trait so tests can
//! record saves without touching the filesystem.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::buffer::{Line, LineBuffer};

/// Where the editor loads from and saves to.
pub trait FileStore {
    /// Read `path` into a buffer. An empty file yields one empty line.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    fn load(&mut self, path: &Path) -> io::Result<LineBuffer>;

    /// Write `buf` to `path`, replacing its contents. Returns the number of
    /// bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    fn save(&mut self, path: &Path, buf: &LineBuffer) -> io::Result<usize>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskStore;

impl FileStore for DiskStore {
    fn load(&mut self, path: &Path) -> io::Result<LineBuffer> {
        let reader = BufReader::new(File::open(path)?);
        let mut lines = Vec::new();
        for raw in reader.split(b'\n') {
            let mut raw = raw?;
            while matches!(raw.last(), Some(b'\r' | b'\n')) {
                raw.pop();
            }
            lines.push(Line::from(raw));
        }
        tracing::debug!(path = %path.display(), lines = lines.len(), "file loaded");
        Ok(LineBuffer::from_lines(lines))
    }

    fn save(&mut self, path: &Path, buf: &LineBuffer) -> io::Result<usize> {
        let bytes = buf.to_bytes();
        fs::write(path, &bytes)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "file saved");
        Ok(bytes.len())
    }
}
