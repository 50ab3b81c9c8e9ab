//! Line buffer: the text being edited, one byte vector per line.
//!
//! A [`LineBuffer`] is an ordered `Vec<Line>`, and each [`Line`] is a
//! `Vec<u8>` without its terminator. Columns are byte offsets; there is no
//! Unicode segmentation and no line-ending bookkeeping. Files are saved with
//! `\n` after every line.
//!
//! # Invariants
//!
//! - There is always at least one line. An empty file is one empty line.
//! - A line never contains `\n`. Inserting a line break goes through
//!   [`split`](LineBuffer::split) + [`insert_row`](LineBuffer::insert_row).
//!
//! Out-of-range arguments are not errors: every primitive reports whether
//! it did anything (`bool` or `Option`) and leaves the buffer untouched
//! otherwise. The same primitives serve file loading and interactive edits;
//! none of them touch the screen.

use std::fmt;

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// One line of text, without its terminator.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Line(Vec<u8>);

impl Line {
    /// An empty line.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// The line's bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert `byte` at `col`, shifting the tail right. `col == len()`
    /// appends. Returns `false` (and does nothing) if `col` is out of range
    /// or `byte` is a newline.
    pub fn insert(&mut self, col: usize, byte: u8) -> bool {
        if col > self.0.len() || byte == b'\n' {
            return false;
        }
        self.0.insert(col, byte);
        true
    }

    /// Remove and return the byte at `col`, shifting the tail left.
    pub fn remove(&mut self, col: usize) -> Option<u8> {
        (col < self.0.len()).then(|| self.0.remove(col))
    }

    /// Truncate at `col` and return the removed suffix as a new line.
    pub fn split_off(&mut self, col: usize) -> Option<Self> {
        (col <= self.0.len()).then(|| Self(self.0.split_off(col)))
    }

    /// Append `other`'s bytes.
    pub fn append(&mut self, other: &Self) {
        self.0.extend_from_slice(&other.0);
    }
}

impl From<Vec<u8>> for Line {
    /// Takes the bytes as-is. Callers strip terminators first.
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Line {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for Line {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

// ---------------------------------------------------------------------------
// LineBuffer
// ---------------------------------------------------------------------------

/// The lines of the file being edited. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<Line>,
}

impl LineBuffer {
    // -- Construction -------------------------------------------------------

    /// A buffer holding one empty line.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: vec![Line::new()],
        }
    }

    /// Build from an iterator of lines. No lines yields one empty line.
    #[must_use]
    pub fn from_lines<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Line>,
    {
        let mut lines: Vec<Line> = lines.into_iter().map(Into::into).collect();
        if lines.is_empty() {
            lines.push(Line::new());
        }
        Self { lines }
    }

    // -- Access -------------------------------------------------------------

    /// Number of lines. Always at least 1.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    #[must_use]
    pub fn line(&self, row: usize) -> Option<&Line> {
        self.lines.get(row)
    }

    /// Length of `row` in bytes, or 0 past the end.
    #[inline]
    #[must_use]
    pub fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, Line::len)
    }

    pub fn lines(&self) -> impl ExactSizeIterator<Item = &Line> {
        self.lines.iter()
    }

    /// The serialized file: every line followed by `\n`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let total = self.lines.iter().map(|l| l.len() + 1).sum();
        let mut out = Vec::with_capacity(total);
        for line in &self.lines {
            out.extend_from_slice(line.as_bytes());
            out.push(b'\n');
        }
        out
    }

    // -- Byte edits ---------------------------------------------------------

    /// Insert `byte` into `row` at `col` (`0 ≤ col ≤ len`).
    pub fn insert_char(&mut self, row: usize, col: usize, byte: u8) -> bool {
        self.lines
            .get_mut(row)
            .is_some_and(|line| line.insert(col, byte))
    }

    /// Remove the byte of `row` at `col` (`0 ≤ col < len`) and return it.
    pub fn delete_char(&mut self, row: usize, col: usize) -> Option<u8> {
        self.lines.get_mut(row)?.remove(col)
    }

    // -- Line edits ---------------------------------------------------------

    /// Truncate `row` at `col` and return the removed suffix. The suffix is
    /// not inserted anywhere; pair with [`insert_row`](Self::insert_row).
    pub fn split(&mut self, row: usize, col: usize) -> Option<Line> {
        self.lines.get_mut(row)?.split_off(col)
    }

    /// Append line `row + 1` to line `row` and remove `row + 1`.
    pub fn join(&mut self, row: usize) -> bool {
        if row + 1 >= self.lines.len() {
            return false;
        }
        let next = self.lines.remove(row + 1);
        self.lines[row].append(&next);
        true
    }

    /// Insert `line` so that it becomes row `at` (`0 ≤ at ≤ N`).
    pub fn insert_row(&mut self, at: usize, line: Line) -> bool {
        if at > self.lines.len() {
            return false;
        }
        self.lines.insert(at, line);
        true
    }

    /// Remove and return row `at`. The last remaining line is never removed.
    pub fn delete_row(&mut self, at: usize) -> Option<Line> {
        (at < self.lines.len() && self.lines.len() > 1).then(|| self.lines.remove(at))
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
