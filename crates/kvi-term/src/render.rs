// SPDX-License-Identifier: MIT
//
// Render channel: the per-keystroke output accumulator.
//
// Every key the editor processes produces a small, targeted diff: reposition
// the cursor, rewrite one or two rows, reposition again. `RenderChannel`
// collects those bytes in memory so the whole diff reaches the terminal in a
// single write() syscall. Handlers never build escape strings themselves;
// they call the named operations here (move, rewrite-row, scroll) and the
// `ansi` module supplies the bytes.
//
// Row rewrites are always whole-row: save the cursor, return to column 0,
// erase, write the row, erase the remainder, restore the cursor. There is no
// intra-line diffing. Bandwidth is traded for simplicity, and the rows are
// short.

use std::io::{self, Write};

use crate::ansi;
use crate::terminal::TerminalIo;

// ─── RenderChannel ───────────────────────────────────────────────────────────

/// A byte buffer that accumulates terminal output for a single write.
///
/// Owned by the event loop, lent to the editor for the duration of one key.
/// [`flush`](Self::flush) writes everything and clears the buffer while
/// keeping its allocation for the next key.
///
/// Default capacity: 4 KB. A keystroke diff is usually well under 200 bytes;
/// a full-screen repaint of a large window may grow the buffer once.
#[derive(Debug)]
pub struct RenderChannel {
    buf: Vec<u8>,
    /// Screen width in cells. Row content is clipped to this. `0` disables
    /// clipping (unknown width).
    width: usize,
}

const DEFAULT_CAPACITY: usize = 4096;

impl RenderChannel {
    /// Create an empty channel for a screen `width` cells wide.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
            width,
        }
    }

    /// Screen width used for clipping rows.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Update the clipping width after a resize.
    #[inline]
    pub const fn set_width(&mut self, width: usize) {
        self.width = width;
    }

    /// Number of bytes pending.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing is pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The pending bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append raw bytes.
    #[inline]
    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Rewrite the row the terminal cursor is currently on.
    ///
    /// Emits: save cursor, carriage return, erase line, `content`, erase
    /// remainder, restore cursor. `content` must already be in render form
    /// (tabs expanded). It is clipped to the screen width; when it fills the
    /// row the trailing erase is skipped, since EL in the pending-wrap state
    /// would blank the last cell.
    pub fn emit_line(&mut self, content: &[u8]) {
        let visible = if self.width == 0 {
            content
        } else {
            &content[..content.len().min(self.width)]
        };

        ansi::cursor_save(&mut self.buf).ok();
        ansi::carriage_return(&mut self.buf).ok();
        ansi::erase_to_eol(&mut self.buf).ok();
        self.buf.extend_from_slice(visible);
        if self.width == 0 || visible.len() < self.width {
            ansi::erase_to_eol(&mut self.buf).ok();
        }
        ansi::cursor_restore(&mut self.buf).ok();
    }

    /// Absolute cursor positioning, 0-indexed `(row, col)` in screen space.
    #[inline]
    pub fn move_cursor(&mut self, row: usize, col: usize) {
        ansi::cursor_to(&mut self.buf, row, col).ok();
    }

    /// Move to `screen_row` and rewrite it whole.
    pub fn rewrite_row(&mut self, screen_row: usize, content: &[u8]) {
        self.move_cursor(screen_row, 0);
        self.emit_line(content);
    }

    /// Scroll the viewport up by one row: park on the bottom row and index.
    ///
    /// The terminal shifts every row up and leaves the bottom row blank
    /// with the cursor on it, ready for the newly exposed line.
    pub fn scroll_up_at_bottom(&mut self, last_row: usize) {
        self.move_cursor(last_row, 0);
        ansi::index(&mut self.buf).ok();
    }

    /// Scroll the viewport down by one row: park on the top row and
    /// reverse-index. The top row is left blank with the cursor on it.
    pub fn scroll_down_at_top(&mut self) {
        self.move_cursor(0, 0);
        ansi::reverse_index(&mut self.buf).ok();
    }

    /// Clear the whole screen and home the cursor.
    pub fn clear_screen(&mut self) {
        ansi::clear_screen(&mut self.buf).ok();
        ansi::cursor_home(&mut self.buf).ok();
    }

    /// Discard pending output without writing it.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write pending output to the terminal in one call and clear the buffer.
    ///
    /// Empty channels write nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal write fails. The buffer is cleared
    /// either way so a failed diff is never replayed on top of the next one.
    pub fn flush(&mut self, term: &mut (impl TerminalIo + ?Sized)) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let result = term.write(&self.buf);
        self.buf.clear();
        result
    }
}

impl Write for RenderChannel {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Bytes reach the terminal only through RenderChannel::flush.
        Ok(())
    }
}

impl Default for RenderChannel {
    fn default() -> Self {
        Self::new(0)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
