//! Cursor model: file coordinates, render coordinates, and the scroll window.
//!
//! A position has two horizontal coordinates:
//!
//! - the **file column**, a byte offset into the line, and
//! - the **render column**, the terminal cell where that byte starts.
//!
//! They differ only because of tabs. Every byte occupies one cell except a
//! tab, which occupies exactly `tab_stop` cells wherever it sits. There is
//! no alignment to tab stops: `"a\tb"` with a tab stop of 4 renders as
//! `a` + 4 spaces + `b`, six cells in all. [`render_line`] and the cursor
//! mappings use the same rule, so the cursor always lands on the cell the
//! byte was drawn in.
//!
//! # Mode-agnostic motion
//!
//! Movement methods take a `past_end: bool` instead of a mode:
//!
//! - Normal mode: `past_end = false`, the cursor sits ON a byte
//!   (`0..len-1`, or 0 on an empty line)
//! - Insert mode: `past_end = true`, the cursor may sit after the last byte
//!
//! # Preferred column
//!
//! Vertical motion aims for the remembered render column, so moving through
//! a short line and back onto a long one returns to where the cursor was.
//! Horizontal motion and edits reset it.
//!
//! Motion at a buffer edge is a silent no-op; the methods report whether the
//! cursor actually moved.

use crate::buffer::LineBuffer;

// ---------------------------------------------------------------------------
// Coordinate mapping
// ---------------------------------------------------------------------------

/// Cells occupied by `byte`.
#[inline]
#[must_use]
pub const fn byte_width(byte: u8, tab_stop: usize) -> usize {
    if byte == b'\t' {
        if tab_stop == 0 { 1 } else { tab_stop }
    } else {
        1
    }
}

/// Render column of file column `file_col`.
///
/// Columns past the end of the line are treated as the end of the line.
#[must_use]
pub fn map_to_render(line: &[u8], file_col: usize, tab_stop: usize) -> usize {
    line.iter()
        .take(file_col)
        .map(|&b| byte_width(b, tab_stop))
        .sum()
}

/// The largest file column whose render column does not exceed
/// `preferred`, together with that render column.
#[must_use]
pub fn map_to_file(line: &[u8], preferred: usize, tab_stop: usize) -> (usize, usize) {
    map_to_file_within(line, preferred, tab_stop, line.len())
}

/// [`map_to_file`] with the result capped at `max_col`.
#[must_use]
pub fn map_to_file_within(
    line: &[u8],
    preferred: usize,
    tab_stop: usize,
    max_col: usize,
) -> (usize, usize) {
    let limit = max_col.min(line.len());
    let mut render = 0;
    let mut col = 0;
    while col < limit {
        let next = render + byte_width(line[col], tab_stop);
        if next > preferred {
            break;
        }
        render = next;
        col += 1;
    }
    (col, render)
}

/// Tab-expanded display form of a line: each tab becomes `tab_stop` spaces.
#[must_use]
pub fn render_line(line: &[u8], tab_stop: usize) -> Vec<u8> {
    let tabs = line.iter().filter(|&&b| b == b'\t').count();
    let mut out = Vec::with_capacity(line.len() + tabs * tab_stop.saturating_sub(1));
    for &b in line {
        if b == b'\t' {
            out.resize(out.len() + byte_width(b, tab_stop), b' ');
        } else {
            out.push(b);
        }
    }
    out
}

/// The scroll offset that keeps `cursor_row` inside a window of
/// `screen_height` rows starting at `offset`. Changes the offset as little
/// as possible.
#[must_use]
pub const fn adjust_scroll(cursor_row: usize, screen_height: usize, offset: usize) -> usize {
    if screen_height == 0 {
        return offset;
    }
    if cursor_row < offset {
        cursor_row
    } else if cursor_row >= offset + screen_height {
        cursor_row + 1 - screen_height
    } else {
        offset
    }
}

/// How the scroll offset changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    Unchanged,
    /// The window moved down one line; the screen content shifts up.
    Forward,
    /// The window moved up one line; the screen content shifts down.
    Backward,
    /// The window moved by more than one line.
    Jump,
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// The editing cursor and the viewport offsets that follow it.
///
/// Does not reference the buffer; the buffer is passed to each method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    row: usize,
    /// Byte offset into the current line.
    col: usize,
    /// Cell where `col` starts, derived from `(row, col, tab_stop)`.
    render_col: usize,
    /// Render column vertical motion aims for.
    preferred_col: usize,
    /// First visible line.
    row_offset: usize,
    /// First visible cell. Rows are clipped rather than scrolled
    /// horizontally, so this stays 0.
    col_offset: usize,
}

impl Cursor {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            row: 0,
            col: 0,
            render_col: 0,
            preferred_col: 0,
            row_offset: 0,
            col_offset: 0,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn row(&self) -> usize {
        self.row
    }

    #[inline]
    #[must_use]
    pub const fn col(&self) -> usize {
        self.col
    }

    #[inline]
    #[must_use]
    pub const fn render_col(&self) -> usize {
        self.render_col
    }

    #[inline]
    #[must_use]
    pub const fn preferred_col(&self) -> usize {
        self.preferred_col
    }

    #[inline]
    #[must_use]
    pub const fn row_offset(&self) -> usize {
        self.row_offset
    }

    #[inline]
    #[must_use]
    pub const fn col_offset(&self) -> usize {
        self.col_offset
    }

    /// Row on screen, relative to the scroll window.
    #[inline]
    #[must_use]
    pub const fn screen_row(&self) -> usize {
        self.row.saturating_sub(self.row_offset)
    }

    /// Column on screen.
    #[inline]
    #[must_use]
    pub const fn screen_col(&self) -> usize {
        self.render_col.saturating_sub(self.col_offset)
    }

    // -- Positioning --------------------------------------------------------

    /// Place the cursor at `(row, col)`, clamped to the buffer, and make its
    /// render column the preferred one.
    pub fn set_position(
        &mut self,
        buf: &LineBuffer,
        row: usize,
        col: usize,
        tab_stop: usize,
        past_end: bool,
    ) {
        self.row = row;
        self.col = col;
        self.clamp(buf, tab_stop, past_end);
    }

    /// Pull the cursor back inside the buffer after an edit and recompute
    /// its render column. Resets the preferred column.
    pub fn clamp(&mut self, buf: &LineBuffer, tab_stop: usize, past_end: bool) {
        self.row = self.row.min(buf.line_count().saturating_sub(1));
        self.col = self.col.min(max_col(buf, self.row, past_end));
        self.sync_render(buf, tab_stop);
    }

    fn sync_render(&mut self, buf: &LineBuffer, tab_stop: usize) {
        let line = buf.line(self.row).map_or(&[][..], |l| l.as_bytes());
        self.render_col = map_to_render(line, self.col, tab_stop);
        self.preferred_col = self.render_col;
    }

    // -- Horizontal motion --------------------------------------------------

    /// One byte left. No-op at column 0.
    pub fn move_left(&mut self, buf: &LineBuffer, tab_stop: usize) -> bool {
        if self.col == 0 {
            return false;
        }
        self.col -= 1;
        self.sync_render(buf, tab_stop);
        true
    }

    /// One byte right. No-op at the column limit.
    pub fn move_right(&mut self, buf: &LineBuffer, tab_stop: usize, past_end: bool) -> bool {
        if self.col >= max_col(buf, self.row, past_end) {
            return false;
        }
        self.col += 1;
        self.sync_render(buf, tab_stop);
        true
    }

    /// To the end of the line (past the last byte when `past_end`).
    pub fn move_to_line_end(&mut self, buf: &LineBuffer, tab_stop: usize, past_end: bool) {
        self.col = max_col(buf, self.row, past_end);
        self.sync_render(buf, tab_stop);
    }

    // -- Vertical motion ----------------------------------------------------

    /// One line up, aiming for the preferred column. No-op on row 0.
    pub fn move_up(&mut self, buf: &LineBuffer, tab_stop: usize, past_end: bool) -> bool {
        if self.row == 0 {
            return false;
        }
        self.goto_row(self.row - 1, buf, tab_stop, past_end);
        true
    }

    /// One line down, aiming for the preferred column. No-op on the last row.
    pub fn move_down(&mut self, buf: &LineBuffer, tab_stop: usize, past_end: bool) -> bool {
        if self.row + 1 >= buf.line_count() {
            return false;
        }
        self.goto_row(self.row + 1, buf, tab_stop, past_end);
        true
    }

    fn goto_row(&mut self, row: usize, buf: &LineBuffer, tab_stop: usize, past_end: bool) {
        self.row = row;
        let line = buf.line(row).map_or(&[][..], |l| l.as_bytes());
        let (col, render) = map_to_file_within(
            line,
            self.preferred_col,
            tab_stop,
            max_col(buf, row, past_end),
        );
        self.col = col;
        self.render_col = render;
    }

    // -- Scrolling ----------------------------------------------------------

    /// Bring the cursor row into a window `screen_height` rows tall.
    pub fn scroll(&mut self, screen_height: usize) -> Scroll {
        let old = self.row_offset;
        let new = adjust_scroll(self.row, screen_height, old);
        self.row_offset = new;
        match new.cmp(&old) {
            std::cmp::Ordering::Equal => Scroll::Unchanged,
            std::cmp::Ordering::Greater if new - old == 1 => Scroll::Forward,
            std::cmp::Ordering::Less if old - new == 1 => Scroll::Backward,
            _ => Scroll::Jump,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Largest valid column on `row`.
///
/// - `past_end = false`: `len - 1`, or 0 on an empty line
/// - `past_end = true`: `len`
#[must_use]
pub fn max_col(buf: &LineBuffer, row: usize, past_end: bool) -> usize {
    let len = buf.line_len(row);
    if past_end { len } else { len.saturating_sub(1) }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
