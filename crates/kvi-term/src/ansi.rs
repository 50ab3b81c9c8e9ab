// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit. That belongs to `RenderChannel`. This
// module just knows the byte-level encoding of the handful of terminal
// commands the editor needs: one cursor, one scrolling viewport.
//
// All cursor positions are 0-indexed in our API and converted to 1-indexed
// for the terminal (ANSI standard uses 1-based coordinates).
//
// All functions return `io::Result` propagated from the underlying writer.
// In practice they never fail when writing to `RenderChannel` (backed by a Vec).

use std::io::{self, Write};

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(row, col)` using the CUP (Cursor Position) sequence.
///
/// Our coordinates are 0-indexed; ANSI CUP is 1-indexed.
#[inline]
pub fn cursor_to(w: &mut impl Write, row: usize, col: usize) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", row + 1, col + 1)
}

/// Move the cursor to the top-left corner (CUP with no parameters).
#[inline]
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[H")
}

/// Save the cursor position (SCOSC).
#[inline]
pub fn cursor_save(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[s")
}

/// Restore the cursor position saved by [`cursor_save`] (SCORC).
#[inline]
pub fn cursor_restore(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[u")
}

/// Carriage return: column 0 of the current row.
#[inline]
pub fn carriage_return(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\r")
}

// ─── Relative Row Motion ─────────────────────────────────────────────────────

/// Index (IND): move down one row, scrolling the screen up when the cursor
/// is already on the bottom row.
#[inline]
pub fn index(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1bD")
}

/// Reverse index (RI): move up one row, scrolling the screen down when the
/// cursor is already on the top row.
#[inline]
pub fn reverse_index(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1bM")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2). Does not move the cursor.
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Erase from the cursor to the end of the line (EL 0).
#[inline]
pub fn erase_to_eol(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[K")
}

// ─── Size Probe ──────────────────────────────────────────────────────────────

/// Push the cursor as far right and down as the terminal allows (CUF/CUD
/// 999). Used with [`request_cursor_position`] to measure the window when
/// `TIOCGWINSZ` is unavailable.
#[inline]
pub fn cursor_to_far_corner(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[999C\x1b[999B")
}

/// Device Status Report 6: ask the terminal to reply with `ESC [ row ; col R`.
#[inline]
pub fn request_cursor_position(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[6n")
}

/// Parse a cursor position report (`ESC [ row ; col R`, 1-indexed).
///
/// The trailing `R` is optional so callers can pass the bytes read up to
/// (but not including) the terminator. Returns `(rows, cols)`.
#[must_use]
pub fn parse_cursor_report(report: &[u8]) -> Option<(usize, usize)> {
    let body = report.strip_prefix(b"\x1b[")?;
    let body = body.strip_suffix(b"R").unwrap_or(body);
    let text = std::str::from_utf8(body).ok()?;
    let (row, col) = text.split_once(';')?;
    Some((row.trim().parse().ok()?, col.trim().parse().ok()?))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
