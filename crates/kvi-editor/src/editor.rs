//! The editing session and its modal key dispatcher.
//!
//! [`Editor`] owns everything about one open file: the lines, the cursor,
//! the mode, and the screen geometry. It implements the event loop's
//! [`App`] trait, so each key arrives in [`App::on_key`] together with the
//! render channel that will be flushed once the key is handled.
//!
//! Every key runs the same three steps:
//!
//! 1. mutate the [`LineBuffer`] (if the key edits),
//! 2. recompute the [`Cursor`] (file column, render column, scroll offset),
//! 3. queue only what changed: the edited row, the rows below a split or
//!    join, one scrolled-in row, and always a final absolute cursor move.
//!
//! There is no frame to diff against. A full repaint happens only at
//! startup and after a resize, through [`App::paint_all`].
//!
//! # Screen rows
//!
//! The whole window shows text; there is no status line. A save message is
//! drawn over the bottom row and stays until the next key, which puts that
//! row's text back before doing anything else.

use std::path::{Path, PathBuf};

use kvi_term::event_loop::{Action, App};
use kvi_term::input::Key;
use kvi_term::render::RenderChannel;
use kvi_term::terminal::Size;

use crate::buffer::LineBuffer;
use crate::config::EditorConfig;
use crate::cursor::{self, Cursor, Scroll};
use crate::file::{DiskStore, FileStore};
use crate::mode::Mode;

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// One editing session.
///
/// Generic over the [`FileStore`] so `:w` can be observed in tests.
#[derive(Debug)]
pub struct Editor<S: FileStore = DiskStore> {
    buffer: LineBuffer,
    cursor: Cursor,
    mode: Mode,
    config: EditorConfig,
    path: PathBuf,
    store: S,

    /// Window size in cells, from the last resize.
    height: usize,
    width: usize,

    /// A save message currently covers the bottom row.
    message_shown: bool,
}

impl<S: FileStore> Editor<S> {
    /// Load `path` through `store` and start in Normal mode at the origin.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the file cannot be loaded.
    pub fn open(path: impl Into<PathBuf>, config: EditorConfig, mut store: S) -> std::io::Result<Self> {
        let path = path.into();
        let buffer = store.load(&path)?;
        tracing::info!(path = %path.display(), lines = buffer.line_count(), "opened");
        Ok(Self::with_buffer(buffer, path, config, store))
    }

    /// A session over an already loaded buffer.
    #[must_use]
    pub fn with_buffer(buffer: LineBuffer, path: PathBuf, config: EditorConfig, store: S) -> Self {
        Self {
            buffer,
            cursor: Cursor::new(),
            mode: Mode::Normal,
            config,
            path,
            store,
            height: 0,
            width: 0,
            message_shown: false,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    #[inline]
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Whether a save message is covering the bottom row.
    #[inline]
    #[must_use]
    pub const fn message_shown(&self) -> bool {
        self.message_shown
    }

    // -- Geometry -----------------------------------------------------------

    /// Adopt a new window size and pull the scroll window over the cursor.
    /// The caller repaints afterwards.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.height = rows;
        self.width = cols;
        self.cursor.scroll(self.height);
    }

    const fn tab_stop(&self) -> usize {
        self.config.tab_stop()
    }

    const fn past_end(&self) -> bool {
        self.mode.cursor_past_end()
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            tracing::debug!(from = %self.mode, to = %mode, "mode changed");
            self.mode = mode;
        }
    }

    // -- Key dispatch -------------------------------------------------------

    /// Handle one key and queue its screen diff into `out`.
    pub fn handle_key(&mut self, key: Key, out: &mut RenderChannel) -> Action {
        if self.message_shown {
            self.message_shown = false;
            self.draw_row(out, self.cursor.row_offset() + self.height.saturating_sub(1));
        }

        let action = match self.mode {
            Mode::Normal => self.handle_normal(key, out),
            Mode::Insert => self.handle_insert(key, out),
            Mode::Command => self.handle_command(key, out),
        };

        if action == Action::Continue {
            self.place_cursor(out);
        }
        action
    }

    fn handle_normal(&mut self, key: Key, out: &mut RenderChannel) -> Action {
        let ts = self.tab_stop();
        match key {
            Key::Byte(b'h') | Key::Left => {
                self.cursor.move_left(&self.buffer, ts);
            }
            Key::Byte(b'l') | Key::Right => {
                self.cursor.move_right(&self.buffer, ts, false);
            }
            Key::Byte(b'j') | Key::Down => {
                if self.cursor.move_down(&self.buffer, ts, false) {
                    self.follow_cursor(out);
                }
            }
            Key::Byte(b'k') | Key::Up => {
                if self.cursor.move_up(&self.buffer, ts, false) {
                    self.follow_cursor(out);
                }
            }
            Key::Byte(b'i') => self.set_mode(Mode::Insert),
            Key::Byte(b'a') => {
                if self.buffer.line_len(self.cursor.row()) > 0 {
                    self.cursor.move_right(&self.buffer, ts, true);
                }
                self.set_mode(Mode::Insert);
            }
            Key::Byte(b'A') => {
                self.cursor.move_to_line_end(&self.buffer, ts, true);
                self.set_mode(Mode::Insert);
            }
            Key::Byte(b'x') => self.delete_under_cursor(out),
            Key::Byte(b':') => self.set_mode(Mode::Command),
            _ => {}
        }
        Action::Continue
    }

    fn handle_insert(&mut self, key: Key, out: &mut RenderChannel) -> Action {
        let ts = self.tab_stop();
        match key {
            Key::Escape => {
                // Leaving insert mode: the cursor may no longer sit past the end.
                self.set_mode(Mode::Normal);
                self.cursor.clamp(&self.buffer, ts, false);
            }
            Key::Enter => self.break_line(out),
            Key::Backspace => self.backspace(out),
            Key::Left => {
                self.cursor.move_left(&self.buffer, ts);
            }
            Key::Right => {
                self.cursor.move_right(&self.buffer, ts, true);
            }
            Key::Up => {
                if self.cursor.move_up(&self.buffer, ts, true) {
                    self.follow_cursor(out);
                }
            }
            Key::Down => {
                if self.cursor.move_down(&self.buffer, ts, true) {
                    self.follow_cursor(out);
                }
            }
            key => {
                if let Some(byte) = key.printable() {
                    self.insert_byte(byte, out);
                }
            }
        }
        Action::Continue
    }

    fn handle_command(&mut self, key: Key, out: &mut RenderChannel) -> Action {
        match key {
            Key::Escape | Key::Enter => self.set_mode(Mode::Normal),
            Key::Byte(b'w') => {
                self.save(out);
                self.set_mode(Mode::Normal);
            }
            Key::Byte(b'q') => {
                tracing::info!(path = %self.path.display(), "quit requested");
                return Action::Quit;
            }
            _ => {}
        }
        Action::Continue
    }

    // -- Edits --------------------------------------------------------------

    /// `x`: delete the byte under the cursor. If that empties the tail the
    /// cursor steps back onto the new last byte.
    fn delete_under_cursor(&mut self, out: &mut RenderChannel) {
        let (row, col) = (self.cursor.row(), self.cursor.col());
        if self.buffer.delete_char(row, col).is_none() {
            return;
        }
        self.cursor.clamp(&self.buffer, self.tab_stop(), false);
        self.draw_row(out, row);
    }

    fn insert_byte(&mut self, byte: u8, out: &mut RenderChannel) {
        let (row, col) = (self.cursor.row(), self.cursor.col());
        if !self.buffer.insert_char(row, col, byte) {
            return;
        }
        self.cursor
            .set_position(&self.buffer, row, col + 1, self.tab_stop(), true);
        self.draw_row(out, row);
    }

    /// Enter: split at the cursor and move to the start of the new line.
    fn break_line(&mut self, out: &mut RenderChannel) {
        let (row, col) = (self.cursor.row(), self.cursor.col());
        let Some(tail) = self.buffer.split(row, col) else {
            return;
        };
        self.buffer.insert_row(row + 1, tail);
        self.cursor
            .set_position(&self.buffer, row + 1, 0, self.tab_stop(), true);
        self.follow_cursor(out);
        self.draw_rows_from(out, row);
    }

    /// Backspace: delete the previous byte, or join onto the previous line
    /// when at column 0.
    fn backspace(&mut self, out: &mut RenderChannel) {
        let (row, col) = (self.cursor.row(), self.cursor.col());
        let ts = self.tab_stop();

        if col > 0 {
            self.buffer.delete_char(row, col - 1);
            self.cursor.set_position(&self.buffer, row, col - 1, ts, true);
            self.draw_row(out, row);
        } else if row > 0 {
            let join_col = self.buffer.line_len(row - 1);
            self.buffer.join(row - 1);
            self.cursor.set_position(&self.buffer, row - 1, join_col, ts, true);
            self.follow_cursor(out);
            self.draw_rows_from(out, row - 1);
        }
    }

    // -- Commands -----------------------------------------------------------

    fn save(&mut self, out: &mut RenderChannel) {
        let message = match self.store.save(&self.path, &self.buffer) {
            Ok(bytes) => {
                let lines = self.buffer.line_count();
                tracing::info!(path = %self.path.display(), lines, bytes, "saved");
                format!("\"{}\" {lines} lines, {bytes} bytes written", self.path.display())
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "save failed");
                format!("\"{}\" {e}", self.path.display())
            }
        };
        self.show_message(out, message.as_bytes());
    }

    fn show_message(&mut self, out: &mut RenderChannel, message: &[u8]) {
        if self.height == 0 {
            return;
        }
        out.rewrite_row(self.height - 1, message);
        self.message_shown = true;
    }

    // -- Rendering ----------------------------------------------------------

    /// Rewrite one file row if it is on screen. Rows past the end of the
    /// buffer are drawn blank.
    fn draw_row(&self, out: &mut RenderChannel, row: usize) {
        let top = self.cursor.row_offset();
        if row < top || row >= top + self.height {
            return;
        }
        let content = self
            .buffer
            .line(row)
            .map(|line| cursor::render_line(line.as_bytes(), self.tab_stop()))
            .unwrap_or_default();
        out.rewrite_row(row - top, &content);
    }

    /// Rewrite every screen row from file row `row` to the bottom.
    fn draw_rows_from(&self, out: &mut RenderChannel, row: usize) {
        let top = self.cursor.row_offset();
        for r in row.max(top)..top + self.height {
            self.draw_row(out, r);
        }
    }

    /// Keep the cursor inside the window. A one-row move scrolls the
    /// terminal and draws the exposed row; a larger jump redraws everything.
    fn follow_cursor(&mut self, out: &mut RenderChannel) {
        match self.cursor.scroll(self.height) {
            Scroll::Unchanged => {}
            Scroll::Forward => {
                let last = self.height - 1;
                out.scroll_up_at_bottom(last);
                self.draw_row(out, self.cursor.row_offset() + last);
            }
            Scroll::Backward => {
                out.scroll_down_at_top();
                self.draw_row(out, self.cursor.row_offset());
            }
            Scroll::Jump => self.draw_rows_from(out, self.cursor.row_offset()),
        }
    }

    /// Move the terminal cursor to the cursor's cell, clipped to the window.
    fn place_cursor(&self, out: &mut RenderChannel) {
        let mut col = self.cursor.screen_col();
        if self.width > 0 {
            col = col.min(self.width - 1);
        }
        out.move_cursor(self.cursor.screen_row(), col);
    }
}

// ---------------------------------------------------------------------------
// App implementation
// ---------------------------------------------------------------------------

impl<S: FileStore> App for Editor<S> {
    fn on_key(&mut self, key: Key, out: &mut RenderChannel) -> Action {
        self.handle_key(key, out)
    }

    fn on_resize(&mut self, size: Size) {
        self.resize(size.height(), size.width());
    }

    fn paint_all(&mut self, out: &mut RenderChannel) {
        out.clear_screen();
        self.message_shown = false;
        self.draw_rows_from(out, self.cursor.row_offset());
        self.place_cursor(out);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    use kvi_term::event_loop::{EventLoop, SignalFlags};
    use kvi_term::input::KeyDecoder;
    use kvi_term::terminal::ScriptedTerminal;
    use pretty_assertions::assert_eq;

    use crate::buffer::Line;

    // ── Helpers ───────────────────────────────────────────────────────────

    /// A store that keeps saves in memory.
    #[derive(Debug, Default)]
    struct MemoryStore {
        files: Vec<(PathBuf, Vec<u8>)>,
        fail: bool,
    }

    impl FileStore for MemoryStore {
        fn load(&mut self, path: &Path) -> io::Result<LineBuffer> {
            self.files
                .iter()
                .find(|(p, _)| p == path)
                .map(|(_, bytes)| {
                    LineBuffer::from_lines(bytes.split(|&b| b == b'\n').map(<[u8]>::to_vec))
                })
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        fn save(&mut self, path: &Path, buf: &LineBuffer) -> io::Result<usize> {
            if self.fail {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            let bytes = buf.to_bytes();
            let len = bytes.len();
            self.files.push((path.to_path_buf(), bytes));
            Ok(len)
        }
    }

    fn editor(lines: &[&str], rows: usize, cols: usize) -> Editor<MemoryStore> {
        let mut ed = Editor::with_buffer(
            LineBuffer::from_lines(lines.iter().copied()),
            PathBuf::from("test.txt"),
            EditorConfig::default(),
            MemoryStore::default(),
        );
        ed.resize(rows, cols);
        ed
    }

    /// Feed raw input bytes through the key decoder, returning the output
    /// queued by the last key and the last action.
    fn feed(ed: &mut Editor<MemoryStore>, input: &[u8]) -> (String, Action) {
        let mut term = ScriptedTerminal::new(24, 80, input);
        // One timeout may be consumed resolving a trailing ESC.
        term.push_timeout();
        term.push_timeout();
        let mut decoder = KeyDecoder::new();
        let mut out = RenderChannel::new(ed.width);
        let mut last = (String::new(), Action::Continue);
        while let Some(key) = decoder.read_key(&mut term).unwrap() {
            out.clear();
            let action = ed.handle_key(key, &mut out);
            last = (String::from_utf8_lossy(out.as_bytes()).into_owned(), action);
        }
        last
    }

    fn lines(ed: &Editor<MemoryStore>) -> Vec<String> {
        ed.buffer()
            .lines()
            .map(|l| String::from_utf8_lossy(l.as_bytes()).into_owned())
            .collect()
    }

    fn pos(ed: &Editor<MemoryStore>) -> (usize, usize) {
        (ed.cursor().row(), ed.cursor().col())
    }

    // ── Normal mode motion ────────────────────────────────────────────────

    #[test]
    fn j_j_k_row_sequence() {
        let mut ed = editor(&["foo", "bar", "baz"], 24, 80);
        let mut rows = Vec::new();
        for key in b"jjk" {
            feed(&mut ed, &[*key]);
            rows.push(ed.cursor().row());
        }
        assert_eq!(rows, vec![1, 2, 1]);
    }

    #[test]
    fn j_on_last_row_is_noop() {
        let mut ed = editor(&["foo", "bar", "baz"], 24, 80);
        feed(&mut ed, b"jj");
        let (out, _) = feed(&mut ed, b"j");
        assert_eq!(pos(&ed), (2, 0));
        assert_eq!(out, "\x1b[3;1H");
    }

    #[test]
    fn l_emits_only_cursor_move() {
        let mut ed = editor(&["hello"], 24, 80);
        let (out, action) = feed(&mut ed, b"l");
        assert_eq!(out, "\x1b[1;2H");
        assert_eq!(action, Action::Continue);
    }

    #[test]
    fn l_stops_on_last_byte() {
        let mut ed = editor(&["ab"], 24, 80);
        feed(&mut ed, b"llll");
        assert_eq!(pos(&ed), (0, 1));
    }

    #[test]
    fn arrow_keys_move_in_normal_mode() {
        let mut ed = editor(&["abc", "def"], 24, 80);
        feed(&mut ed, b"\x1b[B\x1b[C\x1b[C\x1b[D");
        assert_eq!(pos(&ed), (1, 1));
        feed(&mut ed, b"\x1b[A");
        assert_eq!(pos(&ed), (0, 1));
    }

    #[test]
    fn cursor_lands_after_tab_cells() {
        let mut ed = editor(&["\tx"], 24, 80);
        let (out, _) = feed(&mut ed, b"l");
        assert_eq!(ed.cursor().render_col(), 4);
        assert_eq!(out, "\x1b[1;5H");
    }

    #[test]
    fn unknown_normal_key_only_repositions() {
        let mut ed = editor(&["abc"], 24, 80);
        let (out, _) = feed(&mut ed, b"Z");
        assert_eq!(out, "\x1b[1;1H");
        assert_eq!(ed.mode(), Mode::Normal);
    }

    // ── Scrolling ─────────────────────────────────────────────────────────

    #[test]
    fn j_past_bottom_scrolls_with_index() {
        let mut ed = editor(&["l0", "l1", "l2", "l3", "l4"], 3, 80);
        feed(&mut ed, b"jj");
        let (out, _) = feed(&mut ed, b"j");
        assert_eq!(ed.cursor().row_offset(), 1);
        assert_eq!(out, "\x1b[3;1H\x1bD\x1b[3;1H\x1b[s\r\x1b[Kl3\x1b[K\x1b[u\x1b[3;1H");
    }

    #[test]
    fn k_past_top_scrolls_with_reverse_index() {
        let mut ed = editor(&["l0", "l1", "l2", "l3", "l4"], 3, 80);
        feed(&mut ed, b"jjj");
        feed(&mut ed, b"kk");
        let (out, _) = feed(&mut ed, b"k");
        assert_eq!(ed.cursor().row_offset(), 0);
        assert_eq!(out, "\x1b[1;1H\x1bM\x1b[1;1H\x1b[s\r\x1b[Kl0\x1b[K\x1b[u\x1b[1;1H");
    }

    #[test]
    fn scroll_offset_never_jumps_by_more_than_one() {
        let lines: Vec<String> = (0..30).map(|i| format!("line {i}")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let mut ed = editor(&refs, 5, 80);
        let mut prev = 0;
        for key in b"jjjjjjjjjjjjjjkkkkkkkkkkkkkjjj" {
            feed(&mut ed, &[*key]);
            let offset = ed.cursor().row_offset();
            assert!(offset.abs_diff(prev) <= 1);
            prev = offset;
        }
    }

    // ── Entering insert mode ──────────────────────────────────────────────

    #[test]
    fn i_keeps_column() {
        let mut ed = editor(&["abc"], 24, 80);
        feed(&mut ed, b"li");
        assert_eq!(ed.mode(), Mode::Insert);
        assert_eq!(pos(&ed), (0, 1));
    }

    #[test]
    fn a_advances_one_column() {
        let mut ed = editor(&["abc"], 24, 80);
        feed(&mut ed, b"lla");
        assert_eq!(ed.mode(), Mode::Insert);
        assert_eq!(pos(&ed), (0, 3));
    }

    #[test]
    fn a_on_empty_line_stays() {
        let mut ed = editor(&[""], 24, 80);
        feed(&mut ed, b"a");
        assert_eq!(pos(&ed), (0, 0));
        assert_eq!(ed.mode(), Mode::Insert);
    }

    #[test]
    fn capital_a_goes_past_end() {
        let mut ed = editor(&["a\tb"], 24, 80);
        feed(&mut ed, b"A");
        assert_eq!(pos(&ed), (0, 3));
        assert_eq!(ed.cursor().render_col(), 6);
    }

    // ── Insert mode ───────────────────────────────────────────────────────

    #[test]
    fn typing_inserts_and_rewrites_row() {
        let mut ed = editor(&["ac"], 24, 80);
        feed(&mut ed, b"li");
        let (out, _) = feed(&mut ed, b"b");
        assert_eq!(lines(&ed), vec!["abc"]);
        assert_eq!(pos(&ed), (0, 2));
        assert_eq!(out, "\x1b[1;1H\x1b[s\r\x1b[Kabc\x1b[K\x1b[u\x1b[1;3H");
    }

    #[test]
    fn tab_advances_render_by_tab_stop() {
        let mut ed = editor(&["ab"], 24, 80);
        feed(&mut ed, b"a\t");
        assert_eq!(lines(&ed), vec!["a\tb"]);
        assert_eq!(ed.cursor().col(), 2);
        assert_eq!(ed.cursor().render_col(), 5);
    }

    #[test]
    fn control_bytes_are_ignored() {
        let mut ed = editor(&["ab"], 24, 80);
        feed(&mut ed, b"i\x01\x02\x7f");
        assert_eq!(lines(&ed), vec!["ab"]);
    }

    #[test]
    fn enter_at_end_of_line() {
        let mut ed = editor(&["abc"], 24, 80);
        feed(&mut ed, b"A");
        assert_eq!(pos(&ed), (0, 3));
        feed(&mut ed, b"\r");
        assert_eq!(lines(&ed), vec!["abc", ""]);
        assert_eq!(pos(&ed), (1, 0));
    }

    #[test]
    fn enter_splits_mid_line_and_redraws_below() {
        let mut ed = editor(&["hello world", "next"], 4, 80);
        feed(&mut ed, b"lllllli");
        let (out, _) = feed(&mut ed, b"\n");
        assert_eq!(lines(&ed), vec!["hello ", "world", "next"]);
        assert_eq!(pos(&ed), (1, 0));
        assert!(out.contains("\x1b[1;1H\x1b[s\r\x1b[Khello \x1b[K\x1b[u"));
        assert!(out.contains("\x1b[2;1H\x1b[s\r\x1b[Kworld\x1b[K\x1b[u"));
        assert!(out.contains("\x1b[3;1H\x1b[s\r\x1b[Knext\x1b[K\x1b[u"));
        assert!(out.contains("\x1b[4;1H\x1b[s\r\x1b[K\x1b[K\x1b[u"));
        assert!(out.ends_with("\x1b[2;1H"));
    }

    #[test]
    fn enter_on_bottom_row_scrolls() {
        let mut ed = editor(&["a", "b"], 2, 80);
        feed(&mut ed, b"jA");
        let (out, _) = feed(&mut ed, b"\r");
        assert_eq!(ed.cursor().row_offset(), 1);
        assert!(out.starts_with("\x1b[2;1H\x1bD"));
        assert!(out.ends_with("\x1b[2;1H"));
    }

    #[test]
    fn escape_retreats_from_end_of_line() {
        let mut ed = editor(&["abc"], 24, 80);
        feed(&mut ed, b"A");
        feed(&mut ed, b"\x1b");
        assert_eq!(ed.mode(), Mode::Normal);
        assert_eq!(pos(&ed), (0, 2));
    }

    #[test]
    fn escape_mid_line_keeps_column() {
        let mut ed = editor(&["abc"], 24, 80);
        feed(&mut ed, b"li\x1b");
        assert_eq!(pos(&ed), (0, 1));
    }

    #[test]
    fn insert_arrows_reach_past_end() {
        let mut ed = editor(&["ab", "abcd"], 24, 80);
        feed(&mut ed, b"i\x1b[C\x1b[C\x1b[C");
        assert_eq!(pos(&ed), (0, 2));
        feed(&mut ed, b"\x1b[B");
        assert_eq!(pos(&ed), (1, 2));
    }

    #[test]
    fn editing_keys_without_bindings_leave_the_line_alone() {
        let mut ed = editor(&["abc"], 24, 80);
        let (out, _) = feed(&mut ed, b"i\x1b[3~\x1b[5~\x1b[15~\x1b[1;5D");
        assert_eq!(lines(&ed), vec!["abc"]);
        assert_eq!(ed.mode(), Mode::Insert);
        assert_eq!(pos(&ed), (0, 0));
        assert_eq!(out, "\x1b[1;1H");
    }

    #[test]
    fn unbound_sequences_are_ignored_in_normal_and_command_mode() {
        let mut ed = editor(&["abc"], 24, 80);
        feed(&mut ed, b"\x1b[3~");
        assert_eq!(ed.mode(), Mode::Normal);
        feed(&mut ed, b":\x1b[6~");
        assert_eq!(ed.mode(), Mode::Command);
        assert_eq!(lines(&ed), vec!["abc"]);
    }

    // ── Backspace ─────────────────────────────────────────────────────────

    #[test]
    fn backspace_deletes_previous_byte() {
        let mut ed = editor(&["abc"], 24, 80);
        feed(&mut ed, b"A\x7f");
        assert_eq!(lines(&ed), vec!["ab"]);
        assert_eq!(pos(&ed), (0, 2));
    }

    #[test]
    fn backspace_over_tab_moves_back_tab_stop() {
        let mut ed = editor(&["a\t"], 24, 80);
        feed(&mut ed, b"A");
        assert_eq!(ed.cursor().render_col(), 5);
        feed(&mut ed, b"\x08");
        assert_eq!(ed.cursor().render_col(), 1);
    }

    #[test]
    fn backspace_at_column_zero_joins() {
        let mut ed = editor(&["fo\to", "bar", "baz"], 4, 80);
        feed(&mut ed, b"ji");
        let (out, _) = feed(&mut ed, b"\x7f");
        assert_eq!(lines(&ed), vec!["fo\tobar", "baz"]);
        assert_eq!(pos(&ed), (0, 4));
        assert_eq!(ed.cursor().render_col(), 7);
        // Rows below the join move up; the freed row is blanked.
        assert!(out.contains("\x1b[2;1H\x1b[s\r\x1b[Kbaz\x1b[K\x1b[u"));
        assert!(out.contains("\x1b[3;1H\x1b[s\r\x1b[K\x1b[K\x1b[u"));
        assert!(out.ends_with("\x1b[1;8H"));
    }

    #[test]
    fn backspace_join_on_top_row_scrolls_back() {
        let mut ed = editor(&["a", "b", "c", "d", "e"], 3, 80);
        feed(&mut ed, b"jjjj");
        feed(&mut ed, b"kki");
        assert_eq!(ed.cursor().row_offset(), 2);
        assert_eq!(ed.cursor().screen_row(), 0);

        let (out, _) = feed(&mut ed, b"\x7f");

        assert_eq!(lines(&ed), vec!["a", "bc", "d", "e"]);
        assert_eq!(pos(&ed), (1, 1));
        assert_eq!(ed.cursor().row_offset(), 1);
        assert_eq!(
            out,
            concat!(
                // Reverse index, then the exposed top row.
                "\x1b[1;1H\x1bM",
                "\x1b[1;1H\x1b[s\r\x1b[Kbc\x1b[K\x1b[u",
                // Every row from the join down.
                "\x1b[1;1H\x1b[s\r\x1b[Kbc\x1b[K\x1b[u",
                "\x1b[2;1H\x1b[s\r\x1b[Kd\x1b[K\x1b[u",
                "\x1b[3;1H\x1b[s\r\x1b[Ke\x1b[K\x1b[u",
                "\x1b[1;2H",
            )
        );
    }

    #[test]
    fn backspace_at_origin_is_noop() {
        let mut ed = editor(&["abc"], 24, 80);
        let (out, _) = feed(&mut ed, b"i\x7f");
        assert_eq!(lines(&ed), vec!["abc"]);
        assert_eq!(out, "\x1b[1;1H");
    }

    #[test]
    fn split_then_backspace_restores_line() {
        let mut ed = editor(&["abcdef"], 24, 80);
        feed(&mut ed, b"llli\r\x7f");
        assert_eq!(lines(&ed), vec!["abcdef"]);
        assert_eq!(pos(&ed), (0, 3));
    }

    // ── x ─────────────────────────────────────────────────────────────────

    #[test]
    fn x_deletes_under_cursor() {
        let mut ed = editor(&["abc"], 24, 80);
        feed(&mut ed, b"l");
        let (out, _) = feed(&mut ed, b"x");
        assert_eq!(lines(&ed), vec!["ac"]);
        assert_eq!(pos(&ed), (0, 1));
        assert_eq!(out, "\x1b[1;1H\x1b[s\r\x1b[Kac\x1b[K\x1b[u\x1b[1;2H");
    }

    #[test]
    fn x_on_single_byte_line() {
        let mut ed = editor(&["a"], 24, 80);
        feed(&mut ed, b"x");
        assert_eq!(lines(&ed), vec![""]);
        assert_eq!(pos(&ed), (0, 0));
    }

    #[test]
    fn x_at_end_clamps_left() {
        let mut ed = editor(&["abc"], 24, 80);
        feed(&mut ed, b"llx");
        assert_eq!(lines(&ed), vec!["ab"]);
        assert_eq!(pos(&ed), (0, 1));
    }

    #[test]
    fn x_on_empty_line_is_noop() {
        let mut ed = editor(&["", "a"], 24, 80);
        let (out, _) = feed(&mut ed, b"x");
        assert_eq!(lines(&ed), vec!["", "a"]);
        assert_eq!(out, "\x1b[1;1H");
    }

    // ── Command mode ──────────────────────────────────────────────────────

    #[test]
    fn colon_then_escape_returns_to_normal() {
        let mut ed = editor(&["abc"], 24, 80);
        feed(&mut ed, b":");
        assert_eq!(ed.mode(), Mode::Command);
        feed(&mut ed, b"\x1b");
        assert_eq!(ed.mode(), Mode::Normal);
        feed(&mut ed, b":\r");
        assert_eq!(ed.mode(), Mode::Normal);
    }

    #[test]
    fn unknown_command_key_stays_in_command() {
        let mut ed = editor(&["abc"], 24, 80);
        feed(&mut ed, b":z");
        assert_eq!(ed.mode(), Mode::Command);
    }

    #[test]
    fn colon_q_quits() {
        let mut ed = editor(&["abc"], 24, 80);
        let (out, action) = feed(&mut ed, b":q");
        assert_eq!(action, Action::Quit);
        assert!(out.is_empty());
    }

    #[test]
    fn colon_w_saves_and_reports() {
        let mut ed = editor(&["abc", "de"], 3, 80);
        let (out, _) = feed(&mut ed, b":w");
        assert_eq!(ed.mode(), Mode::Normal);
        assert_eq!(
            ed.store().files,
            vec![(PathBuf::from("test.txt"), b"abc\nde\n".to_vec())]
        );
        assert!(ed.message_shown());
        assert!(out.contains("\x1b[3;1H\x1b[s\r\x1b[K\"test.txt\" 2 lines, 7 bytes written"));
    }

    #[test]
    fn message_is_cleared_by_next_key() {
        let mut ed = editor(&["abc", "de", "fgh"], 3, 80);
        feed(&mut ed, b":w");
        let (out, _) = feed(&mut ed, b"l");
        assert!(!ed.message_shown());
        assert!(out.starts_with("\x1b[3;1H\x1b[s\r\x1b[Kfgh\x1b[K\x1b[u"));
    }

    #[test]
    fn save_failure_is_reported_not_fatal() {
        let mut ed = editor(&["abc"], 2, 80);
        ed.store.fail = true;
        let (out, action) = feed(&mut ed, b":w");
        assert_eq!(action, Action::Continue);
        assert_eq!(ed.mode(), Mode::Normal);
        assert!(out.contains("\"test.txt\" permission denied"));
    }

    #[test]
    fn edits_then_save() {
        let mut ed = editor(&["ab"], 24, 80);
        feed(&mut ed, b"AX\x1b:w");
        assert_eq!(ed.store().files[0].1, b"abX\n");
    }

    // ── Painting ──────────────────────────────────────────────────────────

    #[test]
    fn paint_all_clears_draws_and_positions() {
        let mut ed = editor(&["a\tb", "c"], 3, 80);
        let mut out = RenderChannel::new(80);
        ed.paint_all(&mut out);
        let text = String::from_utf8_lossy(out.as_bytes()).into_owned();
        assert!(text.starts_with("\x1b[2J\x1b[H"));
        assert!(text.contains("\x1b[1;1H\x1b[s\r\x1b[Ka    b\x1b[K\x1b[u"));
        assert!(text.contains("\x1b[2;1H\x1b[s\r\x1b[Kc\x1b[K\x1b[u"));
        assert!(text.contains("\x1b[3;1H\x1b[s\r\x1b[K\x1b[K\x1b[u"));
        assert!(text.ends_with("\x1b[1;1H"));
    }

    #[test]
    fn resize_pulls_window_over_cursor() {
        let lines: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let mut ed = editor(&refs, 10, 80);
        feed(&mut ed, b"jjjjjjjj");
        ed.resize(3, 80);
        assert_eq!(ed.cursor().row_offset(), 6);
        assert_eq!(ed.cursor().screen_row(), 2);
    }

    #[test]
    fn cursor_is_clipped_to_window_width() {
        let mut ed = editor(&["abcdefghij"], 5, 4);
        let (out, _) = feed(&mut ed, b"A");
        assert_eq!(out, "\x1b[1;4H");
    }

    // ── Full session ──────────────────────────────────────────────────────

    #[test]
    fn open_loads_through_store() {
        let store = MemoryStore {
            files: vec![(PathBuf::from("f"), b"x\ny".to_vec())],
            fail: false,
        };
        let ed = Editor::open("f", EditorConfig::default(), store).unwrap();
        assert_eq!(ed.buffer().line(1), Some(&Line::from("y")));
        assert!(Editor::open("g", EditorConfig::default(), MemoryStore::default()).is_err());
    }

    #[test]
    fn session_edits_saves_and_quits() {
        let mut ed = editor(&["foo", "bar"], 0, 0);
        let term = ScriptedTerminal::new(5, 40, b"jA!\x1b:w:q");
        let signals: &'static SignalFlags = Box::leak(Box::new(SignalFlags::new()));
        let mut event_loop = EventLoop::with_terminal(term, signals);

        event_loop.run(&mut ed).unwrap();

        assert_eq!(lines(&ed), vec!["foo", "bar!"]);
        assert_eq!(ed.store().files[0].1, b"foo\nbar!\n");
        let term = event_loop.terminal();
        assert!(!term.is_raw());
        // Paint, seven keys before quit, exit clear.
        assert_eq!(term.writes().len(), 9);
        assert!(term.writes()[0].starts_with(b"\x1b[2J\x1b[H"));
    }

    #[test]
    fn session_with_delete_and_ctrl_arrow_keeps_buffer() {
        let mut ed = editor(&["abc"], 0, 0);
        let term = ScriptedTerminal::new(5, 40, b"i\x1b[3~\x1b[1;5D\x1b:q");
        let signals: &'static SignalFlags = Box::leak(Box::new(SignalFlags::new()));
        let mut event_loop = EventLoop::with_terminal(term, signals);

        event_loop.run(&mut ed).unwrap();

        assert_eq!(lines(&ed), vec!["abc"]);
        // Paint, five keys before quit, exit clear.
        assert_eq!(event_loop.terminal().writes().len(), 7);
    }
}
