//! Modal editing.
//!
//! The editor is always in exactly one [`Mode`]. Each mode changes how keys
//! are interpreted and how far right the cursor may go:
//!
//! | Mode    | Cursor limit        | Purpose                   |
//! |---------|---------------------|---------------------------|
//! | Normal  | `0..len-1`          | Navigation, `x`, `:`      |
//! | Insert  | `0..len`            | Typing text               |
//! | Command | (cursor unchanged)  | `:w` and `:q`, one key    |
//!
//! Quitting is not a mode; the dispatcher returns a quit action instead.

use std::fmt;

/// The current editing mode.
///
/// Pure data: what mode we're in, not the logic for handling keys. Key
/// dispatch and transitions live in [`crate::editor`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Initial mode. Keys are commands, not text.
    #[default]
    Normal,
    /// Keys produce bytes in the buffer.
    Insert,
    /// Entered with `:`. The next key picks the command.
    Command,
}

impl Mode {
    /// Human-readable name, used in log lines.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Insert => "INSERT",
            Self::Command => "COMMAND",
        }
    }

    /// True if the cursor can sit one past the last byte.
    #[inline]
    #[must_use]
    pub const fn cursor_past_end(self) -> bool {
        matches!(self, Self::Insert)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
