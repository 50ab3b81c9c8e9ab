// SPDX-License-Identifier: MIT
//
// Terminal input decoding.
//
// Turns raw stdin bytes into keys, one key per call. The editor only needs
// a small vocabulary: printable bytes, Enter, Backspace, Escape, and the
// four arrow keys. Arrows arrive as escape sequences (`ESC [ A` in normal
// cursor mode, `ESC O A` in application cursor mode), which makes a bare
// ESC ambiguous: it is either the Escape key or the start of a sequence.
//
// The decoder resolves this with the terminal's poll timeout. After an ESC
// it reads the next byte; if the read times out, the user pressed Escape.
// If the next byte does not continue a known sequence, Escape is reported
// and the byte is kept for the following call, so `ESC i` typed quickly
// still means "leave insert mode, then i".
//
// A CSI sequence is always consumed whole: parameter and intermediate bytes
// up to the final byte. Sequences other than the plain arrows (Delete, Page
// Up, function keys, modified arrows) come out as a single `Key::Unknown`,
// never as stray printable bytes.

use std::io;

use crate::terminal::TerminalIo;

// ─── Key ─────────────────────────────────────────────────────────────────────

/// A decoded key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Any byte without a dedicated variant: printable ASCII, tab, other
    /// control bytes, or high bytes. Consumers decide which they accept.
    Byte(u8),
    /// CR or LF.
    Enter,
    /// DEL (0x7F) or BS (0x08).
    Backspace,
    /// A lone ESC.
    Escape,
    Up,
    Down,
    Left,
    Right,
    /// A complete escape sequence with no binding.
    Unknown,
}

impl Key {
    /// Classify a single byte that is not part of an escape sequence.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            b'\r' | b'\n' => Self::Enter,
            0x7F | 0x08 => Self::Backspace,
            0x1B => Self::Escape,
            b => Self::Byte(b),
        }
    }

    /// The printable byte this key inserts, if any. Tab counts as printable.
    #[must_use]
    pub const fn printable(self) -> Option<u8> {
        match self {
            Self::Byte(b @ (0x20..=0x7E | b'\t')) => Some(b),
            _ => None,
        }
    }
}

// ─── KeyDecoder ──────────────────────────────────────────────────────────────

/// Longest CSI parameter/intermediate run scanned before the sequence is
/// abandoned.
const MAX_CSI_PARAMS: usize = 16;

/// Final byte of an unmodified arrow sequence.
const fn arrow(fin: u8) -> Option<Key> {
    match fin {
        b'A' => Some(Key::Up),
        b'B' => Some(Key::Down),
        b'C' => Some(Key::Right),
        b'D' => Some(Key::Left),
        _ => None,
    }
}

/// Reads keys from a [`TerminalIo`], one per call.
#[derive(Debug, Default)]
pub struct KeyDecoder {
    /// A byte read while disambiguating ESC that turned out to belong to
    /// the next key.
    pending: Option<u8>,
}

impl KeyDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Whether a byte is held over for the next call.
    #[inline]
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Read the next key.
    ///
    /// Returns `Ok(None)` when the terminal's poll timeout expires with no
    /// input, giving the caller a chance to check for resize or termination.
    ///
    /// # Errors
    ///
    /// Propagates read errors from the terminal.
    pub fn read_key(&mut self, term: &mut (impl TerminalIo + ?Sized)) -> io::Result<Option<Key>> {
        let byte = match self.pending.take() {
            Some(b) => b,
            None => match term.read_byte()? {
                Some(b) => b,
                None => return Ok(None),
            },
        };

        if byte != 0x1B {
            return Ok(Some(Key::from_byte(byte)));
        }

        // ESC: Escape key, or the start of a CSI/SS3 sequence.
        let Some(intro) = term.read_byte()? else {
            return Ok(Some(Key::Escape));
        };
        if intro != b'[' && intro != b'O' {
            self.pending = Some(intro);
            return Ok(Some(Key::Escape));
        }

        let Some(first) = term.read_byte()? else {
            // `ESC [` or `ESC O` then silence: report Escape and replay the
            // introducer.
            self.pending = Some(intro);
            return Ok(Some(Key::Escape));
        };

        if intro == b'O' {
            return Ok(Some(arrow(first).unwrap_or_else(|| {
                tracing::trace!(fin = first, "ignoring unsupported SS3 sequence");
                Key::Unknown
            })));
        }
        self.finish_csi(term, first)
    }

    /// Consume the rest of a CSI sequence whose first body byte is `byte`.
    ///
    /// Parameter and intermediate bytes (`0x20..=0x3F`) are skipped up to the
    /// final byte (`0x40..=0x7E`). A byte outside both ranges ends the
    /// sequence early and is kept for the next call.
    fn finish_csi(
        &mut self,
        term: &mut (impl TerminalIo + ?Sized),
        mut byte: u8,
    ) -> io::Result<Option<Key>> {
        let mut params = 0;
        loop {
            match byte {
                0x40..=0x7E => break,
                0x20..=0x3F => {
                    params += 1;
                    if params > MAX_CSI_PARAMS {
                        tracing::trace!("abandoning overlong CSI sequence");
                        return Ok(Some(Key::Unknown));
                    }
                }
                other => {
                    tracing::trace!(other, "CSI sequence interrupted");
                    self.pending = Some(other);
                    return Ok(Some(Key::Unknown));
                }
            }
            let Some(next) = term.read_byte()? else {
                tracing::trace!("CSI sequence truncated by timeout");
                return Ok(Some(Key::Unknown));
            };
            byte = next;
        }

        if params == 0 {
            if let Some(key) = arrow(byte) {
                return Ok(Some(key));
            }
        }
        tracing::trace!(fin = byte, params, "ignoring unsupported CSI sequence");
        Ok(Some(Key::Unknown))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
