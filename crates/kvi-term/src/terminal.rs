// SPDX-License-Identifier: MIT
//
// Terminal control: raw mode, window size, byte I/O, RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), poll, isatty, and raw fd reads. These are
// the standard POSIX interfaces for terminal control and have no
// safe alternative. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// The editor talks to the terminal through the `TerminalIo` trait: read one
// byte (with a bounded wait), query the window size, enter/leave raw mode,
// write a block of bytes. `Tty` is the real implementation over stdin/stdout;
// `ScriptedTerminal` is an in-memory one that replays canned input and
// records every write, so the whole key loop can run under `cargo test`.
//
// Raw mode is never left to chance. `RawModeGuard` restores the saved
// termios when it goes out of scope: normal return, `?` early exit, or
// unwinding panic. For the panic path a hook also restores from a global
// backup before the default handler prints, so the message lands on a sane
// terminal.

#[cfg(any(test, feature = "testing"))]
use std::collections::VecDeque;
use std::io::{self, Write};
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, Once};

use crate::ansi;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Rows as a `usize` (screen-space arithmetic is done in `usize`).
    #[inline]
    #[must_use]
    pub const fn height(self) -> usize {
        self.rows as usize
    }

    /// Columns as a `usize`.
    #[inline]
    #[must_use]
    pub const fn width(self) -> usize {
        self.cols as usize
    }
}

// ─── TerminalIo ─────────────────────────────────────────────────────────────

/// The editor's view of a terminal.
///
/// Five operations. [`Tty`] is the real one; tests substitute
/// [`ScriptedTerminal`].
pub trait TerminalIo {
    /// Read one input byte.
    ///
    /// Blocks for at most the implementation's poll timeout. Returns
    /// `Ok(None)` when the timeout expires (or a signal interrupts the wait)
    /// with nothing to read.
    ///
    /// # Errors
    ///
    /// Returns an error if the input stream is closed or the read fails.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Query the window size.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn window_size(&mut self) -> io::Result<Size>;

    /// Switch the terminal to raw mode, saving the previous configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal attributes cannot be changed.
    fn enter_raw_mode(&mut self) -> io::Result<()>;

    /// Restore the configuration saved by [`enter_raw_mode`](Self::enter_raw_mode).
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal attributes cannot be restored.
    fn restore_mode(&mut self) -> io::Result<()>;

    /// Write a block of bytes and flush.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
}

// ─── RawModeGuard ───────────────────────────────────────────────────────────

/// Scoped raw mode.
///
/// [`acquire`](Self::acquire) enters raw mode; dropping the guard restores
/// it. Dereferences to the wrapped terminal so the event loop can keep using
/// it while the guard is alive.
pub struct RawModeGuard<'a, T: TerminalIo + ?Sized> {
    term: &'a mut T,
    armed: bool,
}

impl<'a, T: TerminalIo + ?Sized> RawModeGuard<'a, T> {
    /// Enter raw mode on `term`.
    ///
    /// # Errors
    ///
    /// Returns the error from [`TerminalIo::enter_raw_mode`]; no guard is
    /// created and nothing needs restoring.
    pub fn acquire(term: &'a mut T) -> io::Result<Self> {
        term.enter_raw_mode()?;
        Ok(Self { term, armed: true })
    }

    /// Restore the terminal now and report the outcome.
    ///
    /// The drop path swallows restore errors; the clean exit path should
    /// call this instead so a failure is visible.
    ///
    /// # Errors
    ///
    /// Returns the error from [`TerminalIo::restore_mode`].
    pub fn release(mut self) -> io::Result<()> {
        self.armed = false;
        self.term.restore_mode()
    }
}

impl<T: TerminalIo + ?Sized> Deref for RawModeGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.term
    }
}

impl<T: TerminalIo + ?Sized> DerefMut for RawModeGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.term
    }
}

impl<T: TerminalIo + ?Sized> Drop for RawModeGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.term.restore_mode();
        }
    }
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// [`Tty`] owns its own copy, but the panic hook can't reach it. This backup
/// lets the hook restore cooked mode without the struct.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Emergency screen reset: clear and home so the panic message starts on a
/// clean screen instead of on top of the editor's rows.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[2J\x1b[H";

/// Panic hook guard. Ensures the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
///
/// Writes [`EMERGENCY_RESTORE`] directly to fd 1 (bypassing Rust's stdout
/// lock, which may be held by the panicking frame), restores termios, then
/// delegates to the original hook.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Tty ────────────────────────────────────────────────────────────────────

/// How long [`Tty::window_size`]'s fallback waits for each byte of the
/// cursor position report.
const REPORT_TIMEOUT_MS: i32 = 100;

/// Longest cursor position report we accept (`ESC [ 65535 ; 65535 R`).
const REPORT_MAX_LEN: usize = 32;

/// The process's controlling terminal: stdin for input, stdout for output.
pub struct Tty {
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Upper bound on a single [`read_byte`](TerminalIo::read_byte) wait.
    poll_timeout_ms: i32,
}

impl Tty {
    /// Create a handle that waits at most `poll_timeout_ms` per read.
    ///
    /// Does **not** enter raw mode.
    #[must_use]
    pub fn new(poll_timeout_ms: u16) -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            poll_timeout_ms: i32::from(poll_timeout_ms.max(1)),
        }
    }

    /// Poll stdin and read one byte, waiting at most `timeout_ms`.
    #[cfg(unix)]
    fn read_with_timeout(timeout_ms: i32) -> io::Result<Option<u8>> {
        let ready = unsafe {
            let mut pfd = libc::pollfd {
                fd: libc::STDIN_FILENO,
                events: libc::POLLIN,
                revents: 0,
            };
            libc::poll(&raw mut pfd, 1, timeout_ms)
        };

        if ready == 0 {
            return Ok(None);
        }
        if ready < 0 {
            let err = io::Error::last_os_error();
            return if err.kind() == io::ErrorKind::Interrupted {
                Ok(None)
            } else {
                Err(err)
            };
        }

        let mut byte = 0u8;
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };
        match n {
            1 => Ok(Some(byte)),
            0 => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "terminal input closed",
            )),
            _ => {
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => Ok(None),
                    _ => Err(err),
                }
            }
        }
    }

    #[cfg(not(unix))]
    fn read_with_timeout(_timeout_ms: i32) -> io::Result<Option<u8>> {
        use std::io::Read;

        let mut byte = [0u8; 1];
        match io::stdin().lock().read(&mut byte)? {
            0 => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "terminal input closed",
            )),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Measure the window by pushing the cursor into the bottom-right corner
    /// and asking the terminal where it ended up.
    fn probe_size(&mut self) -> io::Result<Size> {
        let mut probe = Vec::with_capacity(16);
        ansi::cursor_to_far_corner(&mut probe)?;
        ansi::request_cursor_position(&mut probe)?;
        self.write(&probe)?;

        let mut report = Vec::with_capacity(REPORT_MAX_LEN);
        while report.len() < REPORT_MAX_LEN {
            match Self::read_with_timeout(REPORT_TIMEOUT_MS)? {
                Some(b'R') | None => break,
                Some(b) => report.push(b),
            }
        }

        let (rows, cols) = ansi::parse_cursor_report(&report)
            .ok_or_else(|| io::Error::other("unable to determine terminal window size"))?;
        Ok(Size {
            rows: u16::try_from(rows).unwrap_or(u16::MAX),
            cols: u16::try_from(cols).unwrap_or(u16::MAX),
        })
    }
}

impl Default for Tty {
    fn default() -> Self {
        Self::new(100)
    }
}

impl TerminalIo for Tty {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Self::read_with_timeout(self.poll_timeout_ms)
    }

    fn window_size(&mut self) -> io::Result<Size> {
        if let Some(size) = get_size() {
            return Ok(size);
        }
        tracing::debug!("TIOCGWINSZ unavailable, probing with a cursor position report");
        self.probe_size()
    }

    #[cfg(unix)]
    fn enter_raw_mode(&mut self) -> io::Result<()> {
        if self.original_termios.is_some() || !is_tty() {
            return Ok(());
        }

        install_panic_hook();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            // Save original for restore.
            self.original_termios = Some(termios);

            // Also save to global backup for the panic hook.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            // No break-to-SIGINT, no CR→NL, no parity check, no strip, no
            // flow control.
            termios.c_iflag &=
                !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
            // No output post-processing: "\n" is not turned into "\r\n".
            termios.c_oflag &= !libc::OPOST;
            termios.c_cflag |= libc::CS8;
            // No echo, no line buffering, no Ctrl-V, no signal keys.
            termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);

            // VMIN=1, VTIME=0: read() blocks for a byte; poll() bounds the wait.
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        tracing::debug!("raw mode entered");
        Ok(())
    }

    #[cfg(not(unix))]
    fn enter_raw_mode(&mut self) -> io::Result<()> {
        install_panic_hook();
        Ok(())
    }

    #[cfg(unix)]
    fn restore_mode(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original_termios {
            unsafe {
                if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }

            // Restored; the panic hook has nothing left to do.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            self.original_termios = None;
            tracing::debug!("terminal mode restored");
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn restore_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()
    }
}

impl Drop for Tty {
    fn drop(&mut self) {
        let _ = self.restore_mode();
    }
}

// ─── ScriptedTerminal ───────────────────────────────────────────────────────

/// An in-memory [`TerminalIo`] that replays scripted input.
///
/// Input is a queue of bytes and poll timeouts. When the queue runs dry,
/// `read_byte` reports end of input, which ends an event loop with an error;
/// scripts that want a clean exit finish with `:q`.
///
/// Every `write` is recorded separately, so tests can assert both on the
/// bytes and on the number of writes per key.
///
/// Available to other crates with the `testing` feature.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    size: Option<Size>,
    input: VecDeque<Option<u8>>,
    writes: Vec<Vec<u8>>,
    raw: bool,
    raw_entries: usize,
    restores: usize,
}

#[cfg(any(test, feature = "testing"))]
impl ScriptedTerminal {
    /// A `rows × cols` terminal that will deliver `input` byte by byte.
    #[must_use]
    pub fn new(rows: u16, cols: u16, input: &[u8]) -> Self {
        Self {
            size: Some(Size { cols, rows }),
            input: input.iter().copied().map(Some).collect(),
            ..Self::default()
        }
    }

    /// A terminal whose size query fails.
    #[must_use]
    pub fn without_size(input: &[u8]) -> Self {
        Self {
            size: None,
            input: input.iter().copied().map(Some).collect(),
            ..Self::default()
        }
    }

    /// Queue more input bytes.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied().map(Some));
    }

    /// Queue one poll timeout (a read that returns `Ok(None)`).
    pub fn push_timeout(&mut self) {
        self.input.push_back(None);
    }

    /// Change the size reported by the next query.
    pub const fn set_size(&mut self, rows: u16, cols: u16) {
        self.size = Some(Size { cols, rows });
    }

    /// Every write so far, one entry per call.
    #[must_use]
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// All written bytes concatenated.
    #[must_use]
    pub fn output(&self) -> Vec<u8> {
        self.writes.concat()
    }

    /// Whether the terminal is currently in raw mode.
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        self.raw
    }

    /// How many times raw mode was entered.
    #[must_use]
    pub const fn raw_entries(&self) -> usize {
        self.raw_entries
    }

    /// How many times the mode was restored.
    #[must_use]
    pub const fn restores(&self) -> usize {
        self.restores
    }
}

#[cfg(any(test, feature = "testing"))]
impl TerminalIo for ScriptedTerminal {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        self.input.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "scripted input exhausted")
        })
    }

    fn window_size(&mut self) -> io::Result<Size> {
        self.size
            .ok_or_else(|| io::Error::other("unable to determine terminal window size"))
    }

    fn enter_raw_mode(&mut self) -> io::Result<()> {
        self.raw = true;
        self.raw_entries += 1;
        Ok(())
    }

    fn restore_mode(&mut self) -> io::Result<()> {
        if self.raw {
            self.raw = false;
            self.restores += 1;
        }
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writes.push(bytes.to_vec());
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
