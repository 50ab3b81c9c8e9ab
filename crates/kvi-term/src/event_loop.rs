// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Event loop: one key in, one write out.
//
// The loop owns the terminal, the key decoder, and the render channel. Each
// iteration reads a single key, hands it to the application together with
// the channel, and flushes whatever the application queued in exactly one
// write. There is no frame buffer and no tick: the application is trusted to
// queue the minimal diff for the key it just handled.
//
// # Blocking model
//
// The only suspension point is the terminal read, which waits at most the
// poll timeout (100ms by default). A timeout yields no key; the loop uses
// the gap to look at its signal flags. Idle CPU is zero between timeouts.
//
// # Signals
//
// SIGWINCH sets a resize flag; the loop re-queries the window size and asks
// the application for a full repaint. SIGTERM, SIGHUP and SIGQUIT set a
// terminate flag; the loop returns an error and the raw mode guard restores
// the terminal on the way out. Both handlers only store to an atomic, which
// is async-signal-safe.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::input::{Key, KeyDecoder};
use crate::render::RenderChannel;
use crate::terminal::{RawModeGuard, Size, TerminalIo, Tty};

// ─── Signal Flags ────────────────────────────────────────────────────────────

/// Flags raised asynchronously and consumed by the loop.
#[derive(Debug)]
pub struct SignalFlags {
    resized: AtomicBool,
    terminate: AtomicBool,
}

impl SignalFlags {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resized: AtomicBool::new(false),
            terminate: AtomicBool::new(false),
        }
    }

    /// Mark the window as resized.
    pub fn raise_resize(&self) {
        self.resized.store(true, Ordering::Relaxed);
    }

    /// Ask the loop to stop.
    pub fn raise_terminate(&self) {
        self.terminate.store(true, Ordering::Relaxed);
    }

    fn take_resize(&self) -> bool {
        self.resized.swap(false, Ordering::Relaxed)
    }

    fn take_terminate(&self) -> bool {
        self.terminate.swap(false, Ordering::Relaxed)
    }
}

impl Default for SignalFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide flags written by the signal handlers.
static PROCESS_SIGNALS: SignalFlags = SignalFlags::new();

#[cfg(unix)]
extern "C" fn on_resize_signal(_sig: libc::c_int) {
    PROCESS_SIGNALS.raise_resize();
}

#[cfg(unix)]
extern "C" fn on_terminate_signal(_sig: libc::c_int) {
    PROCESS_SIGNALS.raise_terminate();
}

#[cfg(unix)]
fn install_handler(signal: libc::c_int, handler: extern "C" fn(libc::c_int)) {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = handler as *const () as usize;
        // No SA_RESTART: an interrupted poll() returns early and the loop
        // notices the flag without waiting out the timeout.
        sa.sa_flags = 0;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(signal, &raw const sa, std::ptr::null_mut());
    }
}

/// Route SIGWINCH to the resize flag and SIGTERM/SIGHUP/SIGQUIT to the
/// terminate flag of [`PROCESS_SIGNALS`].
#[cfg(unix)]
fn install_signal_handlers() {
    install_handler(libc::SIGWINCH, on_resize_signal);
    for signal in [libc::SIGTERM, libc::SIGHUP, libc::SIGQUIT] {
        install_handler(signal, on_terminate_signal);
    }
    tracing::debug!("signal handlers installed");
}

#[cfg(not(unix))]
fn install_signal_handlers() {}

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the event loop to do after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep reading keys.
    Continue,
    /// Exit the loop cleanly.
    Quit,
}

/// Application interface for the event loop.
///
/// The loop calls [`paint_all`](App::paint_all) once at startup and after
/// every resize, and [`on_key`](App::on_key) for every decoded key. Output
/// goes into the lent [`RenderChannel`]; the loop flushes it.
pub trait App {
    /// Handle one key, queueing the resulting screen diff into `out`.
    ///
    /// Return [`Action::Quit`] to exit the loop.
    fn on_key(&mut self, key: Key, out: &mut RenderChannel) -> Action;

    /// The window changed size. Called before the repaint that follows.
    fn on_resize(&mut self, _size: Size) {}

    /// Queue a full repaint: clear, every visible row, cursor.
    fn paint_all(&mut self, out: &mut RenderChannel);
}

// ─── Loop Config ─────────────────────────────────────────────────────────────

/// Event loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// Upper bound on a single terminal read, in milliseconds. Also the
    /// window within which an arrow key's escape sequence must arrive.
    pub poll_timeout_ms: u16,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 100,
        }
    }
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// The terminal event loop.
///
/// # Example
///
/// ```no_run
/// use kvi_term::event_loop::{Action, App, EventLoop, LoopConfig};
/// use kvi_term::input::Key;
/// use kvi_term::render::RenderChannel;
///
/// struct Quitter;
///
/// impl App for Quitter {
///     fn on_key(&mut self, key: Key, _out: &mut RenderChannel) -> Action {
///         if key == Key::Byte(b'q') { Action::Quit } else { Action::Continue }
///     }
///
///     fn paint_all(&mut self, out: &mut RenderChannel) {
///         out.clear_screen();
///     }
/// }
///
/// EventLoop::new(LoopConfig::default()).run(&mut Quitter)?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct EventLoop<T: TerminalIo> {
    terminal: T,
    decoder: KeyDecoder,
    out: RenderChannel,
    signals: &'static SignalFlags,
    install_handlers: bool,
}

impl EventLoop<Tty> {
    /// An event loop over the process's controlling terminal.
    #[must_use]
    pub fn new(config: LoopConfig) -> Self {
        Self {
            terminal: Tty::new(config.poll_timeout_ms),
            decoder: KeyDecoder::new(),
            out: RenderChannel::default(),
            signals: &PROCESS_SIGNALS,
            install_handlers: true,
        }
    }
}

impl<T: TerminalIo> EventLoop<T> {
    /// An event loop over any terminal, watching `signals` instead of the
    /// process signal handlers.
    pub fn with_terminal(terminal: T, signals: &'static SignalFlags) -> Self {
        Self {
            terminal,
            decoder: KeyDecoder::new(),
            out: RenderChannel::default(),
            signals,
            install_handlers: false,
        }
    }

    /// The wrapped terminal.
    #[inline]
    pub const fn terminal(&self) -> &T {
        &self.terminal
    }

    /// Run until the application returns [`Action::Quit`].
    ///
    /// Enters raw mode, paints once, then processes keys until quit. On a
    /// clean quit the screen is cleared and the cursor homed before the
    /// terminal is restored. Every other exit path restores the terminal
    /// through the guard.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode cannot be entered, the window size
    /// cannot be determined, a read or write fails, or a termination signal
    /// arrives.
    pub fn run(&mut self, app: &mut impl App) -> io::Result<()> {
        let mut term = RawModeGuard::acquire(&mut self.terminal)?;

        let size = term.window_size()?;
        tracing::debug!(rows = size.rows, cols = size.cols, "session started");

        if self.install_handlers {
            install_signal_handlers();
        }

        self.out.set_width(size.width());
        app.on_resize(size);
        app.paint_all(&mut self.out);
        self.out.flush(&mut *term)?;

        loop {
            if self.signals.take_terminate() {
                tracing::info!("termination signal received");
                self.out.clear_screen();
                self.out.flush(&mut *term)?;
                return Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "terminated by signal",
                ));
            }

            if self.signals.take_resize() {
                let size = term.window_size()?;
                tracing::debug!(rows = size.rows, cols = size.cols, "window resized");
                self.out.set_width(size.width());
                app.on_resize(size);
                app.paint_all(&mut self.out);
                self.out.flush(&mut *term)?;
            }

            let Some(key) = self.decoder.read_key(&mut *term)? else {
                continue;
            };

            if app.on_key(key, &mut self.out) == Action::Quit {
                break;
            }
            self.out.flush(&mut *term)?;
        }

        tracing::info!("quit");
        self.out.clear();
        self.out.clear_screen();
        self.out.flush(&mut *term)?;
        term.release()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
