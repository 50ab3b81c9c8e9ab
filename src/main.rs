// SPDX-License-Identifier: MIT
//
// kvi: a small modal terminal text editor.
//
// This is the binary that wires the two crates together:
//
//   kvi-term   → raw mode, key decoding, render channel, event loop
//   kvi-editor → line buffer, cursor model, mode dispatcher, file store
//
// `Editor` implements kvi-term's `App` trait. Each keypress flows through:
//
//   stdin → KeyDecoder → Editor::handle_key → buffer/cursor mutation
//         → RenderChannel diff → one write()
//
// Startup order matters: arguments are parsed and the file is loaded before
// the terminal is touched, so usage and open failures leave the shell as it
// was.

mod error;
mod logging;

use std::path::PathBuf;
use std::process;

use clap::Parser;

use kvi_editor::config::EditorConfig;
use kvi_editor::editor::Editor;
use kvi_editor::file::DiskStore;
use kvi_term::event_loop::{EventLoop, LoopConfig};

use crate::error::Error;

// ─── Command Line ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "kvi", version, about = "A small modal terminal text editor")]
struct Args {
    /// File to edit
    path: PathBuf,

    /// Cells per tab character
    #[arg(long, value_name = "N", default_value_t = 4,
          value_parser = clap::value_parser!(u16).range(1..))]
    tab_stop: u16,

    /// Write diagnostics to this file (filter with KVI_LOG)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Terminal read timeout in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 100,
          value_parser = clap::value_parser!(u16).range(1..))]
    poll_timeout_ms: u16,
}

impl Args {
    fn editor_config(&self) -> EditorConfig {
        EditorConfig::with_tab_stop(usize::from(self.tab_stop))
    }

    const fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            poll_timeout_ms: self.poll_timeout_ms,
        }
    }
}

// ─── Entry Point ─────────────────────────────────────────────────────────────

fn main() {
    let code = match run() {
        Ok(()) => 0,
        Err(e) => {
            report(&e);
            e.exit_code()
        }
    };
    process::exit(code);
}

fn run() -> Result<(), Error> {
    let args = Args::try_parse().map_err(Error::Usage)?;

    // Held until the session ends so buffered log lines are flushed.
    let _log_guard = logging::init(args.log_file.as_deref())?;

    let mut editor = Editor::open(&args.path, args.editor_config(), DiskStore).map_err(|source| {
        Error::Io {
            path: args.path.clone(),
            source,
        }
    })?;

    tracing::info!(
        path = %args.path.display(),
        tab_stop = args.tab_stop,
        "starting session"
    );

    EventLoop::new(args.loop_config())
        .run(&mut editor)
        .map_err(Error::Terminal)?;

    tracing::info!("session ended");
    Ok(())
}

fn report(e: &Error) {
    match e {
        // clap formats its own usage text and picks stdout or stderr.
        Error::Usage(clap_err) => {
            clap_err.print().ok();
        }
        other => {
            tracing::error!(error = %other, "exiting");
            eprintln!("kvi: {other}");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
