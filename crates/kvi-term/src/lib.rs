// SPDX-License-Identifier: MIT
//
// kvi-term: terminal layer for the kvi editor.
//
// Raw mode, window size, key decoding, and an output channel that turns
// each keystroke into one write of a few escape sequences. There is no
// frame buffer and no cell diffing: the editor knows exactly which rows a
// key touched and says so. A small, fixed subset of VT100 sequences covers
// one cursor and one scrolling viewport.
//
// Everything above the byte level goes through the `TerminalIo` trait, so
// the full event loop runs against `ScriptedTerminal` in tests.

pub mod ansi;
pub mod event_loop;
pub mod input;
pub mod render;
pub mod terminal;
