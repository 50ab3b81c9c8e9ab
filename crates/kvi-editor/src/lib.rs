//! # kvi-editor: editor core for kvi
//!
//! - **[`buffer`]**: `LineBuffer`, a `Vec` of byte lines with edit primitives
//! - **[`cursor`]**: file/render column mapping, tab expansion, scroll window
//! - **[`mode`]**: Normal, Insert, Command
//! - **[`editor`]**: the session and its modal key dispatcher
//! - **[`file`]**: `FileStore` trait and the on-disk implementation
//! - **[`config`]**: editor settings

pub mod buffer;
pub mod config;
pub mod cursor;
pub mod editor;
pub mod file;
pub mod mode;
