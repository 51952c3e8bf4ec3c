//! Read-only HTTP access to a local project directory.
//!
//! Two routes: `/list-project` walks the tree, `/read-file` returns one file's
//! text. The plugin's own directory is hidden from both.

pub mod config;
pub mod server;
pub mod util;
