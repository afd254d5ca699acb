//! Shared utilities.
//!
//! - [`fs`] - File system operations with atomic writes and JSON helpers

pub mod fs;

pub use fs::{atomic_write, checksum_bytes, ensure_dir, ensure_parent_dir, safe_write, write_json_file};
