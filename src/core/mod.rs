//! Core types and error handling for OCX.
//!
//! Everything outside this module reports failures through [`OcxError`]
//! (usually wrapped in an [`anyhow::Error`] with context), and the binary
//! renders them with [`user_friendly_error`].

pub mod error;

pub use error::{ErrorContext, OcxError, user_friendly_error};
