//! Error handling for OCX
//!
//! This module provides the strongly-typed error enum used across OCX and the
//! user-facing error reporting used by the CLI. The error system follows two
//! principles:
//! 1. **Strongly-typed errors** for precise handling in code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`OcxError`] - Enumerated error types for every failure mode OCX reports
//! - [`ErrorContext`] - Wrapper that adds user-facing details and suggestions
//!
//! Library code returns [`anyhow::Result`] and attaches context with
//! [`anyhow::Context`]; the binary converts whatever bubbles up with
//! [`user_friendly_error`] before printing it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ocx_cli::core::{OcxError, user_friendly_error};
//!
//! let error = OcxError::ComponentNotFound {
//!     name: "code-reviewer".to_string(),
//!     searched: vec!["kdco".to_string()],
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for OCX operations.
///
/// Resolution errors ([`ComponentNotFound`], [`CircularDependency`]) abort an
/// install before anything is written. Sandbox errors are fatal to the current
/// ghost run. Everything else wraps lower-level I/O or parsing failures.
///
/// [`ComponentNotFound`]: OcxError::ComponentNotFound
/// [`CircularDependency`]: OcxError::CircularDependency
#[derive(Error, Debug)]
pub enum OcxError {
    /// A requested or transitively required component is absent from every
    /// configured registry.
    #[error("Component '{name}' not found in any configured registry")]
    ComponentNotFound {
        /// Name of the missing component
        name: String,
        /// Registry names that were queried, in order
        searched: Vec<String>,
    },

    /// A component was reached again while it was still being resolved.
    ///
    /// `path` starts and ends with the same name, e.g. `[a, b, c, a]`.
    #[error("Circular dependency detected: {}", path.join(" → "))]
    CircularDependency {
        /// The cycle, in traversal order
        path: Vec<String>,
    },

    /// A registry request failed for a reason other than "not found".
    #[error("Registry request to {url} failed: {reason}")]
    RegistryRequest {
        /// Requested URL
        url: String,
        /// Transport or status description
        reason: String,
    },

    /// Components selected for install are already installed.
    #[error("Components already installed: {}", names.join(", "))]
    ComponentConflict {
        /// Conflicting component names, in request order
        names: Vec<String>,
    },

    /// The named profile has no directory under the profiles root.
    #[error("Profile '{name}' does not exist")]
    ProfileNotFound {
        /// Profile name
        name: String,
    },

    /// A profile with this name already exists.
    #[error("Profile '{name}' already exists")]
    ProfileAlreadyExists {
        /// Profile name
        name: String,
    },

    /// Profile names are single path components of `[A-Za-z0-9._-]`.
    #[error("Invalid profile name '{name}'")]
    InvalidProfileName {
        /// Rejected name
        name: String,
    },

    /// A configuration file exists but could not be parsed.
    #[error("Invalid configuration file {file}")]
    ConfigParse {
        /// Path of the offending file
        file: String,
        /// Parser message
        reason: String,
    },

    /// Building the sandbox tree failed. Nothing is left on disk.
    #[error("Failed to create sandbox: {reason}")]
    SandboxCreation {
        /// What went wrong
        reason: String,
    },

    /// A git invocation exited unsuccessfully.
    #[error("Git operation failed: {operation}")]
    GitCommandError {
        /// Git subcommand, e.g. `ls-files`
        operation: String,
        /// Captured stderr
        stderr: String,
    },

    /// The program to run inside the sandbox could not be located.
    #[error("Command '{command}' not found in PATH")]
    CommandNotFound {
        /// Program name
        command: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl Clone for OcxError {
    fn clone(&self) -> Self {
        match self {
            Self::ComponentNotFound {
                name,
                searched,
            } => Self::ComponentNotFound {
                name: name.clone(),
                searched: searched.clone(),
            },
            Self::CircularDependency {
                path,
            } => Self::CircularDependency {
                path: path.clone(),
            },
            Self::RegistryRequest {
                url,
                reason,
            } => Self::RegistryRequest {
                url: url.clone(),
                reason: reason.clone(),
            },
            Self::ComponentConflict {
                names,
            } => Self::ComponentConflict {
                names: names.clone(),
            },
            Self::ProfileNotFound {
                name,
            } => Self::ProfileNotFound {
                name: name.clone(),
            },
            Self::ProfileAlreadyExists {
                name,
            } => Self::ProfileAlreadyExists {
                name: name.clone(),
            },
            Self::InvalidProfileName {
                name,
            } => Self::InvalidProfileName {
                name: name.clone(),
            },
            Self::ConfigParse {
                file,
                reason,
            } => Self::ConfigParse {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::SandboxCreation {
                reason,
            } => Self::SandboxCreation {
                reason: reason.clone(),
            },
            Self::GitCommandError {
                operation,
                stderr,
            } => Self::GitCommandError {
                operation: operation.clone(),
                stderr: stderr.clone(),
            },
            Self::CommandNotFound {
                command,
            } => Self::CommandNotFound {
                command: command.clone(),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
            // For errors that don't implement Clone, convert to Other
            Self::Io(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::Json(e) => Self::Other {
                message: format!("JSON error: {e}"),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information.
///
/// Printed by the CLI with colour coding: error in red, details in yellow,
/// suggestion in green.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying OCX error
    pub error: OcxError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: OcxError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions.
///
/// Recognizes [`OcxError`] anywhere in the chain, [`std::io::Error`] and
/// [`serde_json::Error`]; anything else is wrapped with its full context chain
/// as the message.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    // Downcasting sees through `.context(..)` layers, so keep the outer
    // message when it adds something.
    if let Some(ocx_error) = error.downcast_ref::<OcxError>() {
        let ctx = create_error_context(ocx_error.clone());
        let outer = error.to_string();
        if ctx.details.is_none() && outer != ocx_error.to_string() {
            return ctx.with_details(outer);
        }
        return ctx;
    }

    if let Some(ctx) = error.downcast_ref::<ErrorContext>() {
        return ErrorContext {
            error: ctx.error.clone(),
            suggestion: ctx.suggestion.clone(),
            details: ctx.details.clone(),
        };
    }

    for cause in error.chain().skip(1) {
        if let Some(ocx_error) = cause.downcast_ref::<OcxError>() {
            return create_error_context(ocx_error.clone()).with_details(format!("{error}"));
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        let ctx = ErrorContext::new(OcxError::Other {
            message: format!("{error:#}"),
        });
        return match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => ctx.with_suggestion(
                "Check file ownership and permissions of the project and the OCX config directory",
            ),
            std::io::ErrorKind::NotFound => {
                ctx.with_suggestion("Check that the file or directory exists and the path is correct")
            }
            _ => ctx,
        };
    }

    ErrorContext::new(OcxError::Other {
        message: format!("{error:#}"),
    })
}

fn create_error_context(error: OcxError) -> ErrorContext {
    match &error {
        OcxError::ComponentNotFound {
            searched,
            ..
        } => {
            let details = if searched.is_empty() {
                "No registries are configured for the active scope".to_string()
            } else {
                format!("Searched registries: {}", searched.join(", "))
            };
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Check the component name, or add its registry with 'ocx registry add <name> <url>'")
        }
        OcxError::CircularDependency {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Components must not depend on themselves; report the cycle to the registry maintainer",
        ),
        OcxError::ComponentConflict {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Re-run with --force to reinstall the listed components"),
        OcxError::ProfileNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("List profiles with 'ocx profile list' or create one with 'ocx profile create <name>'"),
        OcxError::ProfileAlreadyExists {
            ..
        } => ErrorContext::new(error).with_suggestion("Pick another name or remove the existing profile first"),
        OcxError::InvalidProfileName {
            ..
        } => ErrorContext::new(error)
            .with_details("Profile names may only contain letters, digits, '.', '_' and '-'"),
        OcxError::ConfigParse {
            reason,
            ..
        } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Fix the JSON syntax; comments and trailing commas are allowed")
        }
        OcxError::RegistryRequest {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check your network connection and the registry URL"),
        OcxError::SandboxCreation {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check free space and permissions of the system temp directory"),
        OcxError::GitCommandError {
            stderr,
            ..
        } => {
            let details = stderr.trim().to_string();
            ErrorContext::new(error).with_details(details)
        }
        OcxError::CommandNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Install the program or pass an explicit command after '--'"),
        _ => ErrorContext::new(error),
    }
}
