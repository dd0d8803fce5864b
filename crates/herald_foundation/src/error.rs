//! Error types for the Herald system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::id::MessageId;

/// The main error type for Herald operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an alias conflict error.
    #[must_use]
    pub fn alias_conflict(
        alias: impl Into<String>,
        command: impl Into<String>,
        conflict: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::AliasConflict {
            alias: alias.into(),
            command: command.into(),
            conflict: conflict.into(),
        })
    }

    /// Creates a duplicate module error.
    #[must_use]
    pub fn duplicate_module(id: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateModule(id.into()))
    }

    /// Creates a module not found error.
    #[must_use]
    pub fn module_not_found(id: impl Into<String>) -> Self {
        Self::new(ErrorKind::ModuleNotFound(id.into()))
    }

    /// Creates an unknown command error.
    #[must_use]
    pub fn unknown_command(id: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownCommand(id.into()))
    }

    /// Creates a parse defect error.
    ///
    /// Raised when the tokenizer and parser disagree about the token stream.
    #[must_use]
    pub fn parse_defect(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseDefect {
            expected: expected.into(),
            found: found.into(),
        })
    }

    /// Creates an error raised by command code.
    #[must_use]
    pub fn command(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Command(message.into()))
    }

    /// Creates an error raised by an inhibitor.
    #[must_use]
    pub fn inhibitor(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Inhibitor(message.into()))
    }

    /// Creates an error raised by the platform client.
    #[must_use]
    pub fn platform(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Platform(message.into()))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns true if this error signals a programming defect rather than
    /// a runtime failure.
    #[must_use]
    pub const fn is_defect(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ParseDefect { .. } | ErrorKind::Internal(_)
        )
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// An alias is already claimed by another command.
    #[error("alias '{alias}' of command '{command}' already belongs to '{conflict}'")]
    AliasConflict {
        /// The conflicting alias (lowercased).
        alias: String,
        /// The command being registered.
        command: String,
        /// The command that already owns the alias.
        conflict: String,
    },

    /// A module with this id is already registered.
    #[error("module '{0}' is already registered")]
    DuplicateModule(String),

    /// No module with this id is registered.
    #[error("module '{0}' not found")]
    ModuleNotFound(String),

    /// A control flag handed off to a command that does not exist.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Tokenizer and parser disagree (should never happen).
    #[error("parse defect: expected {expected}, found {found} (this should never happen)")]
    ParseDefect {
        /// Token types the parser expected.
        expected: String,
        /// Token actually found.
        found: String,
    },

    /// Error raised inside command code.
    #[error("command error: {0}")]
    Command(String),

    /// Error raised inside an inhibitor.
    #[error("inhibitor error: {0}")]
    Inhibitor(String),

    /// Error reported by the platform client.
    #[error("platform error: {0}")]
    Platform(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Message being handled.
    pub message: Option<MessageId>,
    /// Command being run.
    pub command: Option<String>,
    /// Pipeline stages the error passed through.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message id.
    #[must_use]
    pub fn with_message(mut self, message: MessageId) -> Self {
        self.message = Some(message);
        self
    }

    /// Sets the command id.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(command) = &self.command {
            write!(f, "in command {command}")?;
        }
        if let Some(message) = self.message {
            write!(f, " (message {message})")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
