//! Control flags returned from argument resolution.
//!
//! A [`Flag`] replaces a normal argument outcome and tells the dispatch
//! pipeline to leave its usual path.

use herald_foundation::{ArgValue, Message};

/// Which kind of control flag a value is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlagKind {
    /// Stop silently.
    Cancel,
    /// Restart dispatch with another message.
    Retry,
    /// Hand off to another command.
    Continue,
    /// Stop with a failure payload.
    Fail,
}

/// A control-flow signal produced during argument resolution.
#[derive(Clone, Debug, PartialEq)]
pub enum Flag {
    /// Abort the invocation without running the command.
    Cancel,
    /// Re-dispatch from the top with a replacement message.
    Retry {
        /// The message to dispatch instead.
        message: Box<Message>,
    },
    /// Run another command as if it had been identified directly.
    Continue {
        /// Id of the command to run.
        command: String,
        /// Skip post-inhibitors, cooldowns, permissions and locks.
        ignore: bool,
        /// Content for the new command. When unset the remaining content
        /// of the current invocation is used.
        rest: Option<String>,
    },
    /// Abort with a diagnostic value.
    Fail {
        /// Failure payload, surfaced on the cancellation event.
        value: ArgValue,
    },
}

impl Flag {
    /// Creates a cancel flag.
    #[must_use]
    pub const fn cancel() -> Self {
        Self::Cancel
    }

    /// Creates a retry flag.
    #[must_use]
    pub fn retry(message: Message) -> Self {
        Self::Retry {
            message: Box::new(message),
        }
    }

    /// Creates a fail flag.
    #[must_use]
    pub fn fail(value: impl Into<ArgValue>) -> Self {
        Self::Fail {
            value: value.into(),
        }
    }

    /// Creates a continue flag.
    #[must_use]
    pub fn continue_with(command: impl Into<String>, ignore: bool, rest: Option<String>) -> Self {
        Self::Continue {
            command: command.into(),
            ignore,
            rest,
        }
    }

    /// The kind of this flag.
    #[must_use]
    pub const fn kind(&self) -> FlagKind {
        match self {
            Self::Cancel => FlagKind::Cancel,
            Self::Retry { .. } => FlagKind::Retry,
            Self::Continue { .. } => FlagKind::Continue,
            Self::Fail { .. } => FlagKind::Fail,
        }
    }

    /// Returns true if this flag is of the given kind.
    #[must_use]
    pub fn is(&self, kind: FlagKind) -> bool {
        self.kind() == kind
    }
}
