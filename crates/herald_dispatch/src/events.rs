//! Lifecycle events emitted by the dispatcher.
//!
//! Policy rejections are not errors: they are reported here and dispatch
//! returns normally. Listeners subscribe to an [`EventBus`] and decide what,
//! if anything, to tell the user.

use std::fmt;
use std::sync::Arc;

use herald_foundation::{ArgValue, Args, Error, Interaction, Message};
use tokio::sync::broadcast;

use crate::permission::PermissionSide;

/// Why a message or command was blocked by a built-in check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltInReason {
    /// The message came from this bot.
    Client,
    /// The message came from another bot.
    Bot,
    /// The command is owner-only.
    Owner,
    /// The command is super-user-only.
    SuperUser,
    /// The command only runs in guilds.
    Guild,
    /// The command only runs in direct messages.
    Dm,
    /// The command only runs in age-restricted channels.
    NotNsfw,
}

impl BuiltInReason {
    /// Stable name of this reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Bot => "bot",
            Self::Owner => "owner",
            Self::SuperUser => "superUser",
            Self::Guild => "guild",
            Self::Dm => "dm",
            Self::NotNsfw => "notNsfw",
        }
    }
}

/// A block reason: built in, or named by an inhibitor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockReason {
    /// A built-in check.
    BuiltIn(BuiltInReason),
    /// The reason string of an inhibitor.
    Inhibitor(String),
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuiltIn(reason) => f.write_str(reason.as_str()),
            Self::Inhibitor(reason) => f.write_str(reason),
        }
    }
}

impl From<BuiltInReason> for BlockReason {
    fn from(reason: BuiltInReason) -> Self {
        Self::BuiltIn(reason)
    }
}

/// Something that happened during dispatch or registration.
#[derive(Clone, Debug)]
pub enum HandlerEvent {
    /// Blocked before a command was identified.
    MessageBlocked {
        /// The message.
        message: Message,
        /// Why.
        reason: BlockReason,
    },
    /// The author has an open prompt in this channel.
    InPrompt {
        /// The message.
        message: Message,
    },
    /// No command matched.
    MessageInvalid {
        /// The message.
        message: Message,
    },
    /// A command was blocked by a post check.
    CommandBlocked {
        /// The message.
        message: Message,
        /// The command id.
        command: String,
        /// Why.
        reason: BlockReason,
    },
    /// A permission requirement failed.
    MissingPermissions {
        /// The message.
        message: Message,
        /// The command id.
        command: String,
        /// Whose permissions were missing.
        side: PermissionSide,
        /// What was missing.
        missing: ArgValue,
    },
    /// The author is on cooldown for the command.
    Cooldown {
        /// The message.
        message: Message,
        /// The command id.
        command: String,
        /// Milliseconds left.
        remaining: u64,
    },
    /// The command's lock key was held.
    CommandLocked {
        /// The message.
        message: Message,
        /// The command id.
        command: String,
        /// The held key.
        key: String,
    },
    /// A command is about to run.
    CommandStarted {
        /// The message.
        message: Message,
        /// The command id.
        command: String,
        /// Resolved arguments.
        args: Args,
    },
    /// A command finished.
    CommandFinished {
        /// The message.
        message: Message,
        /// The command id.
        command: String,
        /// Resolved arguments.
        args: Args,
        /// Value returned by the command.
        output: ArgValue,
    },
    /// Argument resolution cancelled the command.
    CommandCancelled {
        /// The message.
        message: Message,
        /// The command id.
        command: String,
        /// Failure payload, when cancelled by a fail flag.
        failure: Option<ArgValue>,
    },
    /// Argument resolution asked to retry with another message.
    CommandBreakout {
        /// The original message.
        message: Message,
        /// The command id.
        command: String,
        /// The replacement message.
        next: Message,
    },
    /// An error was raised and routed here.
    Error {
        /// The error.
        error: Arc<Error>,
        /// The message being handled.
        message: Message,
        /// The command, if one had been identified.
        command: Option<String>,
    },
    /// An interaction named an unknown command.
    SlashNotFound {
        /// The interaction.
        interaction: Interaction,
    },
    /// A slash command is about to run.
    SlashStarted {
        /// The interaction.
        interaction: Interaction,
        /// The command id.
        command: String,
        /// Converted options.
        args: Args,
    },
    /// A slash command finished.
    SlashFinished {
        /// The interaction.
        interaction: Interaction,
        /// The command id.
        command: String,
        /// Value returned by the command.
        output: ArgValue,
    },
    /// A slash command raised an error.
    SlashError {
        /// The error.
        error: Arc<Error>,
        /// The interaction.
        interaction: Interaction,
        /// The command id.
        command: String,
    },
    /// A module was registered.
    Load {
        /// Module id.
        id: String,
        /// True when registered by a reload.
        reload: bool,
    },
    /// A module was removed.
    Remove {
        /// Module id.
        id: String,
    },
}

impl HandlerEvent {
    /// Stable event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MessageBlocked { .. } => "messageBlocked",
            Self::InPrompt { .. } => "inPrompt",
            Self::MessageInvalid { .. } => "messageInvalid",
            Self::CommandBlocked { .. } => "commandBlocked",
            Self::MissingPermissions { .. } => "missingPermissions",
            Self::Cooldown { .. } => "cooldown",
            Self::CommandLocked { .. } => "commandLocked",
            Self::CommandStarted { .. } => "commandStarted",
            Self::CommandFinished { .. } => "commandFinished",
            Self::CommandCancelled { .. } => "commandCancelled",
            Self::CommandBreakout { .. } => "commandBreakout",
            Self::Error { .. } => "error",
            Self::SlashNotFound { .. } => "slashNotFound",
            Self::SlashStarted { .. } => "slashStarted",
            Self::SlashFinished { .. } => "slashFinished",
            Self::SlashError { .. } => "slashError",
            Self::Load { .. } => "load",
            Self::Remove { .. } => "remove",
        }
    }
}

/// Broadcast channel for [`HandlerEvent`]s.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<HandlerEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HandlerEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event. Returns the number of receivers it reached.
    pub fn publish(&self, event: HandlerEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns true if anyone is subscribed.
    #[must_use]
    pub fn has_listeners(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
