//! Open argument prompts.
//!
//! While a user is answering an argument prompt in a channel, their other
//! messages in that channel are not dispatched.

use std::collections::HashSet;

use herald_foundation::{ChannelId, UserId};
use parking_lot::Mutex;

/// Tracks which users have an open prompt in which channels.
#[derive(Debug, Default)]
pub struct PromptTracker {
    open: Mutex<HashSet<(ChannelId, UserId)>>,
}

impl PromptTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a prompt open. Returns false if one was already open.
    pub fn add(&self, channel: ChannelId, user: UserId) -> bool {
        self.open.lock().insert((channel, user))
    }

    /// Marks a prompt closed.
    pub fn remove(&self, channel: ChannelId, user: UserId) {
        self.open.lock().remove(&(channel, user));
    }

    /// Returns true if the user has an open prompt in the channel.
    #[must_use]
    pub fn has(&self, channel: ChannelId, user: UserId) -> bool {
        self.open.lock().contains(&(channel, user))
    }
}
