//! Per-key mutual exclusion for command execution.
//!
//! A command with a lock scope computes a key per invocation. While that key
//! is held, further invocations with the same key are rejected rather than
//! queued. Release happens when the [`LockGuard`] drops, whatever path the
//! invocation took.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use herald_foundation::{Args, Message};
use parking_lot::Mutex;
use tracing::trace;

/// Derives a lock key from a message and its resolved arguments. `None`
/// means the invocation is not locked.
pub type LockKeyFn = dyn Fn(&Message, &Args) -> Option<String> + Send + Sync;

/// What a command locks on.
#[derive(Clone)]
pub enum LockScope {
    /// One invocation per guild. Direct messages fall back to the channel.
    Guild,
    /// One invocation per channel.
    Channel,
    /// One invocation per user.
    User,
    /// A caller-supplied key.
    Custom(Arc<LockKeyFn>),
}

impl LockScope {
    /// Creates a custom scope.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Message, &Args) -> Option<String> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Computes the key for an invocation.
    #[must_use]
    pub fn key(&self, message: &Message, args: &Args) -> Option<String> {
        match self {
            Self::Guild => Some(
                message
                    .guild_id
                    .map_or_else(|| message.channel.id.to_string(), |g| g.to_string()),
            ),
            Self::Channel => Some(message.channel.id.to_string()),
            Self::User => Some(message.author.id.to_string()),
            Self::Custom(f) => f(message, args),
        }
    }
}

impl fmt::Debug for LockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guild => f.write_str("Guild"),
            Self::Channel => f.write_str("Channel"),
            Self::User => f.write_str("User"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// The set of currently held keys for one command.
#[derive(Debug, Default)]
pub struct Locker {
    held: Mutex<HashSet<String>>,
}

impl Locker {
    /// Creates an empty locker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes `key` if it is free. Check and insert happen under one lock, so
    /// concurrent callers cannot both succeed.
    #[must_use]
    pub fn try_acquire(self: &Arc<Self>, key: impl Into<String>) -> Option<LockGuard> {
        let key = key.into();
        if !self.held.lock().insert(key.clone()) {
            trace!(key = %key, "lock held");
            return None;
        }
        Some(LockGuard {
            locker: Arc::clone(self),
            key,
        })
    }

    /// Returns true if `key` is currently held.
    #[must_use]
    pub fn is_held(&self, key: &str) -> bool {
        self.held.lock().contains(key)
    }

    /// Number of held keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.held.lock().len()
    }

    /// Returns true if no key is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.lock().is_empty()
    }
}

/// A held lock key, released on drop.
#[derive(Debug)]
pub struct LockGuard {
    locker: Arc<Locker>,
    key: String,
}

impl LockGuard {
    /// The held key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.locker.held.lock().remove(&self.key);
    }
}
