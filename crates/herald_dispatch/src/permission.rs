//! Permission requirements and ignore lists.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use herald_foundation::{ArgValue, Message, Permissions, Result, UserId};

use crate::client::Client;

/// Computes missing permissions dynamically. `None` passes; any value fails
/// and becomes the diagnostic payload.
pub type DynamicPermissionFn =
    dyn Fn(Message) -> BoxFuture<'static, Result<Option<ArgValue>>> + Send + Sync;

/// Which actor a permission requirement applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PermissionSide {
    /// The bot itself.
    Client,
    /// The message author.
    User,
}

/// A permission requirement.
#[derive(Clone)]
pub enum PermissionCheck {
    /// A fixed set, checked against channel permissions in guilds.
    Static(Permissions),
    /// A custom, possibly asynchronous check.
    Dynamic(Arc<DynamicPermissionFn>),
}

impl PermissionCheck {
    /// Creates a dynamic check.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(Message) -> BoxFuture<'static, Result<Option<ArgValue>>> + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Evaluates the requirement for `actor`.
    ///
    /// Static sets only apply inside guilds. When the platform cannot
    /// resolve the actor's permissions, every required permission counts as
    /// missing.
    ///
    /// # Errors
    ///
    /// Propagates client and dynamic-check errors.
    pub async fn missing(
        &self,
        client: &dyn Client,
        message: &Message,
        actor: UserId,
    ) -> Result<Option<ArgValue>> {
        match self {
            Self::Static(required) => {
                if !message.in_guild_channel() || required.is_empty() {
                    return Ok(None);
                }
                let missing = client
                    .permissions_for(message.channel.id, actor)
                    .await?
                    .map_or(*required, |actual| actual.missing(*required));
                if missing.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(ArgValue::from(missing.names())))
                }
            }
            Self::Dynamic(check) => check(message.clone()).await,
        }
    }
}

impl fmt::Debug for PermissionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(p) => f.debug_tuple("Static").field(p).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<Permissions> for PermissionCheck {
    fn from(p: Permissions) -> Self {
        Self::Static(p)
    }
}

/// Decides whether a message author is exempt from a check.
pub type IgnorePredicate = dyn Fn(&Message, &str) -> bool + Send + Sync;

/// Users exempt from cooldowns or user-side permission checks.
#[derive(Clone, Default)]
pub enum IgnoreList {
    /// Nobody is exempt.
    #[default]
    None,
    /// Bot owners are exempt.
    Owners,
    /// These users are exempt.
    Ids(Vec<UserId>),
    /// Exempt when the predicate, given the message and command id, holds.
    Predicate(Arc<IgnorePredicate>),
}

impl IgnoreList {
    /// Creates a predicate list.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Message, &str) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Returns true if the message author is exempt for `command`.
    #[must_use]
    pub fn contains(&self, client: &dyn Client, message: &Message, command: &str) -> bool {
        match self {
            Self::None => false,
            Self::Owners => client.is_owner(message.author.id),
            Self::Ids(ids) => ids.contains(&message.author.id),
            Self::Predicate(f) => f(message, command),
        }
    }
}

impl fmt::Debug for IgnoreList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Owners => f.write_str("Owners"),
            Self::Ids(ids) => f.debug_tuple("Ids").field(ids).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<UserId> for IgnoreList {
    fn from(id: UserId) -> Self {
        Self::Ids(vec![id])
    }
}

impl From<Vec<UserId>> for IgnoreList {
    fn from(ids: Vec<UserId>) -> Self {
        Self::Ids(ids)
    }
}
