//! Inbound message model.
//!
//! This is the shape the dispatch pipeline consumes. Platform adapters
//! translate their native message objects into it.

use crate::id::{ChannelId, GuildId, MessageId, UserId};

/// The author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Author {
    /// The author's user id.
    pub id: UserId,
    /// Whether the author is a bot account.
    pub bot: bool,
}

impl Author {
    /// Creates a human author.
    #[must_use]
    pub const fn user(id: UserId) -> Self {
        Self { id, bot: false }
    }

    /// Creates a bot author.
    #[must_use]
    pub const fn bot(id: UserId) -> Self {
        Self { id, bot: true }
    }
}

/// Where a channel lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelKind {
    /// A channel inside a guild.
    Guild,
    /// A direct-message channel.
    Dm,
}

/// The channel a message was posted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Channel {
    /// Channel id.
    pub id: ChannelId,
    /// Guild or direct-message channel.
    pub kind: ChannelKind,
    /// Whether the channel is marked age-restricted.
    pub nsfw: bool,
}

impl Channel {
    /// Creates a guild text channel.
    #[must_use]
    pub const fn guild(id: ChannelId) -> Self {
        Self {
            id,
            kind: ChannelKind::Guild,
            nsfw: false,
        }
    }

    /// Creates a direct-message channel.
    #[must_use]
    pub const fn dm(id: ChannelId) -> Self {
        Self {
            id,
            kind: ChannelKind::Dm,
            nsfw: false,
        }
    }

    /// Marks the channel age-restricted.
    #[must_use]
    pub const fn with_nsfw(mut self, nsfw: bool) -> Self {
        self.nsfw = nsfw;
        self
    }
}

/// An inbound chat message.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// Message id.
    pub id: MessageId,
    /// Raw text content.
    pub content: String,
    /// Who sent it.
    pub author: Author,
    /// Where it was sent.
    pub channel: Channel,
    /// The guild, if sent inside one.
    pub guild_id: Option<GuildId>,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: u64,
    /// Last edit time in milliseconds since the Unix epoch.
    pub edited_at: Option<u64>,
    /// Whether the author's guild member record is already cached.
    pub member_cached: bool,
    /// Webhook that posted the message, if any.
    pub webhook_id: Option<u64>,
}

impl Message {
    /// Creates a direct message from a human author.
    #[must_use]
    pub fn new(id: MessageId, content: impl Into<String>, author: UserId) -> Self {
        Self {
            id,
            content: content.into(),
            author: Author::user(author),
            channel: Channel::dm(ChannelId::new(author.get())),
            guild_id: None,
            created_at: 0,
            edited_at: None,
            member_cached: true,
            webhook_id: None,
        }
    }

    /// Moves the message into a guild channel.
    #[must_use]
    pub fn in_guild(mut self, guild: GuildId, channel: ChannelId) -> Self {
        self.guild_id = Some(guild);
        self.channel = Channel::guild(channel);
        self
    }

    /// Sets the channel.
    #[must_use]
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    /// Sets the author.
    #[must_use]
    pub fn with_author(mut self, author: Author) -> Self {
        self.author = author;
        self
    }

    /// Sets the creation timestamp.
    #[must_use]
    pub fn with_created_at(mut self, millis: u64) -> Self {
        self.created_at = millis;
        self
    }

    /// Marks the message as edited at the given time.
    #[must_use]
    pub fn with_edited_at(mut self, millis: u64) -> Self {
        self.edited_at = Some(millis);
        self
    }

    /// Replaces the content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Returns true if the message was sent inside a guild.
    #[must_use]
    pub const fn in_guild_channel(&self) -> bool {
        self.guild_id.is_some()
    }

    /// Returns true if the message has been edited.
    #[must_use]
    pub const fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    /// The timestamp of the latest revision of this message.
    #[must_use]
    pub fn last_activity(&self) -> u64 {
        self.edited_at.unwrap_or(self.created_at)
    }
}
