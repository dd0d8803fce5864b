//! The platform client seam.
//!
//! The dispatcher never talks to the chat platform directly. Everything it
//! needs (identity, permission resolution, sending replies) goes through
//! [`Client`].

use async_trait::async_trait;
use herald_foundation::{ChannelId, GuildId, InteractionId, MessageId, Permissions, Result, UserId};

/// Operations the dispatcher needs from the chat platform.
#[async_trait]
pub trait Client: Send + Sync {
    /// The bot's own user id.
    fn user_id(&self) -> UserId;

    /// Returns true if the user owns the bot.
    fn is_owner(&self, user: UserId) -> bool;

    /// Returns true if the user is a super user. Owners are always super
    /// users.
    fn is_super_user(&self, user: UserId) -> bool {
        self.is_owner(user)
    }

    /// Resolves a user's effective permissions in a channel, after
    /// overwrites. `None` means the platform could not resolve them.
    async fn permissions_for(
        &self,
        channel: ChannelId,
        user: UserId,
    ) -> Result<Option<Permissions>>;

    /// Sends a message and returns its id.
    async fn send(&self, channel: ChannelId, content: &str) -> Result<MessageId>;

    /// Edits a previously sent message.
    async fn edit(&self, channel: ChannelId, message: MessageId, content: &str) -> Result<()>;

    /// Starts the typing indicator.
    async fn start_typing(&self, _channel: ChannelId) -> Result<()> {
        Ok(())
    }

    /// Stops the typing indicator.
    async fn stop_typing(&self, _channel: ChannelId) -> Result<()> {
        Ok(())
    }

    /// Fetches a guild member into the platform cache.
    async fn fetch_member(&self, _guild: GuildId, _user: UserId) -> Result<()> {
        Ok(())
    }

    /// Acknowledges an interaction so a response can follow later.
    async fn defer(&self, _interaction: InteractionId, _ephemeral: bool) -> Result<()> {
        Ok(())
    }
}
