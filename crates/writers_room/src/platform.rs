//! Chat platform abstraction consumed by the session controllers.

use crate::{ChannelId, GuildId, MessageId, UserId};
use async_trait::async_trait;
use writers_room_error::PlatformResult;

/// Read/write access of a principal to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Access {
    /// May view the channel and its history
    pub read: bool,
    /// May send messages
    pub write: bool,
}

impl Access {
    /// Hidden from the channel.
    pub const NONE: Access = Access {
        read: false,
        write: false,
    };
    /// Full participation.
    pub const READ_WRITE: Access = Access {
        read: true,
        write: true,
    };
}

/// Who an access overwrite applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessTarget {
    /// The guild's default audience
    Everyone,
    /// A single user
    User(UserId),
}

/// Per-principal access overwrite applied when a channel is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessGrant {
    /// Principal the overwrite applies to
    pub target: AccessTarget,
    /// Granted access
    pub access: Access,
}

impl AccessGrant {
    /// Overwrite for the default audience.
    pub fn everyone(access: Access) -> Self {
        Self {
            target: AccessTarget::Everyone,
            access,
        }
    }

    /// Overwrite for one user.
    pub fn user(user: UserId, access: Access) -> Self {
        Self {
            target: AccessTarget::User(user),
            access,
        }
    }
}

/// Operations the session core needs from a chat platform.
///
/// Implementations are thin wrappers over the platform's HTTP API. Failures
/// are reported, never retried here.
#[async_trait]
pub trait Platform: Send + Sync {
    /// The bot's own user, whose reactions and messages are never acted on.
    fn bot_user(&self) -> UserId;

    /// Post a message, returning its identifier.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be delivered.
    async fn send_message(&self, channel: ChannelId, text: &str) -> PlatformResult<MessageId>;

    /// Add a reaction affordance to a message.
    ///
    /// # Errors
    ///
    /// Returns error if the reaction cannot be added.
    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> PlatformResult<()>;

    /// Remove every reaction from a message.
    ///
    /// # Errors
    ///
    /// Returns error if the reactions cannot be cleared.
    async fn clear_reactions(&self, channel: ChannelId, message: MessageId) -> PlatformResult<()>;

    /// Create a text channel with the given access overwrites.
    ///
    /// # Errors
    ///
    /// Returns error if the channel cannot be created.
    async fn create_channel(
        &self,
        guild: GuildId,
        name: &str,
        grants: &[AccessGrant],
    ) -> PlatformResult<ChannelId>;

    /// Overwrite one user's access to a channel.
    ///
    /// # Errors
    ///
    /// Returns error if the permission overwrite is rejected.
    async fn set_access(&self, channel: ChannelId, user: UserId, access: Access)
    -> PlatformResult<()>;

    /// Delete a channel.
    ///
    /// # Errors
    ///
    /// Returns error if the channel cannot be deleted.
    async fn delete_channel(&self, channel: ChannelId) -> PlatformResult<()>;

    /// Delete up to `limit` of the most recent messages in a channel.
    ///
    /// Returns the number of messages removed.
    ///
    /// # Errors
    ///
    /// Returns error if messages cannot be listed or deleted.
    async fn purge_recent(&self, channel: ChannelId, limit: u8) -> PlatformResult<usize>;

    /// Look up a channel by identifier, returning `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns error if the lookup itself fails.
    async fn resolve_channel(&self, channel: ChannelId) -> PlatformResult<Option<ChannelId>>;

    /// Inline mention markup for a user.
    fn mention(&self, user: UserId) -> String {
        format!("<@{}>", user)
    }

    /// Inline mention markup for a channel.
    fn channel_mention(&self, channel: ChannelId) -> String {
        format!("<#{}>", channel)
    }
}
