//! [`Platform`] over serenity's HTTP client.

use crate::conversions::{SerenityId, emoji_reaction};
use async_trait::async_trait;
use serenity::all::{
    ChannelType, CreateChannel, GetMessages, PermissionOverwrite, PermissionOverwriteType,
    Permissions, RoleId,
};
use serenity::http::{Http, HttpError};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use writers_room::{
    Access, AccessGrant, AccessTarget, ChannelId, GuildId, MessageId, Platform, PlatformError,
    PlatformErrorKind, PlatformResult, UserId,
};

/// Discord maximum message length in characters.
pub const DISCORD_MAX_MESSAGE_LENGTH: usize = 2000;

/// Discord refuses to list or bulk-delete more than this many messages at once.
const DISCORD_MAX_BULK: u8 = 100;

/// Split `text` into chunks of at most `limit` characters.
///
/// Chunks break at the last newline inside the window when there is one,
/// consuming that newline; otherwise they break mid-line.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;
    while let Some((cut, _)) = rest.char_indices().nth(limit) {
        let window = &rest[..cut];
        match window.rfind('\n').filter(|newline| *newline > 0) {
            Some(newline) => {
                chunks.push(window[..newline].to_string());
                rest = &rest[newline + 1..];
            }
            None => {
                chunks.push(window.to_string());
                rest = &rest[cut..];
            }
        }
    }
    chunks.push(rest.to_string());
    chunks
}

/// Allowed and denied permission bits for a channel access level.
pub fn access_permissions(access: Access) -> (Permissions, Permissions) {
    let read = Permissions::VIEW_CHANNEL | Permissions::READ_MESSAGE_HISTORY;
    let write = Permissions::SEND_MESSAGES;
    let mut allow = Permissions::empty();
    let mut deny = Permissions::empty();
    if access.read {
        allow |= read;
    } else {
        deny |= read;
    }
    if access.write {
        allow |= write;
    } else {
        deny |= write;
    }
    (allow, deny)
}

fn overwrite(guild: GuildId, grant: &AccessGrant) -> PermissionOverwrite {
    let (allow, deny) = access_permissions(grant.access);
    let kind = match grant.target {
        // The @everyone role shares its guild's id.
        AccessTarget::Everyone => PermissionOverwriteType::Role(RoleId::new(guild.get())),
        AccessTarget::User(user) => PermissionOverwriteType::Member(user.to_serenity()),
    };
    PermissionOverwrite { allow, deny, kind }
}

fn status_of(err: &serenity::Error) -> Option<u16> {
    match err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            Some(response.status_code.as_u16())
        }
        _ => None,
    }
}

#[track_caller]
fn api_error(action: &str, channel: ChannelId, err: serenity::Error) -> PlatformError {
    let kind = match status_of(&err) {
        Some(403) => PlatformErrorKind::InsufficientPermissions(format!("{}: {}", action, err)),
        Some(404) => PlatformErrorKind::ChannelNotFound(channel.get()),
        _ => PlatformErrorKind::Api(format!("{}: {}", action, err)),
    };
    PlatformError::new(kind)
}

/// Discord implementation of the session platform.
///
/// Shares one rate-limited HTTP client across all sessions.
#[derive(Clone)]
pub struct DiscordPlatform {
    http: Arc<Http>,
    bot_user: UserId,
}

impl DiscordPlatform {
    /// Wrap an HTTP client authenticated as `bot_user`.
    pub fn new(http: Arc<Http>, bot_user: UserId) -> Self {
        Self { http, bot_user }
    }

    /// Authenticate with `token` and look up the bot's own user.
    ///
    /// # Errors
    ///
    /// Returns error if the token is rejected.
    #[instrument(skip(token), fields(token_len = token.as_ref().len()))]
    pub async fn connect(token: impl AsRef<str>) -> PlatformResult<Self> {
        let http = Arc::new(Http::new(token.as_ref()));
        let me = http.get_current_user().await.map_err(|e| {
            PlatformError::new(PlatformErrorKind::Api(format!(
                "Failed to fetch bot user: {}",
                e
            )))
        })?;
        info!(bot = %me.name, "Discord HTTP client authenticated");
        Ok(Self::new(http, UserId::from_serenity(me.id)))
    }
}

#[async_trait]
impl Platform for DiscordPlatform {
    fn bot_user(&self) -> UserId {
        self.bot_user
    }

    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn send_message(&self, channel: ChannelId, text: &str) -> PlatformResult<MessageId> {
        if text.trim().is_empty() {
            return Err(PlatformError::new(PlatformErrorKind::InvalidInput(
                "Message must have text".to_string(),
            )));
        }

        let mut last = None;
        for chunk in split_message(text, DISCORD_MAX_MESSAGE_LENGTH) {
            let sent = channel
                .to_serenity()
                .say(&*self.http, chunk)
                .await
                .map_err(|e| {
                    PlatformError::new(PlatformErrorKind::MessageSendFailed(format!(
                        "{} in {}",
                        e, channel
                    )))
                })?;
            last = Some(MessageId::from_serenity(sent.id));
        }
        last.ok_or_else(|| {
            PlatformError::new(PlatformErrorKind::MessageSendFailed(
                "nothing was sent".to_string(),
            ))
        })
    }

    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> PlatformResult<()> {
        channel
            .to_serenity()
            .create_reaction(&*self.http, message.to_serenity(), emoji_reaction(emoji))
            .await
            .map_err(|e| api_error("add reaction", channel, e))
    }

    async fn clear_reactions(&self, channel: ChannelId, message: MessageId) -> PlatformResult<()> {
        channel
            .to_serenity()
            .delete_reactions(&*self.http, message.to_serenity())
            .await
            .map_err(|e| api_error("clear reactions", channel, e))
    }

    #[instrument(skip(self, grants), fields(grants = grants.len()))]
    async fn create_channel(
        &self,
        guild: GuildId,
        name: &str,
        grants: &[AccessGrant],
    ) -> PlatformResult<ChannelId> {
        let overwrites: Vec<PermissionOverwrite> =
            grants.iter().map(|grant| overwrite(guild, grant)).collect();
        let builder = CreateChannel::new(name)
            .kind(ChannelType::Text)
            .permissions(overwrites);

        let created = guild
            .to_serenity()
            .create_channel(&*self.http, builder)
            .await
            .map_err(|e| {
                PlatformError::new(PlatformErrorKind::Api(format!(
                    "Failed to create channel {} in guild {}: {}",
                    name, guild, e
                )))
            })?;
        debug!(channel = %created.id, "Channel created");
        Ok(ChannelId::from_serenity(created.id))
    }

    async fn set_access(
        &self,
        channel: ChannelId,
        user: UserId,
        access: Access,
    ) -> PlatformResult<()> {
        let (allow, deny) = access_permissions(access);
        let target = PermissionOverwrite {
            allow,
            deny,
            kind: PermissionOverwriteType::Member(user.to_serenity()),
        };
        channel
            .to_serenity()
            .create_permission(&*self.http, target)
            .await
            .map_err(|e| api_error("set access", channel, e))
    }

    #[instrument(skip(self))]
    async fn delete_channel(&self, channel: ChannelId) -> PlatformResult<()> {
        channel
            .to_serenity()
            .delete(&*self.http)
            .await
            .map_err(|e| api_error("delete channel", channel, e))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn purge_recent(&self, channel: ChannelId, limit: u8) -> PlatformResult<usize> {
        let channel_id = channel.to_serenity();
        let recent = channel_id
            .messages(&*self.http, GetMessages::new().limit(limit.min(DISCORD_MAX_BULK)))
            .await
            .map_err(|e| api_error("list messages", channel, e))?;
        if recent.is_empty() {
            return Ok(0);
        }

        let ids: Vec<_> = recent.iter().map(|message| message.id).collect();
        channel_id
            .delete_messages(&*self.http, ids.iter())
            .await
            .map_err(|e| api_error("delete messages", channel, e))?;
        Ok(ids.len())
    }

    async fn resolve_channel(&self, channel: ChannelId) -> PlatformResult<Option<ChannelId>> {
        match channel.to_serenity().to_channel(&*self.http).await {
            Ok(found) => Ok(Some(ChannelId::from_serenity(found.id()))),
            Err(e) if matches!(status_of(&e), Some(403 | 404)) => {
                warn!(%channel, error = %e, "Channel not found");
                Ok(None)
            }
            Err(e) => Err(api_error("resolve channel", channel, e)),
        }
    }
}
