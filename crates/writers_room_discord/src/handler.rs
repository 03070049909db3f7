//! Gateway event handling.

use crate::commands::BotCommand;
use crate::conversions::{SerenityId, reaction_emoji};
use async_trait::async_trait;
use derive_getters::Getters;
use serenity::all::{Context, EventHandler, Message, Reaction, Ready};
use serenity::http::Http;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use writers_room::{
    ChannelId, Coordinator, GatewayEvent, GuildId, MessageId, StartRequest, UserId,
};

/// Posted to the ready channel of every guild on connect.
pub const READY_ANNOUNCEMENT: &str = "Bot is now online and ready to go!";

/// Reply to the `test` command.
pub const TEST_REPLY: &str = "Test command received!";

/// Serenity event handler feeding the session coordinator.
///
/// Commands run on their own tasks, since `start_session` waits for the roster
/// to fill. Every other message and every unicode reaction is handed to
/// [`Coordinator::dispatch`].
#[derive(Clone, Getters)]
pub struct WritersRoomHandler {
    coordinator: Coordinator,
}

impl WritersRoomHandler {
    /// Create a handler driving `coordinator`.
    pub fn new(coordinator: Coordinator) -> Self {
        Self { coordinator }
    }

    async fn announce_ready(&self, http: &Http, guild: serenity::all::GuildId) {
        let wanted = &self.coordinator.config().ready_channel_name;
        let channels = match guild.channels(http).await {
            Ok(channels) => channels,
            Err(e) => {
                warn!(%guild, error = %e, "Failed to list guild channels");
                return;
            }
        };

        let Some(channel) = channels.values().find(|c| &c.name == wanted) else {
            warn!(%guild, channel = %wanted, "Ready channel not found");
            return;
        };
        if let Err(e) = channel.id.say(http, READY_ANNOUNCEMENT).await {
            warn!(%guild, error = %e, "Failed to post ready announcement");
        }
    }

    #[instrument(
        skip(self, http, msg),
        fields(command = command.name(), channel = %msg.channel_id, user = %msg.author.id)
    )]
    async fn run_command(&self, http: Arc<Http>, command: BotCommand, msg: Message) {
        let channel = ChannelId::from_serenity(msg.channel_id);
        let actor = UserId::from_serenity(msg.author.id);

        let outcome = match command {
            BotCommand::StartSession { participants } => {
                self.start_session(participants, &msg).await
            }
            BotCommand::Share => self
                .coordinator
                .share(channel, actor)
                .await
                .map_err(|e| e.to_string()),
            BotCommand::Delete => self
                .coordinator
                .delete(channel, actor)
                .await
                .map_err(|e| e.to_string()),
            BotCommand::Test => msg
                .channel_id
                .say(&*http, TEST_REPLY)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
        };

        match outcome {
            Ok(()) => debug!("Command completed"),
            Err(e) => warn!(error = %e, "Command failed"),
        }
    }

    async fn start_session(&self, count: usize, msg: &Message) -> Result<(), String> {
        let Some(guild) = msg.guild_id else {
            return Err("start_session used outside a guild".to_string());
        };

        let mentions: Vec<UserId> = msg
            .mentions
            .iter()
            .filter(|user| !user.bot)
            .map(|user| UserId::from_serenity(user.id))
            .collect();
        let request = StartRequest::builder()
            .guild(GuildId::from_serenity(guild))
            .channel(ChannelId::from_serenity(msg.channel_id))
            .initiator(UserId::from_serenity(msg.author.id))
            .initiator_name(msg.author.name.clone())
            .participant_count(count)
            .mentions(mentions)
            .build()
            .map_err(|e| e.to_string())?;

        let channel = self
            .coordinator
            .start_session(request)
            .await
            .map_err(|e| e.to_string())?;
        info!(%channel, "Session started");
        Ok(())
    }
}

#[async_trait]
impl EventHandler for WritersRoomHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            "Connected to Discord gateway"
        );
        for guild in &ready.guilds {
            self.announce_ready(&ctx.http, guild.id).await;
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let prefix = &self.coordinator.config().command_prefix;
        if let Some(command) = BotCommand::parse(prefix, &msg.content) {
            let handler = self.clone();
            let http = ctx.http.clone();
            tokio::spawn(async move { handler.run_command(http, command, msg).await });
            return;
        }

        let delivered = self.coordinator.dispatch(GatewayEvent::MessageReceived {
            channel: ChannelId::from_serenity(msg.channel_id),
            message: MessageId::from_serenity(msg.id),
            author: UserId::from_serenity(msg.author.id),
            content: msg.content,
        });
        if delivered > 0 {
            debug!(delivered, "Message routed to session");
        }
    }

    async fn reaction_add(&self, _ctx: Context, reaction: Reaction) {
        let Some(user) = reaction.user_id else {
            debug!(message = %reaction.message_id, "Ignoring reaction without a user");
            return;
        };
        let Some(emoji) = reaction_emoji(&reaction.emoji) else {
            debug!("Ignoring custom emoji reaction");
            return;
        };

        let delivered = self.coordinator.dispatch(GatewayEvent::ReactionAdded {
            channel: ChannelId::from_serenity(reaction.channel_id),
            message: MessageId::from_serenity(reaction.message_id),
            emoji,
            user: UserId::from_serenity(user),
        });
        if delivered > 0 {
            debug!(delivered, "Reaction routed to session");
        }
    }
}
