//! Roster gathering through reaction opt-in and session channel provisioning.

use crate::{
    Access, AccessGrant, ChannelId, EventFilter, EventHub, GatewayEvent, GuildId, Platform, UserId,
};
use derive_getters::Getters;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use writers_room_error::{SessionError, SessionErrorKind, SessionResult};

/// Reaction users add to the invitation to join.
pub const JOIN_EMOJI: &str = "✋";

/// A request to start a session, as issued by the `start_session` command.
#[derive(Debug, Clone, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct StartRequest {
    /// Guild the session channel is created in
    guild: GuildId,
    /// Channel the command was issued in
    channel: ChannelId,
    /// User who issued the command
    initiator: UserId,
    /// Display name of the initiator, used for the channel name
    initiator_name: String,
    /// Requested roster size, initiator included
    participant_count: usize,
    /// Users mentioned in the command, joined without reacting
    #[builder(default)]
    mentions: Vec<UserId>,
}

impl StartRequest {
    /// Start building a request.
    pub fn builder() -> StartRequestBuilder {
        StartRequestBuilder::default()
    }
}

/// Build the starting roster: the initiator followed by distinct mentions.
///
/// # Errors
///
/// Returns `InvalidParticipantCount` for a count below one and
/// `OversubscribedRoster` when the starting roster exceeds the count.
pub fn initial_roster(
    initiator: UserId,
    mentions: &[UserId],
    participant_count: usize,
) -> SessionResult<Vec<UserId>> {
    if participant_count < 1 {
        return Err(SessionError::new(SessionErrorKind::InvalidParticipantCount(
            participant_count,
        )));
    }

    let mut roster = vec![initiator];
    for user in mentions {
        if !roster.contains(user) {
            roster.push(*user);
        }
    }

    if roster.len() > participant_count {
        return Err(SessionError::new(SessionErrorKind::OversubscribedRoster {
            requested: participant_count,
            mentioned: roster.len(),
        }));
    }
    Ok(roster)
}

/// Channel name for a session started by `initiator_name`.
pub fn channel_name(initiator_name: &str) -> String {
    let slug: String = initiator_name
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "writing-session".to_string()
    } else {
        format!("writing-session-{}", slug)
    }
}

/// Gathers participants and provisions the private session channel.
pub struct FormationController {
    platform: Arc<dyn Platform>,
    hub: EventHub,
    join_timeout: Duration,
}

impl FormationController {
    /// Create a controller waiting `join_timeout` for each joiner.
    pub fn new(platform: Arc<dyn Platform>, hub: EventHub, join_timeout: Duration) -> Self {
        Self {
            platform,
            hub,
            join_timeout,
        }
    }

    /// Collect exactly `participant_count` users.
    ///
    /// Posts an invitation, then accepts one joiner per ✋ reaction from a
    /// user who is neither the bot nor already on the roster. Each wait for
    /// the next joiner is bounded by the join timeout.
    ///
    /// # Errors
    ///
    /// Returns the roster validation errors of [`initial_roster`],
    /// `FormationTimeout` when a wait expires, or `Platform` if the
    /// invitation cannot be posted.
    #[instrument(
        skip(self, request),
        fields(initiator = %request.initiator(), count = *request.participant_count())
    )]
    pub async fn gather(&self, request: &StartRequest) -> SessionResult<Vec<UserId>> {
        let needed = *request.participant_count();
        let mut roster = initial_roster(*request.initiator(), request.mentions(), needed)?;
        let channel = *request.channel();

        let invite = self
            .platform
            .send_message(
                channel,
                &format!(
                    "{} wants to start a collaborative writing session! \
                     React to this message to join. We need {} participants.",
                    self.platform.mention(*request.initiator()),
                    needed
                ),
            )
            .await?;
        debug!(message = %invite, "Invitation posted");

        let mut joins = self.hub.subscribe(EventFilter::ReactionsOn(invite));
        if let Err(e) = self.platform.add_reaction(channel, invite, JOIN_EMOJI).await {
            warn!(error = %e, "Failed to add join reaction");
        }

        let bot = self.platform.bot_user();
        while roster.len() < needed {
            let deadline = Instant::now() + self.join_timeout;
            let joiner = loop {
                match joins.next_until(deadline).await {
                    Some(GatewayEvent::ReactionAdded { emoji, user, .. })
                        if emoji == JOIN_EMOJI && user != bot && !roster.contains(&user) =>
                    {
                        break Some(user);
                    }
                    Some(event) => debug!(?event, "Ignoring reaction"),
                    None => break None,
                }
            };

            let Some(user) = joiner else {
                warn!(joined = roster.len(), needed, "Formation timed out");
                return Err(SessionError::new(SessionErrorKind::FormationTimeout {
                    joined: roster.len(),
                    needed,
                }));
            };

            roster.push(user);
            info!(%user, joined = roster.len(), needed, "Participant joined");
            if let Err(e) = self
                .platform
                .send_message(
                    channel,
                    &format!(
                        "{} has joined the session. {}/{} participants.",
                        self.platform.mention(user),
                        roster.len(),
                        needed
                    ),
                )
                .await
            {
                warn!(error = %e, "Failed to announce joiner");
            }
        }
        drop(joins);

        if let Err(e) = self.platform.clear_reactions(channel, invite).await {
            warn!(error = %e, "Failed to clear invitation reactions");
        }
        Ok(roster)
    }

    /// Create the private channel for a formed roster.
    ///
    /// The general audience is denied, while the bot and every participant
    /// may read and write.
    ///
    /// # Errors
    ///
    /// Returns `Platform` if the channel cannot be created.
    #[instrument(skip(self, request, roster), fields(participants = roster.len()))]
    pub async fn provision(
        &self,
        request: &StartRequest,
        roster: &[UserId],
    ) -> SessionResult<(ChannelId, String)> {
        let mut grants = vec![
            AccessGrant::everyone(Access::NONE),
            AccessGrant::user(self.platform.bot_user(), Access::READ_WRITE),
        ];
        grants.extend(
            roster
                .iter()
                .map(|user| AccessGrant::user(*user, Access::READ_WRITE)),
        );

        let name = channel_name(request.initiator_name());
        let channel = self
            .platform
            .create_channel(*request.guild(), &name, &grants)
            .await?;
        info!(%channel, %name, "Session channel created");
        Ok((channel, name))
    }
}
