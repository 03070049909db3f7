//! Round-robin writing turns with per-turn access gating.

use crate::{
    Access, ChannelId, EventFilter, EventHub, GatewayEvent, Platform, SessionRegistry, SharedRng,
    Subscription, TurnAdvance, UserId,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use writers_room_error::{SessionError, SessionErrorKind, SessionResult};

/// Drives a session from its first turn to completion.
///
/// Channel permissions decide who *can* post, but every message is also
/// checked against the session's current writer, since permission changes
/// and message delivery are not ordered with respect to each other.
pub struct TurnScheduler {
    platform: Arc<dyn Platform>,
    hub: EventHub,
    registry: SessionRegistry,
    rng: SharedRng,
    purge_limit: u8,
}

impl TurnScheduler {
    /// Create a scheduler purging up to `purge_limit` messages after each turn.
    pub fn new(
        platform: Arc<dyn Platform>,
        hub: EventHub,
        registry: SessionRegistry,
        rng: SharedRng,
        purge_limit: u8,
    ) -> Self {
        Self {
            platform,
            hub,
            registry,
            rng,
            purge_limit,
        }
    }

    /// Shuffle the roster and run every turn.
    ///
    /// Returns once the last participant has written.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSession` if the session disappears mid-story, or
    /// `InvalidState` if the session was not ready for writing.
    #[instrument(skip(self))]
    pub async fn run(&self, channel: ChannelId) -> SessionResult<()> {
        let mut messages = self.hub.subscribe(EventFilter::MessagesIn(channel));
        let rng = &self.rng;
        let mut turn = self
            .registry
            .update(channel, |session| session.begin_writing(&mut *rng.lock()))
            .await?;

        let mut turns_taken = 0usize;
        while let TurnAdvance::Writer(writer) = turn {
            self.open_turn(channel, writer, &mut messages).await?;
            turn = self.await_contribution(channel, writer, &mut messages).await?;
            self.close_turn(channel, writer).await;
            turns_taken += 1;
        }

        info!(turns = turns_taken, "All turns taken");
        Ok(())
    }

    /// Hand the pen to `writer`: everyone else loses access first, then the
    /// session accepts the writer's text, then the writer is granted read
    /// and write and shown the instructions.
    #[instrument(skip(self, messages))]
    async fn open_turn(
        &self,
        channel: ChannelId,
        writer: UserId,
        messages: &mut Subscription,
    ) -> SessionResult<()> {
        let dropped = messages.drain();
        if dropped > 0 {
            debug!(dropped, "Discarded messages posted between turns");
        }

        let session = self.registry.get(channel).await.ok_or_else(|| {
            SessionError::new(SessionErrorKind::UnknownSession(channel.get()))
        })?;

        for participant in session.participants().iter().filter(|p| **p != writer) {
            self.apply_access(channel, *participant, Access::NONE).await;
        }
        self.registry
            .update(channel, |session| session.start_turn())
            .await?;
        self.apply_access(channel, writer, Access::READ_WRITE).await;

        let instructions = session.instructions().unwrap_or_default();
        if let Err(e) = self
            .platform
            .send_message(
                channel,
                &format!(
                    "{}, it's your turn to contribute to the story! Here is the prompt:\n{}",
                    self.platform.mention(writer),
                    instructions
                ),
            )
            .await
        {
            warn!(error = %e, "Failed to announce turn");
        }
        info!(turn = session.contributions().len() + 1, "Turn opened");
        Ok(())
    }

    async fn await_contribution(
        &self,
        channel: ChannelId,
        writer: UserId,
        messages: &mut Subscription,
    ) -> SessionResult<TurnAdvance> {
        loop {
            let Some(event) = messages.next().await else {
                return Err(SessionError::new(SessionErrorKind::InvalidState(
                    "event hub closed".to_string(),
                )));
            };
            match event {
                GatewayEvent::MessageReceived {
                    author, content, ..
                } if author == writer => {
                    let next = self
                        .registry
                        .update(channel, |session| {
                            session.record_contribution(author, content)
                        })
                        .await?;
                    info!(%writer, "Contribution recorded");
                    return Ok(next);
                }
                GatewayEvent::MessageReceived { author, .. } => {
                    debug!(%author, "Ignoring message from someone other than the writer");
                }
                GatewayEvent::ReactionAdded { .. } => {}
            }
        }
    }

    /// Revoke the finished writer and clear the channel for the next one.
    async fn close_turn(&self, channel: ChannelId, writer: UserId) {
        self.apply_access(channel, writer, Access::NONE).await;
        match self.platform.purge_recent(channel, self.purge_limit).await {
            Ok(purged) => debug!(purged, "Purged channel after turn"),
            Err(e) => warn!(error = %e, "Failed to purge channel"),
        }
    }

    async fn apply_access(&self, channel: ChannelId, user: UserId, access: Access) {
        if let Err(e) = self.platform.set_access(channel, user, access).await {
            warn!(error = %e, %user, ?access, "Failed to update channel access");
        }
    }
}
