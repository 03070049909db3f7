//! Story finalization, publication and channel cleanup.

use crate::{Access, ChannelId, Platform, Session, SessionRegistry, SessionTasks, UserId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use writers_room_error::{SessionError, SessionErrorKind, SessionResult};

/// Human-readable form of a cleanup delay, e.g. `12 hours`.
pub fn format_delay(delay: Duration) -> String {
    let secs = delay.as_secs();
    let (amount, unit) = if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if amount == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", amount, unit)
    }
}

/// Announces finished stories and owns the end of a session's life.
pub struct Finalizer {
    platform: Arc<dyn Platform>,
    registry: SessionRegistry,
    tasks: SessionTasks,
    publication_channel: ChannelId,
    cleanup_delay: Duration,
    command_prefix: String,
}

impl Finalizer {
    /// Create a finalizer publishing to `publication_channel`.
    pub fn new(
        platform: Arc<dyn Platform>,
        registry: SessionRegistry,
        tasks: SessionTasks,
        publication_channel: ChannelId,
        cleanup_delay: Duration,
        command_prefix: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            registry,
            tasks,
            publication_channel,
            cleanup_delay,
            command_prefix: command_prefix.into(),
        }
    }

    /// Restore everyone's access and announce the finished story.
    ///
    /// Returns the assembled story text.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSession` if the session is gone or `StoryNotReady` if
    /// turns remain.
    #[instrument(skip(self))]
    pub async fn finalize(&self, channel: ChannelId) -> SessionResult<String> {
        let session = self.session(channel).await?;
        let story = session
            .final_text()
            .ok_or_else(|| SessionError::new(SessionErrorKind::StoryNotReady))?;

        self.say(channel, "The story is complete!").await;
        for participant in session.participants() {
            if let Err(e) = self
                .platform
                .set_access(channel, *participant, Access::READ_WRITE)
                .await
            {
                warn!(error = %e, user = %participant, "Failed to restore access");
            }
        }

        self.say(channel, &format!("Here's the final story:\n{}", story))
            .await;
        self.say(
            channel,
            &format!(
                "This channel will be deleted in {}. {}, you can share the story by using the \
                 command `{prefix}share` within this channel. To delete the channel immediately, \
                 use `{prefix}delete`.",
                format_delay(self.cleanup_delay),
                self.platform.mention(*session.initiator()),
                prefix = self.command_prefix,
            ),
        )
        .await;

        info!(
            contributions = session.contributions().len(),
            "Story finalized"
        );
        Ok(story)
    }

    /// Post the finished story to the publication channel.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSession` outside a session channel,
    /// `UnauthorizedAction` for anyone but the initiator, `StoryNotReady`
    /// before the last turn, and `ChannelResolutionFailure` if the
    /// publication channel does not exist.
    #[instrument(skip(self))]
    pub async fn share(&self, channel: ChannelId, actor: UserId) -> SessionResult<()> {
        let session = self.session(channel).await?;
        if actor != *session.initiator() {
            warn!(%actor, "Non-initiator tried to share");
            return Err(SessionError::new(SessionErrorKind::UnauthorizedAction(
                "Only the session initiator can share the story.".to_string(),
            )));
        }
        let story = session
            .final_text()
            .ok_or_else(|| SessionError::new(SessionErrorKind::StoryNotReady))?;

        let target = self
            .platform
            .resolve_channel(self.publication_channel)
            .await?
            .ok_or_else(|| {
                SessionError::new(SessionErrorKind::ChannelResolutionFailure(
                    self.publication_channel.get(),
                ))
            })?;

        self.platform
            .send_message(
                target,
                &format!("Story from {}:\n{}", session.name(), story),
            )
            .await?;
        self.say(
            channel,
            &format!(
                "The story has been shared to {}!",
                self.platform.channel_mention(target)
            ),
        )
        .await;
        info!(%target, "Story shared");
        Ok(())
    }

    /// Delete the session channel immediately.
    ///
    /// The session's flow is aborted and its registry entry removed before
    /// the channel is deleted, so neither a pending auto-cleanup nor a turn
    /// still in flight touches the channel afterwards.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSession` outside a session channel,
    /// `UnauthorizedAction` for anyone but the initiator, and `Platform` if
    /// the channel deletion fails after the session was removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, channel: ChannelId, actor: UserId) -> SessionResult<()> {
        let session = self.session(channel).await?;
        if actor != *session.initiator() {
            warn!(%actor, "Non-initiator tried to delete");
            return Err(SessionError::new(SessionErrorKind::UnauthorizedAction(
                "Only the session initiator can delete the channel.".to_string(),
            )));
        }

        self.tasks.cancel(channel).await;
        if self.registry.remove(channel).await.is_none() {
            return Err(SessionError::new(SessionErrorKind::UnknownSession(
                channel.get(),
            )));
        }
        self.platform.delete_channel(channel).await?;
        info!("Session deleted on request");
        Ok(())
    }

    /// Wait out the cleanup delay, then remove the session and its channel.
    ///
    /// Does nothing if the session was already removed.
    #[instrument(skip(self))]
    pub async fn expire_after_delay(&self, channel: ChannelId) {
        debug!(delay = ?self.cleanup_delay, "Scheduling session cleanup");
        tokio::time::sleep(self.cleanup_delay).await;

        if self.registry.remove(channel).await.is_none() {
            debug!("Session already removed, skipping cleanup");
            return;
        }
        match self.platform.delete_channel(channel).await {
            Ok(()) => info!("Session expired and channel deleted"),
            Err(e) => warn!(error = %e, "Failed to delete expired session channel"),
        }
    }

    async fn session(&self, channel: ChannelId) -> SessionResult<Session> {
        self.registry
            .get(channel)
            .await
            .ok_or_else(|| SessionError::new(SessionErrorKind::UnknownSession(channel.get())))
    }

    async fn say(&self, channel: ChannelId, text: &str) {
        if let Err(e) = self.platform.send_message(channel, text).await {
            warn!(error = %e, "Failed to send message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_use_the_largest_whole_unit() {
        assert_eq!(format_delay(Duration::from_secs(43200)), "12 hours");
        assert_eq!(format_delay(Duration::from_secs(3600)), "1 hour");
        assert_eq!(format_delay(Duration::from_secs(90 * 60)), "90 minutes");
        assert_eq!(format_delay(Duration::from_secs(45)), "45 seconds");
    }
}
