//! Prompt selection by the session initiator.

use crate::{ChannelId, EventFilter, EventHub, GatewayEvent, Platform, SharedRng, UserId};
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use writers_room_error::{SessionError, SessionErrorKind, SessionResult};

/// Reaction choosing a random prompt from the configured list.
pub const RANDOM_PROMPT_EMOJI: &str = "1️⃣";

/// Reaction choosing a prompt typed by the initiator.
pub const CUSTOM_PROMPT_EMOJI: &str = "2️⃣";

/// How the initiator wants the prompt chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum PromptMethod {
    /// Uniform pick from the configured prompts
    Random,
    /// Free text from the initiator
    Custom,
}

impl PromptMethod {
    /// Method selected by a reaction emoji.
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        match emoji {
            RANDOM_PROMPT_EMOJI => Some(PromptMethod::Random),
            CUSTOM_PROMPT_EMOJI => Some(PromptMethod::Custom),
            _ => None,
        }
    }

    /// Reaction emoji for the method.
    pub fn emoji(self) -> &'static str {
        match self {
            PromptMethod::Random => RANDOM_PROMPT_EMOJI,
            PromptMethod::Custom => CUSTOM_PROMPT_EMOJI,
        }
    }
}

/// Resolves a session's prompt, accepting input from the initiator only.
pub struct PromptController {
    platform: Arc<dyn Platform>,
    hub: EventHub,
    prompts: Vec<String>,
    choice_timeout: Duration,
    custom_timeout: Duration,
    rng: SharedRng,
}

impl PromptController {
    /// Create a controller drawing random prompts from `prompts`.
    pub fn new(
        platform: Arc<dyn Platform>,
        hub: EventHub,
        prompts: Vec<String>,
        choice_timeout: Duration,
        custom_timeout: Duration,
        rng: SharedRng,
    ) -> Self {
        let prompts = prompts
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect();
        Self {
            platform,
            hub,
            prompts,
            choice_timeout,
            custom_timeout,
            rng,
        }
    }

    /// Ask the initiator for a prompt method and resolve the prompt.
    ///
    /// # Errors
    ///
    /// Returns `PromptSelectionTimeout` if the initiator does not react, or
    /// does not type a custom prompt, in time; `Platform` if the selection
    /// message cannot be posted.
    #[instrument(skip(self))]
    pub async fn select(&self, channel: ChannelId, initiator: UserId) -> SessionResult<String> {
        let menu = self
            .platform
            .send_message(
                channel,
                &format!(
                    "{}, choose a prompt generation method:\n{} Random Prompt\n{} Create Your Own",
                    self.platform.mention(initiator),
                    RANDOM_PROMPT_EMOJI,
                    CUSTOM_PROMPT_EMOJI
                ),
            )
            .await?;

        let mut choices = self.hub.subscribe(EventFilter::ReactionsOn(menu));
        for method in [PromptMethod::Random, PromptMethod::Custom] {
            if let Err(e) = self.platform.add_reaction(channel, menu, method.emoji()).await {
                warn!(error = %e, %method, "Failed to add prompt reaction");
            }
        }

        let deadline = Instant::now() + self.choice_timeout;
        let method = loop {
            match choices.next_until(deadline).await {
                Some(GatewayEvent::ReactionAdded { emoji, user, .. }) if user == initiator => {
                    if let Some(method) = PromptMethod::from_emoji(&emoji) {
                        break method;
                    }
                }
                Some(event) => debug!(?event, "Ignoring reaction from non-initiator"),
                None => {
                    warn!("Prompt method selection timed out");
                    return Err(SessionError::new(SessionErrorKind::PromptSelectionTimeout));
                }
            }
        };
        drop(choices);
        info!(%method, "Prompt method chosen");

        match method {
            PromptMethod::Random => {
                let prompt = self.random_prompt()?;
                if let Err(e) = self
                    .platform
                    .send_message(channel, &format!("Random Prompt Selected: {}", prompt))
                    .await
                {
                    warn!(error = %e, "Failed to announce random prompt");
                }
                Ok(prompt)
            }
            PromptMethod::Custom => self.await_custom_prompt(channel, initiator).await,
        }
    }

    /// Uniform pick from the configured prompts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if no prompts are configured.
    pub fn random_prompt(&self) -> SessionResult<String> {
        let mut rng = self.rng.lock();
        self.prompts.choose(&mut *rng).cloned().ok_or_else(|| {
            SessionError::new(SessionErrorKind::InvalidState(
                "no prompts configured".to_string(),
            ))
        })
    }

    async fn await_custom_prompt(
        &self,
        channel: ChannelId,
        initiator: UserId,
    ) -> SessionResult<String> {
        let mut texts = self.hub.subscribe(EventFilter::MessagesIn(channel));
        if let Err(e) = self
            .platform
            .send_message(channel, "Great, share it in the channel!")
            .await
        {
            warn!(error = %e, "Failed to request custom prompt");
        }

        let deadline = Instant::now() + self.custom_timeout;
        loop {
            match texts.next_until(deadline).await {
                Some(GatewayEvent::MessageReceived {
                    author, content, ..
                }) if author == initiator => {
                    info!(length = content.len(), "Custom prompt received");
                    return Ok(content);
                }
                Some(event) => debug!(?event, "Ignoring message while awaiting custom prompt"),
                None => {
                    warn!("Custom prompt submission timed out");
                    return Err(SessionError::new(SessionErrorKind::PromptSelectionTimeout));
                }
            }
        }
    }
}
