//! Composition root wiring the controllers to shared session state.

use crate::{
    ChannelId, EventHub, Finalizer, FormationController, GatewayEvent, Platform, PromptController,
    Session, SessionRegistry, SessionTasks, SharedRng, StartRequest, TurnScheduler, UserId,
    WritersRoomConfig,
};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use writers_room_error::{SessionError, SessionErrorKind, SessionResult};

/// User-facing text for a session error.
pub fn describe_error(kind: &SessionErrorKind) -> String {
    match kind {
        SessionErrorKind::InvalidParticipantCount(_) => {
            "Please provide a valid number of participants.".to_string()
        }
        SessionErrorKind::OversubscribedRoster { requested, .. } => format!(
            "Too many participants mentioned. Maximum required: {}.",
            requested
        ),
        SessionErrorKind::FormationTimeout { .. } => {
            "Session start timed out. Not enough participants.".to_string()
        }
        SessionErrorKind::PromptSelectionTimeout => "Prompt selection timed out.".to_string(),
        SessionErrorKind::UnauthorizedAction(reason) => reason.clone(),
        SessionErrorKind::ChannelResolutionFailure(_) => {
            "Published-stories channel not found. Please create one.".to_string()
        }
        SessionErrorKind::UnknownSession(_) => {
            "This command can only be used in an active writing session channel.".to_string()
        }
        SessionErrorKind::StoryNotReady => {
            "The story isn't finished yet. Share it once the last turn is in.".to_string()
        }
        other => format!("Something went wrong: {}", other),
    }
}

struct CoordinatorInner {
    platform: Arc<dyn Platform>,
    config: WritersRoomConfig,
    registry: SessionRegistry,
    hub: EventHub,
    tasks: SessionTasks,
    formation: FormationController,
    prompts: PromptController,
    scheduler: TurnScheduler,
    finalizer: Finalizer,
}

/// Entry point for commands and gateway events.
///
/// Cheap to clone; every clone drives the same registry and event hub.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

impl Coordinator {
    /// Create a coordinator with an entropy-seeded random source.
    pub fn new(platform: Arc<dyn Platform>, config: WritersRoomConfig) -> Self {
        Self::with_rng(platform, config, StdRng::from_entropy())
    }

    /// Create a coordinator with an explicit random source.
    pub fn with_rng(platform: Arc<dyn Platform>, config: WritersRoomConfig, rng: StdRng) -> Self {
        let rng: SharedRng = Arc::new(Mutex::new(rng));
        let registry = SessionRegistry::new();
        let hub = EventHub::new();
        let tasks = SessionTasks::new();

        let formation =
            FormationController::new(Arc::clone(&platform), hub.clone(), config.join_timeout());
        let prompts = PromptController::new(
            Arc::clone(&platform),
            hub.clone(),
            config.prompts.clone(),
            config.prompt_timeout(),
            config.custom_prompt_timeout(),
            Arc::clone(&rng),
        );
        let scheduler = TurnScheduler::new(
            Arc::clone(&platform),
            hub.clone(),
            registry.clone(),
            rng,
            config.purge_limit,
        );
        let finalizer = Finalizer::new(
            Arc::clone(&platform),
            registry.clone(),
            tasks.clone(),
            config.publication_channel(),
            config.cleanup_delay(),
            config.command_prefix.clone(),
        );

        Self {
            inner: Arc::new(CoordinatorInner {
                platform,
                config,
                registry,
                hub,
                tasks,
                formation,
                prompts,
                scheduler,
                finalizer,
            }),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &WritersRoomConfig {
        &self.inner.config
    }

    /// Session store.
    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    /// Running session flows.
    pub fn tasks(&self) -> &SessionTasks {
        &self.inner.tasks
    }

    /// Feed a gateway event to whichever flow is waiting on it.
    ///
    /// Events caused by the bot itself are dropped. Returns how many waiting
    /// flows received the event.
    pub fn dispatch(&self, event: GatewayEvent) -> usize {
        if event.actor() == self.inner.platform.bot_user() {
            return 0;
        }
        self.inner.hub.dispatch(event)
    }

    /// Run formation and, on success, spawn the session's flow.
    ///
    /// Waits for the roster to fill, so callers on the gateway path should
    /// spawn this. Errors are reported in the command channel before being
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns the formation errors (`InvalidParticipantCount`,
    /// `OversubscribedRoster`, `FormationTimeout`) or `Platform` if the
    /// session channel could not be created.
    #[instrument(
        skip(self, request),
        fields(initiator = %request.initiator(), count = *request.participant_count())
    )]
    pub async fn start_session(&self, request: StartRequest) -> SessionResult<ChannelId> {
        self.say(
            *request.channel(),
            &format!(
                "start_session called by {} with {} participants.",
                request.initiator_name(),
                request.participant_count()
            ),
        )
        .await;

        match self.form_session(&request).await {
            Ok(channel) => Ok(channel),
            Err(e) => {
                self.report(*request.channel(), &e).await;
                Err(e)
            }
        }
    }

    /// Share the finished story of the session in `channel`.
    ///
    /// # Errors
    ///
    /// See [`Finalizer::share`]; errors are also reported in `channel`.
    pub async fn share(&self, channel: ChannelId, actor: UserId) -> SessionResult<()> {
        let result = self.inner.finalizer.share(channel, actor).await;
        if let Err(e) = &result {
            self.report(channel, e).await;
        }
        result
    }

    /// Delete the session in `channel` right away.
    ///
    /// # Errors
    ///
    /// See [`Finalizer::delete`]; rejections are also reported in `channel`.
    pub async fn delete(&self, channel: ChannelId, actor: UserId) -> SessionResult<()> {
        let result = self.inner.finalizer.delete(channel, actor).await;
        if let Err(e) = &result {
            if !matches!(e.kind, SessionErrorKind::Platform(_)) {
                self.report(channel, e).await;
            } else {
                error!(error = %e, "Session removed but channel deletion failed");
            }
        }
        result
    }

    async fn form_session(&self, request: &StartRequest) -> SessionResult<ChannelId> {
        let roster = self.inner.formation.gather(request).await?;
        let (channel, name) = self.inner.formation.provision(request, &roster).await?;
        let initiator = *request.initiator();

        self.inner
            .registry
            .insert(Session::new(channel, name, initiator, roster))
            .await?;

        let this = self.clone();
        self.inner
            .tasks
            .spawn(channel, async move { this.run_session(channel, initiator).await })
            .await;
        info!(%channel, "Session formed");
        Ok(channel)
    }

    /// Prompt, turns, finalization, then the cleanup wait.
    #[instrument(skip(self))]
    async fn run_session(&self, channel: ChannelId, initiator: UserId) {
        match self.write_story(channel, initiator).await {
            Ok(story) => debug!(length = story.len(), "Story written"),
            Err(e) if matches!(e.kind, SessionErrorKind::UnknownSession(_)) => {
                debug!(error = %e, "Session removed while its flow was running");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Session flow stopped early");
                self.report(channel, &e).await;
                let abandoned = self
                    .inner
                    .registry
                    .update(channel, |session| {
                        session.abandon();
                        Ok(())
                    })
                    .await;
                if abandoned.is_err() {
                    return;
                }
            }
        }
        self.inner.finalizer.expire_after_delay(channel).await;
    }

    async fn write_story(&self, channel: ChannelId, initiator: UserId) -> SessionResult<String> {
        let prompt = self.inner.prompts.select(channel, initiator).await?;
        self.inner
            .registry
            .update(channel, |session| session.set_prompt(prompt))
            .await?;
        self.inner.scheduler.run(channel).await?;
        self.inner.finalizer.finalize(channel).await
    }

    async fn report(&self, channel: ChannelId, err: &SessionError) {
        warn!(%channel, error = %err, "Reporting session error");
        self.say(channel, &describe_error(&err.kind)).await;
    }

    async fn say(&self, channel: ChannelId, text: &str) {
        if let Err(e) = self.inner.platform.send_message(channel, text).await {
            warn!(error = %e, "Failed to send message");
        }
    }
}
