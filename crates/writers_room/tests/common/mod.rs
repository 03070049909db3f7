//! In-memory platform for driving session flows in tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use writers_room::{
    Access, AccessGrant, ChannelId, Coordinator, GatewayEvent, GuildId, MessageId, Platform,
    PlatformError, PlatformErrorKind, PlatformResult, StartRequest, UserId, WritersRoomConfig,
};

pub const BOT: UserId = UserId::new(999);
pub const ALICE: UserId = UserId::new(1);
pub const BOB: UserId = UserId::new(2);
pub const CAROL: UserId = UserId::new(3);
pub const GUILD: GuildId = GuildId::new(50);
pub const LOBBY: ChannelId = ChannelId::new(60);
pub const PUBLISHED: ChannelId = ChannelId::new(70);

/// A platform call recorded by [`MockPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Send {
        channel: ChannelId,
        message: MessageId,
        text: String,
    },
    React {
        channel: ChannelId,
        message: MessageId,
        emoji: String,
    },
    ClearReactions {
        channel: ChannelId,
        message: MessageId,
    },
    CreateChannel {
        channel: ChannelId,
        name: String,
        grants: Vec<AccessGrant>,
    },
    SetAccess {
        channel: ChannelId,
        user: UserId,
        access: Access,
    },
    DeleteChannel(ChannelId),
    Purge {
        channel: ChannelId,
        limit: u8,
    },
}

#[derive(Debug, Default)]
struct MockState {
    ops: Vec<Op>,
    next_id: u64,
    access: HashMap<(ChannelId, UserId), Access>,
    channels: HashSet<ChannelId>,
}

/// Records every call and answers with fresh identifiers.
pub struct MockPlatform {
    state: Mutex<MockState>,
    changes: watch::Sender<usize>,
}

impl MockPlatform {
    pub fn new() -> Arc<Self> {
        let mut state = MockState {
            next_id: 1000,
            ..MockState::default()
        };
        state.channels.insert(LOBBY);
        state.channels.insert(PUBLISHED);
        let (changes, _) = watch::channel(0);
        Arc::new(Self {
            state: Mutex::new(state),
            changes,
        })
    }

    /// Make the publication channel unresolvable.
    pub fn forget_channel(&self, channel: ChannelId) {
        self.state.lock().channels.remove(&channel);
    }

    fn record(&self, op: Op) {
        let count = {
            let mut state = self.state.lock();
            state.ops.push(op);
            state.ops.len()
        };
        self.changes.send_replace(count);
    }

    fn next_id(&self) -> u64 {
        let mut state = self.state.lock();
        state.next_id += 1;
        state.next_id
    }

    pub fn ops(&self) -> Vec<Op> {
        self.state.lock().ops.clone()
    }

    pub fn texts_in(&self, channel: ChannelId) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Send {
                    channel: c, text, ..
                } if c == channel => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn created_channels(&self) -> Vec<(ChannelId, String, Vec<AccessGrant>)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::CreateChannel {
                    channel,
                    name,
                    grants,
                } => Some((channel, name, grants)),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_channels(&self) -> Vec<ChannelId> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::DeleteChannel(channel) => Some(channel),
                _ => None,
            })
            .collect()
    }

    pub fn access(&self, channel: ChannelId, user: UserId) -> Option<Access> {
        self.state.lock().access.get(&(channel, user)).copied()
    }

    /// Users among `users` currently allowed to post in `channel`.
    pub fn writers(&self, channel: ChannelId, users: &[UserId]) -> Vec<UserId> {
        users
            .iter()
            .copied()
            .filter(|u| self.access(channel, *u).is_some_and(|a| a.write))
            .collect()
    }

    /// Wait until `check` finds something in the recorded calls.
    pub async fn wait_for<T>(&self, check: impl Fn(&[Op]) -> Option<T>) -> T {
        let mut rx = self.changes.subscribe();
        loop {
            if let Some(found) = check(&self.state.lock().ops) {
                return found;
            }
            rx.changed().await.expect("mock platform dropped");
        }
    }

    /// Wait until `emoji` was added to some message in `channel`.
    pub async fn wait_for_reaction(&self, channel: ChannelId, emoji: &str) -> MessageId {
        self.wait_for(|ops| {
            ops.iter().find_map(|op| match op {
                Op::React {
                    channel: c,
                    message,
                    emoji: e,
                } if *c == channel && e == emoji => Some(*message),
                _ => None,
            })
        })
        .await
    }

    /// Wait until `n` messages containing `needle` were sent to `channel`.
    pub async fn wait_for_text(&self, channel: ChannelId, needle: &str, n: usize) -> String {
        self.wait_for(|ops| {
            ops.iter()
                .filter_map(|op| match op {
                    Op::Send {
                        channel: c, text, ..
                    } if *c == channel && text.contains(needle) => Some(text.clone()),
                    _ => None,
                })
                .nth(n - 1)
        })
        .await
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn bot_user(&self) -> UserId {
        BOT
    }

    async fn send_message(&self, channel: ChannelId, text: &str) -> PlatformResult<MessageId> {
        if !self.state.lock().channels.contains(&channel) {
            return Err(PlatformError::new(PlatformErrorKind::ChannelNotFound(
                channel.get(),
            )));
        }
        let message = MessageId::new(self.next_id());
        self.record(Op::Send {
            channel,
            message,
            text: text.to_string(),
        });
        Ok(message)
    }

    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> PlatformResult<()> {
        self.record(Op::React {
            channel,
            message,
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn clear_reactions(&self, channel: ChannelId, message: MessageId) -> PlatformResult<()> {
        self.record(Op::ClearReactions { channel, message });
        Ok(())
    }

    async fn create_channel(
        &self,
        _guild: GuildId,
        name: &str,
        grants: &[AccessGrant],
    ) -> PlatformResult<ChannelId> {
        let channel = ChannelId::new(self.next_id());
        {
            let mut state = self.state.lock();
            state.channels.insert(channel);
            for grant in grants {
                if let writers_room::AccessTarget::User(user) = grant.target {
                    state.access.insert((channel, user), grant.access);
                }
            }
        }
        self.record(Op::CreateChannel {
            channel,
            name: name.to_string(),
            grants: grants.to_vec(),
        });
        Ok(channel)
    }

    async fn set_access(
        &self,
        channel: ChannelId,
        user: UserId,
        access: Access,
    ) -> PlatformResult<()> {
        self.state.lock().access.insert((channel, user), access);
        self.record(Op::SetAccess {
            channel,
            user,
            access,
        });
        Ok(())
    }

    async fn delete_channel(&self, channel: ChannelId) -> PlatformResult<()> {
        let existed = self.state.lock().channels.remove(&channel);
        self.record(Op::DeleteChannel(channel));
        if existed {
            Ok(())
        } else {
            Err(PlatformError::new(PlatformErrorKind::ChannelNotFound(
                channel.get(),
            )))
        }
    }

    async fn purge_recent(&self, channel: ChannelId, limit: u8) -> PlatformResult<usize> {
        self.record(Op::Purge { channel, limit });
        Ok(0)
    }

    async fn resolve_channel(&self, channel: ChannelId) -> PlatformResult<Option<ChannelId>> {
        Ok(self
            .state
            .lock()
            .channels
            .contains(&channel)
            .then_some(channel))
    }
}

pub fn config() -> WritersRoomConfig {
    WritersRoomConfig {
        publication_channel_id: PUBLISHED.get(),
        ..WritersRoomConfig::default()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

pub fn coordinator(platform: &Arc<MockPlatform>, seed: u64) -> Coordinator {
    init_tracing();
    let platform: Arc<dyn Platform> = platform.clone();
    Coordinator::with_rng(platform, config(), StdRng::seed_from_u64(seed))
}

pub fn request(count: usize, mentions: Vec<UserId>) -> StartRequest {
    StartRequest::builder()
        .guild(GUILD)
        .channel(LOBBY)
        .initiator(ALICE)
        .initiator_name("Alice")
        .participant_count(count)
        .mentions(mentions)
        .build()
        .expect("complete request")
}

pub fn reaction(channel: ChannelId, message: MessageId, emoji: &str, user: UserId) -> GatewayEvent {
    GatewayEvent::ReactionAdded {
        channel,
        message,
        emoji: emoji.to_string(),
        user,
    }
}

pub fn text(channel: ChannelId, author: UserId, content: &str) -> GatewayEvent {
    GatewayEvent::MessageReceived {
        channel,
        message: MessageId::new(1),
        author,
        content: content.to_string(),
    }
}

/// Form a two-person session of Alice and Bob, returning its channel.
pub async fn form_pair(platform: &Arc<MockPlatform>, coordinator: &Coordinator) -> ChannelId {
    let starter = coordinator.clone();
    let formation = tokio::spawn(async move { starter.start_session(request(2, vec![])).await });

    let invite = platform
        .wait_for_reaction(LOBBY, writers_room::JOIN_EMOJI)
        .await;
    coordinator.dispatch(reaction(LOBBY, invite, writers_room::JOIN_EMOJI, BOB));

    formation
        .await
        .expect("formation task")
        .expect("session formed")
}

/// Answer the prompt menu in `channel` with a random prompt, returning it.
pub async fn choose_random_prompt(
    platform: &Arc<MockPlatform>,
    coordinator: &Coordinator,
    channel: ChannelId,
) -> String {
    let menu = platform
        .wait_for_reaction(channel, writers_room::CUSTOM_PROMPT_EMOJI)
        .await;
    coordinator.dispatch(reaction(
        channel,
        menu,
        writers_room::RANDOM_PROMPT_EMOJI,
        ALICE,
    ));
    let announced = platform
        .wait_for_text(channel, "Random Prompt Selected: ", 1)
        .await;
    announced
        .trim_start_matches("Random Prompt Selected: ")
        .to_string()
}

/// Wait for the `turn`th announcement and return whoever holds the pen.
pub async fn wait_for_turn(
    platform: &Arc<MockPlatform>,
    coordinator: &Coordinator,
    channel: ChannelId,
    turn: usize,
) -> UserId {
    platform
        .wait_for_text(channel, "it's your turn to contribute", turn)
        .await;
    coordinator
        .registry()
        .get(channel)
        .await
        .and_then(|session| session.current_writer())
        .expect("a writer holds the turn")
}

/// Let spawned flows run until the session in `channel` reaches `phase`.
pub async fn wait_for_phase(
    coordinator: &Coordinator,
    channel: ChannelId,
    phase: writers_room::SessionPhase,
) -> writers_room::Session {
    for _ in 0..100 {
        if let Some(session) = coordinator.registry().get(channel).await
            && *session.phase() == phase
        {
            return session;
        }
        tokio::task::yield_now().await;
    }
    panic!("session in {} never reached {}", channel, phase);
}
