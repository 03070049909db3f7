//! Turn-based collaborative storytelling sessions for chat platforms.
//!
//! A session moves through four controllers, each waiting on gateway events
//! routed to it by channel or message identity:
//!
//! - [`FormationController`] gathers a roster through reaction opt-in
//! - [`PromptController`] resolves the prompt from the initiator
//! - [`TurnScheduler`] rotates a single writer through the shuffled roster
//! - [`Finalizer`] assembles, announces, publishes and expires the story
//!
//! The [`Coordinator`] is the composition root. It owns the
//! [`SessionRegistry`], the [`EventHub`] and the per-session flow tasks, and
//! exposes the command surface (`start_session`, `share`, `delete`).
//!
//! The chat platform itself is abstracted behind the [`Platform`] trait; the
//! Discord implementation lives in the `writers_room_discord` crate.

#![warn(missing_docs)]

mod config;
mod coordinator;
mod events;
mod finalize;
mod formation;
mod ids;
mod platform;
mod prompt;
mod registry;
mod scheduler;
mod session;
mod tasks;

pub use config::WritersRoomConfig;
pub use coordinator::{Coordinator, describe_error};
pub use events::{EventFilter, EventHub, GatewayEvent, Subscription};
pub use finalize::{Finalizer, format_delay};
pub use formation::{
    FormationController, JOIN_EMOJI, StartRequest, StartRequestBuilder, channel_name,
    initial_roster,
};
pub use ids::{ChannelId, GuildId, MessageId, UserId};
pub use platform::{Access, AccessGrant, AccessTarget, Platform};
pub use prompt::{CUSTOM_PROMPT_EMOJI, PromptController, PromptMethod, RANDOM_PROMPT_EMOJI};
pub use registry::SessionRegistry;
pub use scheduler::TurnScheduler;
pub use session::{Session, SessionPhase, TurnAdvance};
pub use tasks::SessionTasks;

/// Random source shared by prompt selection and turn shuffling.
pub type SharedRng = std::sync::Arc<parking_lot::Mutex<rand::rngs::StdRng>>;

pub use writers_room_error::{
    ConfigError, ConfigErrorKind, PlatformError, PlatformErrorKind, PlatformResult, SessionError,
    SessionErrorKind, SessionResult, WritersRoomError, WritersRoomErrorKind, WritersRoomResult,
};
