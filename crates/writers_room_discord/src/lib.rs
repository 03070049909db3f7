//! Discord adapter for Writers Room.
//!
//! [`DiscordPlatform`] implements the session core's [`writers_room::Platform`]
//! over serenity's HTTP client, and [`WritersRoomHandler`] turns gateway
//! events into commands and [`writers_room::GatewayEvent`]s.

#![warn(missing_docs)]

mod commands;
mod conversions;
mod handler;
mod platform;

pub use commands::BotCommand;
pub use conversions::{SerenityId, emoji_reaction, reaction_emoji};
pub use handler::{READY_ANNOUNCEMENT, TEST_REPLY, WritersRoomHandler};
pub use platform::{DISCORD_MAX_MESSAGE_LENGTH, DiscordPlatform, access_permissions, split_message};
