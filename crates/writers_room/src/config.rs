//! Bot configuration loaded from TOML.

use crate::ChannelId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use writers_room_error::{ConfigError, ConfigErrorKind};

/// Top-level bot configuration.
///
/// Every field has a default, so an empty file yields a working setup apart
/// from `publication_channel_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WritersRoomConfig {
    /// Prompts offered by the random prompt option
    #[serde(default = "default_prompts")]
    pub prompts: Vec<String>,
    /// Channel finished stories are shared to
    #[serde(default)]
    pub publication_channel_id: u64,
    /// Seconds to wait for each additional participant
    #[serde(default = "default_join_timeout")]
    pub join_timeout_seconds: u64,
    /// Seconds the initiator has to pick a prompt method
    #[serde(default = "default_prompt_timeout")]
    pub prompt_timeout_seconds: u64,
    /// Seconds the initiator has to type a custom prompt
    #[serde(default = "default_prompt_timeout")]
    pub custom_prompt_timeout_seconds: u64,
    /// Seconds a finished session channel lives before deletion
    #[serde(default = "default_cleanup_delay")]
    pub cleanup_delay_seconds: u64,
    /// Recent messages purged after each turn
    #[serde(default = "default_purge_limit")]
    pub purge_limit: u8,
    /// Prefix for in-channel commands
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Channel name that receives the startup announcement
    #[serde(default = "default_ready_channel_name")]
    pub ready_channel_name: String,
}

impl WritersRoomConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, the TOML is invalid, or the
    /// resulting configuration fails [`validate`](Self::validate).
    #[tracing::instrument(skip(path))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(ConfigErrorKind::Read(e.to_string())))?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if the TOML is invalid or fails validation.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::new(ConfigErrorKind::Parse(e.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the session flows rely on.
    ///
    /// # Errors
    ///
    /// Returns error on an empty prompt list, a zero purge limit, a blank
    /// command prefix or a missing publication channel.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prompts.iter().all(|p| p.trim().is_empty()) {
            return Err(ConfigError::new(ConfigErrorKind::NoPrompts));
        }
        if self.purge_limit == 0 {
            return Err(ConfigError::new(ConfigErrorKind::ZeroPurgeLimit));
        }
        if self.command_prefix.trim().is_empty() {
            return Err(ConfigError::new(ConfigErrorKind::BlankCommandPrefix));
        }
        if self.publication_channel_id == 0 {
            return Err(ConfigError::new(ConfigErrorKind::MissingPublicationChannel));
        }
        Ok(())
    }

    /// Channel finished stories are shared to.
    pub fn publication_channel(&self) -> ChannelId {
        ChannelId::new(self.publication_channel_id)
    }

    /// Wait per join cycle during formation.
    pub fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.join_timeout_seconds)
    }

    /// Wait for the prompt method reaction.
    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_secs(self.prompt_timeout_seconds)
    }

    /// Wait for a custom prompt message.
    pub fn custom_prompt_timeout(&self) -> Duration {
        Duration::from_secs(self.custom_prompt_timeout_seconds)
    }

    /// Lifetime of a finished session channel.
    pub fn cleanup_delay(&self) -> Duration {
        Duration::from_secs(self.cleanup_delay_seconds)
    }
}

impl Default for WritersRoomConfig {
    fn default() -> Self {
        Self {
            prompts: default_prompts(),
            publication_channel_id: 0,
            join_timeout_seconds: default_join_timeout(),
            prompt_timeout_seconds: default_prompt_timeout(),
            custom_prompt_timeout_seconds: default_prompt_timeout(),
            cleanup_delay_seconds: default_cleanup_delay(),
            purge_limit: default_purge_limit(),
            command_prefix: default_command_prefix(),
            ready_channel_name: default_ready_channel_name(),
        }
    }
}

fn default_prompts() -> Vec<String> {
    [
        "A mysterious figure in a cloak enters the town.",
        "In a world where magic is common, a rare child born without it.",
        "An ancient map leads to an unexpected treasure.",
        "A time traveler gets stuck in the wrong era.",
        "A scientist discovers a hidden world within our own.",
        "A group of strangers must work together to survive a mysterious island.",
        "A hero is framed for a crime they didn't commit.",
        "A haunted house with a tragic history draws new residents.",
        "A young orphan discovers they have extraordinary powers.",
        "A detective must solve a crime that defies all logic.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_join_timeout() -> u64 {
    3600
}

fn default_prompt_timeout() -> u64 {
    600
}

fn default_cleanup_delay() -> u64 {
    43200
}

fn default_purge_limit() -> u8 {
    100
}

fn default_command_prefix() -> String {
    "!".to_string()
}

fn default_ready_channel_name() -> String {
    "bot-commands".to_string()
}
