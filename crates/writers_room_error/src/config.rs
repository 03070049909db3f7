//! Configuration error types.

/// Ways a configuration can be unusable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ConfigErrorKind {
    /// The configuration file could not be read
    #[display("Failed to read config file: {}", _0)]
    Read(String),
    /// The file is not valid TOML or does not match the schema
    #[display("Failed to parse config: {}", _0)]
    Parse(String),
    /// Every configured prompt is blank
    #[display("prompts must contain at least one prompt")]
    NoPrompts,
    /// `purge_limit` is zero
    #[display("purge_limit must be at least 1")]
    ZeroPurgeLimit,
    /// `command_prefix` is blank
    #[display("command_prefix cannot be empty")]
    BlankCommandPrefix,
    /// `publication_channel_id` is unset
    #[display("publication_channel_id must be set")]
    MissingPublicationChannel,
    /// No bot token was given on the command line or in the environment
    #[display("{} not provided", _0)]
    MissingToken(String),
}

/// Configuration error with source location.
///
/// # Examples
///
/// ```
/// use writers_room_error::{ConfigError, ConfigErrorKind};
///
/// let err = ConfigError::new(ConfigErrorKind::NoPrompts);
/// assert!(err.to_string().contains("at least one prompt"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", kind, line, file)]
pub struct ConfigError {
    /// What is wrong with the configuration
    pub kind: ConfigErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new configuration error at the current location.
    #[track_caller]
    pub fn new(kind: ConfigErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
