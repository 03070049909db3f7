//! Error types for the Writers Room bot.
//!
//! Every error carries the source location where it was raised, captured with
//! `#[track_caller]`, so log lines point at the failing call site.

#![warn(missing_docs)]

mod config;
mod platform;
mod session;

pub use config::{ConfigError, ConfigErrorKind};
pub use platform::{PlatformError, PlatformErrorKind, PlatformResult};
pub use session::{SessionError, SessionErrorKind, SessionResult};

/// Crate-level error variants.
#[derive(Debug, derive_more::From, derive_more::Display)]
pub enum WritersRoomErrorKind {
    /// Configuration error
    #[display("{}", _0)]
    Config(ConfigError),
    /// Chat platform I/O error
    #[display("{}", _0)]
    Platform(PlatformError),
    /// Session lifecycle error
    #[display("{}", _0)]
    Session(SessionError),
}

/// Writers Room error with kind discrimination.
#[derive(Debug)]
pub struct WritersRoomError(Box<WritersRoomErrorKind>);

impl WritersRoomError {
    /// Create a new error from a kind.
    pub fn new(kind: WritersRoomErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &WritersRoomErrorKind {
        &self.0
    }
}

impl std::fmt::Display for WritersRoomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Writers Room Error: {}", self.0)
    }
}

impl std::error::Error for WritersRoomError {}

impl<T> From<T> for WritersRoomError
where
    T: Into<WritersRoomErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Writers Room operations.
pub type WritersRoomResult<T> = std::result::Result<T, WritersRoomError>;
