//! Chat platform error types.
//!
//! These cover failures of the gateway adapter: sending messages, changing
//! channel permissions, deleting channels and so on. The session flows log
//! them and carry on; they never roll back in-memory session state.

/// Kinds of platform errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PlatformErrorKind {
    /// Underlying API client error (HTTP, gateway, rate limit)
    #[display("API error: {}", _0)]
    Api(String),
    /// Channel not found by ID
    #[display("Channel not found: {}", _0)]
    ChannelNotFound(u64),
    /// Bot lacks the permissions for an operation
    #[display("Insufficient permissions: {}", _0)]
    InsufficientPermissions(String),
    /// Message failed to send
    #[display("Message send failed: {}", _0)]
    MessageSendFailed(String),
    /// Invalid snowflake or emoji input
    #[display("Invalid input: {}", _0)]
    InvalidInput(String),
}

/// Platform error with location tracking.
///
/// # Examples
///
/// ```
/// use writers_room_error::{PlatformError, PlatformErrorKind};
///
/// let err = PlatformError::new(PlatformErrorKind::ChannelNotFound(7));
/// assert!(format!("{}", err).contains("Channel not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Platform Error: {} at line {} in {}", kind, line, file)]
pub struct PlatformError {
    /// The kind of error that occurred
    pub kind: PlatformErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PlatformError {
    /// Create a new platform error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PlatformErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;
