//! Session lifecycle error types.

use crate::PlatformError;

/// Specific error conditions for session operations.
///
/// Every variant is recoverable: the coordinator reports it in the channel
/// where the triggering command or event happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionErrorKind {
    /// Participant count below one
    InvalidParticipantCount(usize),
    /// More users mentioned than the requested number of slots
    OversubscribedRoster {
        /// Requested roster size
        requested: usize,
        /// Initiator plus distinct mentions
        mentioned: usize,
    },
    /// Not enough users joined before the join timeout elapsed
    FormationTimeout {
        /// Users in the roster when the wait expired
        joined: usize,
        /// Requested roster size
        needed: usize,
    },
    /// Initiator did not choose or submit a prompt in time
    PromptSelectionTimeout,
    /// Actor is not allowed to perform the action
    UnauthorizedAction(String),
    /// Publication channel could not be resolved
    ChannelResolutionFailure(u64),
    /// No active session is bound to the channel
    UnknownSession(u64),
    /// The story has not been finalized yet
    StoryNotReady,
    /// Prompt was already chosen for this session
    PromptAlreadySet,
    /// Operation does not fit the session's current phase
    InvalidState(String),
    /// Platform operation failed while serving the action
    Platform(String),
}

impl std::fmt::Display for SessionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionErrorKind::InvalidParticipantCount(count) => {
                write!(f, "Invalid participant count: {}", count)
            }
            SessionErrorKind::OversubscribedRoster {
                requested,
                mentioned,
            } => write!(
                f,
                "Too many participants mentioned: {} for {} slots",
                mentioned, requested
            ),
            SessionErrorKind::FormationTimeout { joined, needed } => write!(
                f,
                "Session start timed out with {}/{} participants",
                joined, needed
            ),
            SessionErrorKind::PromptSelectionTimeout => write!(f, "Prompt selection timed out"),
            SessionErrorKind::UnauthorizedAction(msg) => write!(f, "Unauthorized action: {}", msg),
            SessionErrorKind::ChannelResolutionFailure(id) => {
                write!(f, "Publication channel not found: {}", id)
            }
            SessionErrorKind::UnknownSession(id) => {
                write!(f, "No active writing session in channel {}", id)
            }
            SessionErrorKind::StoryNotReady => write!(f, "The story is not finished yet"),
            SessionErrorKind::PromptAlreadySet => write!(f, "Prompt was already chosen"),
            SessionErrorKind::InvalidState(msg) => write!(f, "Invalid session state: {}", msg),
            SessionErrorKind::Platform(msg) => write!(f, "Platform failure: {}", msg),
        }
    }
}

/// Error type for session operations.
///
/// # Examples
///
/// ```
/// use writers_room_error::{SessionError, SessionErrorKind};
///
/// let err = SessionError::new(SessionErrorKind::PromptSelectionTimeout);
/// assert!(format!("{}", err).contains("timed out"));
/// ```
#[derive(Debug, Clone)]
pub struct SessionError {
    /// The specific error condition
    pub kind: SessionErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl SessionError {
    /// Create a new SessionError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SessionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Session Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl std::error::Error for SessionError {}

impl From<PlatformError> for SessionError {
    #[track_caller]
    fn from(err: PlatformError) -> Self {
        SessionError::new(SessionErrorKind::Platform(err.kind.to_string()))
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
